//! Printable-index rendering.
//!
//! # Responsibility
//! - Turn a volume's stored entries into the letter-sectioned print layout.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod printable;
