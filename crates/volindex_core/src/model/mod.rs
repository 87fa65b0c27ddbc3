//! Domain model for the periodical index.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules for records the store treats as opaque.
//!
//! # Invariants
//! - Volumes are identified by a caller-chosen integer id.
//! - Topics, items, and item-pages receive store-assigned ids on creation.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod volume;
