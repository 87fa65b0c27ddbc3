//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own transaction boundaries so lower layers stay commit-agnostic.
//!
//! # See also
//! - docs/architecture/import-pipeline.md

pub mod import_service;
pub mod volume_service;
