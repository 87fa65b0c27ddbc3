//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the typed data-access contract shared by import and formatting.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Entry listings honor the formatter's ordering contract (topic name,
//!   numeric page, item name) in every implementation.
//! - Get-or-create calls report whether they created, so callers can count
//!   without re-querying.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod index_repo;
pub mod memory;
