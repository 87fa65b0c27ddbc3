//! Core domain logic for volindex.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod format;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use format::printable::{FormatError, PrintableIndex};
pub use import::{
    clean_table, import_rows, month_number, read_csv_multi_encoding, CleanRow, DecodedCsv,
    ImportCounts, ImportError, RawTable, DEFAULT_ENCODINGS,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::volume::{Volume, VolumeValidationError};
pub use repo::index_repo::{
    IndexEntry, IndexRepository, ItemMatch, RepoError, RepoResult, SqliteIndexRepository,
    UpsertOutcome,
};
pub use repo::memory::MemoryIndexRepository;
pub use service::import_service::{ImportReport, ImportService};
pub use service::volume_service::{VolumeAdminError, VolumeService};
