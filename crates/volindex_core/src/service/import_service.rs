//! CSV import use-case service.
//!
//! # Responsibility
//! - Run the full read/clean/import pipeline for one CSV file.
//! - Own the all-or-nothing transaction around row import.
//!
//! # Invariants
//! - Row import runs inside a single immediate transaction; any failure
//!   rolls back, so a failed import leaves the store untouched.
//! - The returned report is the authoritative outcome; logs are diagnostic.
//!
//! # See also
//! - docs/architecture/import-pipeline.md

use crate::import::{
    clean_table, import_rows, read_csv_multi_encoding, ImportError, DEFAULT_ENCODINGS,
};
use crate::repo::index_repo::{RepoError, SqliteIndexRepository};
use log::{debug, error, info};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::path::Path;

/// Outcome of one successful import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Clean rows processed.
    pub rows: usize,
    /// Topics created by this run.
    pub new_topics: usize,
    /// Items created by this run.
    pub new_items: usize,
    /// Item-pages created by this run.
    pub new_item_pages: usize,
    /// Canonical name of the encoding that decoded the file.
    pub encoding: &'static str,
}

/// Import facade over one open database connection.
pub struct ImportService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ImportService<'conn> {
    /// Creates a service using the provided migrated connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Imports one CSV file and reports what was created.
    ///
    /// # Side effects
    /// - Commits created rows on success; rolls back everything on failure.
    /// - Emits `import_csv` logging events with status and counts.
    pub fn import_csv(&mut self, path: impl AsRef<Path>) -> Result<ImportReport, ImportError> {
        info!("event=import_csv module=service status=start");

        let outcome = self.run_pipeline(path.as_ref());
        match &outcome {
            Ok(report) => info!(
                "event=import_csv module=service status=ok rows={} new_topics={} new_items={} new_item_pages={} encoding={}",
                report.rows,
                report.new_topics,
                report.new_items,
                report.new_item_pages,
                report.encoding
            ),
            Err(err) => error!(
                "event=import_csv module=service status=error error_code={}",
                err.code()
            ),
        }
        outcome
    }

    fn run_pipeline(&mut self, path: &Path) -> Result<ImportReport, ImportError> {
        let decoded = read_csv_multi_encoding(path, DEFAULT_ENCODINGS)?;
        let initial_rows = decoded.table.rows.len();
        let rows = clean_table(&decoded.table)?;
        debug!(
            "event=import_clean module=service status=ok rows_initial={initial_rows} rows_clean={}",
            rows.len()
        );

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let counts = {
            let mut repo = SqliteIndexRepository::try_new(&tx)?;
            import_rows(&mut repo, &rows)?
        };
        tx.commit().map_err(RepoError::from)?;

        Ok(ImportReport {
            rows: rows.len(),
            new_topics: counts.new_topics,
            new_items: counts.new_items,
            new_item_pages: counts.new_item_pages,
            encoding: decoded.encoding,
        })
    }
}
