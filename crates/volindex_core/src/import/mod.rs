//! CSV index import pipeline.
//!
//! # Responsibility
//! - Decode and parse index CSV files with an encoding-fallback ladder.
//! - Normalize and validate raw tables into clean import rows.
//! - Upsert clean rows into topics/items/item-pages against one volume each.
//!
//! # Invariants
//! - Every failure is a typed `ImportError`; logging is diagnostic only and
//!   never the sole signal of a failed import.
//! - Rows are processed in input order.
//!
//! # See also
//! - docs/architecture/import-pipeline.md

use crate::repo::index_repo::RepoError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

mod cleanup;
mod csv_source;
mod importer;

pub use cleanup::{clean_table, month_number, CleanRow};
pub use csv_source::{read_csv_multi_encoding, DecodedCsv, RawTable, DEFAULT_ENCODINGS};
pub use importer::{import_rows, ImportCounts};

/// Failure in any stage of the import pipeline.
#[derive(Debug)]
pub enum ImportError {
    /// The CSV file could not be read at all.
    Io { path: PathBuf, source: io::Error },
    /// No candidate encoding decoded the file.
    Decode { tried: Vec<&'static str> },
    /// The decoded text is not structurally valid CSV.
    Csv(csv::Error),
    /// Required columns absent after cleanup (possibly dropped for holding
    /// empty cells).
    MissingColumns { missing: Vec<String> },
    /// A month cell matched neither a month name nor an abbreviation.
    UnknownMonth { value: String, row: usize },
    /// A numeric cell could not be read as an integer.
    InvalidNumber {
        column: &'static str,
        value: String,
        row: usize,
    },
    /// Year/month do not form a real calendar date.
    InvalidDate { year: i32, month: u32 },
    /// No registered volume's date range contains the row's date.
    NoVolumeForDate(NaiveDate),
    /// The row's page number exceeds the resolved volume's page count.
    PageOutOfRange {
        page: i64,
        pages: i64,
        volume_id: i64,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ImportError {
    /// Stable identifier for log lines. Unlike `Display`, the code never
    /// carries cell values or file contents.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Decode { .. } => "decode",
            Self::Csv(_) => "csv",
            Self::MissingColumns { .. } => "missing_columns",
            Self::UnknownMonth { .. } => "unknown_month",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::InvalidDate { .. } => "invalid_date",
            Self::NoVolumeForDate(_) => "no_volume_for_date",
            Self::PageOutOfRange { .. } => "page_out_of_range",
            Self::Repo(_) => "repo",
        }
    }
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Decode { tried } => {
                write!(
                    f,
                    "could not decode file with any of: {}",
                    tried.join(", ")
                )
            }
            Self::Csv(err) => write!(f, "{err}"),
            Self::MissingColumns { missing } => {
                write!(
                    f,
                    "some required columns are missing or empty: {}",
                    missing.join(", ")
                )
            }
            Self::UnknownMonth { value, row } => {
                write!(f, "unrecognized month `{value}` in row {row}")
            }
            Self::InvalidNumber { column, value, row } => {
                write!(f, "invalid {column} value `{value}` in row {row}")
            }
            Self::InvalidDate { year, month } => {
                write!(f, "no valid calendar date for year {year}, month {month}")
            }
            Self::NoVolumeForDate(date) => {
                write!(f, "no volume found for {}", date.format("%Y-%b"))
            }
            Self::PageOutOfRange { page, pages, .. } => {
                write!(
                    f,
                    "page ({page}) is greater than the number of pages in the volume ({pages})"
                )
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
