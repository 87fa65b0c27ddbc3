//! Multi-encoding CSV reading.
//!
//! # Responsibility
//! - Read the file once and try each candidate encoding in order.
//! - Parse the first cleanly-decoded text as a headered CSV table.
//!
//! # Invariants
//! - The retry ladder applies to character-decoding failures only; CSV
//!   structural errors propagate immediately, whatever the encoding.
//! - The encoding that produced the parse is reported to the caller.

use super::ImportError;
use encoding_rs::{Encoding, UTF_8_INIT, WINDOWS_1252_INIT};
use log::{debug, info};
use std::path::Path;

/// Decode order used by the CLI: strict UTF-8, then Windows-1252.
pub static DEFAULT_ENCODINGS: &[&Encoding] = &[&UTF_8_INIT, &WINDOWS_1252_INIT];

/// Header row plus data rows, all cells as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A parsed table plus the encoding that decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCsv {
    pub table: RawTable,
    /// Canonical encoding name, e.g. `UTF-8` or `windows-1252`.
    pub encoding: &'static str,
}

/// Reads `path` and parses it as CSV using the first encoding in `encodings`
/// that decodes the bytes without error.
///
/// # Errors
/// - `ImportError::Io` when the file cannot be read.
/// - `ImportError::Decode` when every candidate encoding reports errors.
/// - `ImportError::Csv` when the decoded text is not valid CSV.
pub fn read_csv_multi_encoding(
    path: impl AsRef<Path>,
    encodings: &[&'static Encoding],
) -> Result<DecodedCsv, ImportError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tried = Vec::with_capacity(encodings.len());
    for &encoding in encodings {
        let (text, had_errors) = encoding.decode_with_bom_removal(&bytes);
        if had_errors {
            debug!(
                "event=csv_decode module=import status=retry encoding={}",
                encoding.name()
            );
            tried.push(encoding.name());
            continue;
        }

        let table = parse_csv(text.as_ref())?;
        info!(
            "event=csv_decode module=import status=ok encoding={} rows={}",
            encoding.name(),
            table.rows.len()
        );
        return Ok(DecodedCsv {
            table,
            encoding: encoding.name(),
        });
    }

    Err(ImportError::Decode { tried })
}

fn parse_csv(text: &str) -> Result<RawTable, ImportError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}
