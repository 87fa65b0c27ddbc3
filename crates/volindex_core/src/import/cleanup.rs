//! Raw-table cleanup and normalization.
//!
//! # Responsibility
//! - Normalize header names and map the legacy `phrase` column to `topic`.
//! - Drop empty rows and columns with holes, then verify required columns.
//! - Convert month names to numbers and coerce numeric cells.
//!
//! # Invariants
//! - Cleanup order is fixed: row drop, column drop, header normalization,
//!   required-column check, value conversion.
//! - A column is dropped when any surviving row leaves its cell empty; a
//!   required column dropped this way surfaces as `MissingColumns`.
//! - Month lookup accepts English names and three-letter abbreviations only;
//!   numeric month strings are rejected.

use super::csv_source::RawTable;
use super::ImportError;
use once_cell::sync::Lazy;
use std::collections::HashMap;

const REQUIRED_COLUMNS: [&str; 5] = ["topic", "item", "page", "year", "month"];

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static MONTH_LOOKUP: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(MONTH_NAMES.len() + MONTH_ABBREVIATIONS.len());
    for (index, name) in MONTH_NAMES.iter().enumerate() {
        table.insert(*name, index as u32 + 1);
    }
    for (index, abbreviation) in MONTH_ABBREVIATIONS.iter().enumerate() {
        table.insert(*abbreviation, index as u32 + 1);
    }
    table
});

/// One validated import row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRow {
    /// Trimmed topic name.
    pub topic: String,
    /// Trimmed item name.
    pub item: String,
    /// Page number; re-serialized to TEXT at the storage boundary.
    pub page: i64,
    /// Calendar year.
    pub year: i32,
    /// Month 1-12.
    pub month: u32,
}

/// Maps an English month name or three-letter abbreviation to 1-12,
/// case-insensitively. Returns `None` for anything else, including numeric
/// strings.
pub fn month_number(value: &str) -> Option<u32> {
    MONTH_LOOKUP.get(value.trim().to_lowercase().as_str()).copied()
}

/// Cleans a raw table into validated rows.
///
/// Row numbers in errors are 1-based positions among the data rows of the
/// original file.
///
/// # Errors
/// - `ImportError::MissingColumns` when required columns are absent after
///   cleanup.
/// - `ImportError::UnknownMonth` / `ImportError::InvalidNumber` for cell
///   values that fail conversion.
pub fn clean_table(table: &RawTable) -> Result<Vec<CleanRow>, ImportError> {
    let kept_rows: Vec<(usize, &Vec<String>)> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|cell| !cell.is_empty()))
        .map(|(index, cells)| (index + 1, cells))
        .collect();

    let mut keep_column = vec![true; table.headers.len()];
    for (_, cells) in &kept_rows {
        for (index, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                keep_column[index] = false;
            }
        }
    }

    // First occurrence wins when two headers normalize to the same name.
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (index, name) in table.headers.iter().enumerate() {
        if keep_column[index] {
            columns.entry(normalize_header(name)).or_insert(index);
        }
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns { missing });
    }

    let mut cleaned = Vec::with_capacity(kept_rows.len());
    for (row_number, cells) in kept_rows {
        let month_cell = cells[columns["month"]].as_str();
        let month = month_number(month_cell).ok_or_else(|| ImportError::UnknownMonth {
            value: month_cell.trim().to_string(),
            row: row_number,
        })?;

        let page = parse_cell_int(cells[columns["page"]].as_str()).ok_or_else(|| {
            ImportError::InvalidNumber {
                column: "page",
                value: cells[columns["page"]].trim().to_string(),
                row: row_number,
            }
        })?;

        let year_cell = cells[columns["year"]].as_str();
        let year = parse_cell_int(year_cell)
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| ImportError::InvalidNumber {
                column: "year",
                value: year_cell.trim().to_string(),
                row: row_number,
            })?;

        cleaned.push(CleanRow {
            topic: cells[columns["topic"]].trim().to_string(),
            item: cells[columns["item"]].trim().to_string(),
            page,
            year,
            month,
        });
    }

    Ok(cleaned)
}

fn normalize_header(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    if lowered == "phrase" {
        "topic".to_string()
    } else {
        lowered
    }
}

fn parse_cell_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    // Spreadsheet exports serialize integer cells as "3.0".
    let parsed: f64 = trimmed.parse().ok()?;
    if parsed.is_finite() && parsed.fract() == 0.0 && parsed.abs() <= i64::MAX as f64 {
        Some(parsed as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_table, month_number, normalize_header, parse_cell_int};
    use crate::import::csv_source::RawTable;
    use crate::import::ImportError;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn month_number_maps_names_and_abbreviations_case_insensitively() {
        assert_eq!(month_number("March"), Some(3));
        assert_eq!(month_number("MARCH"), Some(3));
        assert_eq!(month_number("mar"), Some(3));
        assert_eq!(month_number(" December "), Some(12));
    }

    #[test]
    fn month_number_rejects_numeric_and_unknown_values() {
        assert_eq!(month_number("1"), None);
        assert_eq!(month_number("Smarch"), None);
        assert_eq!(month_number(""), None);
    }

    #[test]
    fn normalize_header_folds_case_and_renames_phrase() {
        assert_eq!(normalize_header(" Phrase "), "topic");
        assert_eq!(normalize_header("YEAR "), "year");
        assert_eq!(normalize_header("phrases"), "phrases");
    }

    #[test]
    fn parse_cell_int_accepts_integers_and_integral_floats() {
        assert_eq!(parse_cell_int("3"), Some(3));
        assert_eq!(parse_cell_int(" 3 "), Some(3));
        assert_eq!(parse_cell_int("3.0"), Some(3));
        assert_eq!(parse_cell_int("3.5"), None);
        assert_eq!(parse_cell_int("three"), None);
    }

    #[test]
    fn clean_table_converts_values_and_trims_names() {
        let raw = table(
            &["Phrase", "Item", "Page", "Year", "Month"],
            &[&[" Birds ", " Eagle", "3", "2020", "Jan"]],
        );
        let rows = clean_table(&raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].topic, "Birds");
        assert_eq!(rows[0].item, "Eagle");
        assert_eq!(rows[0].page, 3);
        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[0].month, 1);
    }

    #[test]
    fn clean_table_drops_fully_empty_rows() {
        let raw = table(
            &["topic", "item", "page", "year", "month"],
            &[
                &["", "", "", "", ""],
                &["Birds", "Eagle", "3", "2020", "Jan"],
            ],
        );
        let rows = clean_table(&raw).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn column_with_an_empty_cell_is_dropped_and_reported_missing() {
        let raw = table(
            &["topic", "item", "page", "year", "month"],
            &[
                &["Birds", "Eagle", "3", "2020", ""],
                &["Birds", "Finch", "10", "2020", "Feb"],
            ],
        );
        let err = clean_table(&raw).unwrap_err();
        match err {
            ImportError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["month".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_month_reports_value_and_row() {
        let raw = table(
            &["topic", "item", "page", "year", "month"],
            &[
                &["Birds", "Eagle", "3", "2020", "Jan"],
                &["Birds", "Finch", "10", "2020", "13"],
            ],
        );
        let err = clean_table(&raw).unwrap_err();
        match err {
            ImportError::UnknownMonth { value, row } => {
                assert_eq!(value, "13");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
