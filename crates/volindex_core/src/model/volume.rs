//! Volume domain model.
//!
//! # Responsibility
//! - Define the printed-volume record the index hangs off.
//! - Provide date-range containment and validation helpers.
//!
//! # Invariants
//! - `date_begin <= date_end` for any volume accepted into the store.
//! - `pages >= 1`; the page-count bound is what import validates rows against.
//!
//! # See also
//! - docs/architecture/data-model.md

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One printed volume/issue of the periodical.
///
/// Volumes are registered up front through the volume administration
/// surface; import and formatting only ever look them up. The id is chosen
/// by the operator and conventionally matches the year of `date_begin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Operator-chosen stable identifier.
    pub id: i64,
    /// First day covered by this volume.
    pub date_begin: NaiveDate,
    /// Last day covered by this volume (inclusive).
    pub date_end: NaiveDate,
    /// Total printed page count; upper bound for imported page numbers.
    pub pages: i64,
}

/// Validation failure for volume records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeValidationError {
    /// `date_begin` is after `date_end`.
    InvertedDateRange,
    /// `pages` is zero or negative.
    NonPositivePageCount,
}

impl Display for VolumeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvertedDateRange => write!(f, "volume date range begins after it ends"),
            Self::NonPositivePageCount => write!(f, "volume page count must be at least 1"),
        }
    }
}

impl Error for VolumeValidationError {}

impl Volume {
    /// Creates a volume record without validating it.
    pub fn new(id: i64, date_begin: NaiveDate, date_end: NaiveDate, pages: i64) -> Self {
        Self {
            id,
            date_begin,
            date_end,
            pages,
        }
    }

    /// Checks the record invariants.
    ///
    /// # Invariants
    /// - The date range must not be inverted.
    /// - The page count must be positive.
    pub fn validate(&self) -> Result<(), VolumeValidationError> {
        if self.date_begin > self.date_end {
            return Err(VolumeValidationError::InvertedDateRange);
        }
        if self.pages < 1 {
            return Err(VolumeValidationError::NonPositivePageCount);
        }
        Ok(())
    }

    /// Returns whether `date` falls inside this volume's range (inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_begin <= date && date <= self.date_end
    }

    /// Returns whether this volume's range intersects another's.
    pub fn overlaps(&self, other: &Volume) -> bool {
        self.date_begin <= other.date_end && other.date_begin <= self.date_end
    }
}
