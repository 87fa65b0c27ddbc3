//! Clean-row import against an index repository.
//!
//! # Responsibility
//! - Resolve each row's volume by date containment and validate its page.
//! - Upsert topic, item, and item-page, counting what was created.
//!
//! # Invariants
//! - Rows import in input order; the first failing row fails the whole call.
//! - Duplicate (name, topic) items are resolved to the lowest id with a
//!   warning, never an error.
//! - This function never commits; the caller owns transaction scope, so a
//!   returned error can mean a clean rollback.

use super::cleanup::CleanRow;
use super::ImportError;
use crate::repo::index_repo::IndexRepository;
use chrono::NaiveDate;
use log::warn;

/// Creation counters for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub new_topics: usize,
    pub new_items: usize,
    pub new_item_pages: usize,
}

/// Imports cleaned rows through `repo`, in input order.
///
/// # Errors
/// - `ImportError::NoVolumeForDate` when no volume covers a row's date.
/// - `ImportError::PageOutOfRange` when a row's page exceeds the volume's
///   page count.
/// - `ImportError::Repo` on persistence failures.
pub fn import_rows<R: IndexRepository>(
    repo: &mut R,
    rows: &[CleanRow],
) -> Result<ImportCounts, ImportError> {
    let mut counts = ImportCounts::default();

    for row in rows {
        let date =
            NaiveDate::from_ymd_opt(row.year, row.month, 1).ok_or(ImportError::InvalidDate {
                year: row.year,
                month: row.month,
            })?;

        let volume = repo
            .find_volume_covering(date)?
            .ok_or(ImportError::NoVolumeForDate(date))?;

        if row.page > volume.pages {
            return Err(ImportError::PageOutOfRange {
                page: row.page,
                pages: volume.pages,
                volume_id: volume.id,
            });
        }

        let topic = repo.get_or_create_topic(&row.topic)?;
        if topic.created {
            counts.new_topics += 1;
        }

        let item = repo.get_or_create_item(&row.item, topic.id)?;
        if item.created {
            counts.new_items += 1;
        }
        if item.matched > 1 {
            warn!(
                "event=import_row module=import status=warn reason=duplicate_items topic_id={} matches={} using_item_id={}",
                topic.id, item.matched, item.id
            );
        }

        let page = row.page.to_string();
        let item_page = repo.get_or_create_item_page(item.id, &page, date, volume.id)?;
        if item_page.created {
            counts.new_item_pages += 1;
        }
    }

    Ok(counts)
}
