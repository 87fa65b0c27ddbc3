//! In-memory index repository.
//!
//! # Responsibility
//! - Honor the full `IndexRepository` contract without SQLite, so import and
//!   formatting logic can be tested against a plain data structure.
//!
//! # Invariants
//! - Ids are assigned from one increasing sequence; store order is insertion
//!   order, so "first match" means lowest id, same as the SQLite queries.
//! - `list_entries_for_volume` applies the same (topic, numeric page, item)
//!   ordering contract as the SQL implementation.

use crate::model::volume::Volume;
use crate::repo::index_repo::{
    IndexEntry, IndexRepository, ItemMatch, RepoError, RepoResult, UpsertOutcome,
};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TopicRow {
    id: i64,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemRow {
    id: i64,
    name: String,
    topic_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemPageRow {
    id: i64,
    item_id: i64,
    page: String,
    date: NaiveDate,
    volume_id: i64,
}

/// Vec-backed repository for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryIndexRepository {
    volumes: Vec<Volume>,
    topics: Vec<TopicRow>,
    items: Vec<ItemRow>,
    item_pages: Vec<ItemPageRow>,
    next_id: i64,
}

impl MemoryIndexRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl IndexRepository for MemoryIndexRepository {
    fn find_volume(&self, volume_id: i64) -> RepoResult<Option<Volume>> {
        Ok(self
            .volumes
            .iter()
            .find(|volume| volume.id == volume_id)
            .cloned())
    }

    fn find_volume_covering(&self, date: NaiveDate) -> RepoResult<Option<Volume>> {
        Ok(self
            .volumes
            .iter()
            .filter(|volume| volume.covers(date))
            .min_by_key(|volume| volume.id)
            .cloned())
    }

    fn insert_volume(&mut self, volume: &Volume) -> RepoResult<()> {
        if self.volumes.iter().any(|existing| existing.id == volume.id) {
            return Err(RepoError::InvalidData(format!(
                "volume id {} already exists",
                volume.id
            )));
        }
        self.volumes.push(volume.clone());
        Ok(())
    }

    fn list_volumes(&self) -> RepoResult<Vec<Volume>> {
        let mut volumes = self.volumes.clone();
        volumes.sort_by_key(|volume| volume.id);
        Ok(volumes)
    }

    fn get_or_create_topic(&mut self, name: &str) -> RepoResult<UpsertOutcome> {
        if let Some(topic) = self.topics.iter().find(|topic| topic.name == name) {
            return Ok(UpsertOutcome {
                id: topic.id,
                created: false,
            });
        }

        let id = self.allocate_id();
        self.topics.push(TopicRow {
            id,
            name: name.to_string(),
        });
        Ok(UpsertOutcome { id, created: true })
    }

    fn get_or_create_item(&mut self, name: &str, topic_id: i64) -> RepoResult<ItemMatch> {
        let matches: Vec<i64> = self
            .items
            .iter()
            .filter(|item| item.name == name && item.topic_id == topic_id)
            .map(|item| item.id)
            .collect();

        if let Some(&id) = matches.first() {
            return Ok(ItemMatch {
                id,
                created: false,
                matched: matches.len(),
            });
        }

        let id = self.allocate_id();
        self.items.push(ItemRow {
            id,
            name: name.to_string(),
            topic_id,
        });
        Ok(ItemMatch {
            id,
            created: true,
            matched: 0,
        })
    }

    fn get_or_create_item_page(
        &mut self,
        item_id: i64,
        page: &str,
        date: NaiveDate,
        volume_id: i64,
    ) -> RepoResult<UpsertOutcome> {
        if let Some(existing) = self.item_pages.iter().find(|row| {
            row.item_id == item_id && row.page == page && row.date == date && row.volume_id == volume_id
        }) {
            return Ok(UpsertOutcome {
                id: existing.id,
                created: false,
            });
        }

        let id = self.allocate_id();
        self.item_pages.push(ItemPageRow {
            id,
            item_id,
            page: page.to_string(),
            date,
            volume_id,
        });
        Ok(UpsertOutcome { id, created: true })
    }

    fn list_entries_for_volume(&self, volume_id: i64) -> RepoResult<Vec<IndexEntry>> {
        let mut entries = Vec::new();
        for page_row in self
            .item_pages
            .iter()
            .filter(|row| row.volume_id == volume_id)
        {
            let item = self
                .items
                .iter()
                .find(|item| item.id == page_row.item_id)
                .ok_or_else(|| {
                    RepoError::InvalidData(format!("dangling item id {}", page_row.item_id))
                })?;
            let topic = self
                .topics
                .iter()
                .find(|topic| topic.id == item.topic_id)
                .ok_or_else(|| {
                    RepoError::InvalidData(format!("dangling topic id {}", item.topic_id))
                })?;
            entries.push(IndexEntry {
                topic: topic.name.clone(),
                item: item.name.clone(),
                page: page_row.page.clone(),
            });
        }

        entries.sort_by(|a, b| {
            a.topic
                .cmp(&b.topic)
                .then_with(|| page_sort_key(&a.page).cmp(&page_sort_key(&b.page)))
                .then_with(|| a.item.cmp(&b.item))
        });
        Ok(entries)
    }
}

/// Numeric sort key for TEXT pages; matches SQLite `CAST(page AS INTEGER)`
/// prefix parsing (non-numeric text sorts as 0).
fn page_sort_key(page: &str) -> i64 {
    let trimmed = page.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|v| sign * v).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::page_sort_key;

    #[test]
    fn page_sort_key_parses_numeric_prefix() {
        assert_eq!(page_sort_key("10"), 10);
        assert_eq!(page_sort_key(" 12a"), 12);
        assert_eq!(page_sort_key("-3"), -3);
        assert_eq!(page_sort_key("iv"), 0);
    }
}
