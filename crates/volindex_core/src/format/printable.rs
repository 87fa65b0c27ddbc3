//! Letter-sectioned index formatter.
//!
//! # Responsibility
//! - Load one volume's entries in rendering order.
//! - Render topic lines grouped under leading-letter section headers.
//!
//! # Invariants
//! - Loading fails when the volume id does not resolve; a loaded value
//!   always refers to a volume that existed at load time.
//! - Rendering trusts the repository's ordering contract and never re-sorts.
//! - A letter header is emitted once per contiguous run of topics sharing
//!   the same upper-cased first character.

use crate::repo::index_repo::{IndexEntry, IndexRepository, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure while preparing a printable index.
#[derive(Debug)]
pub enum FormatError {
    /// The requested volume id is not registered.
    VolumeNotFound(i64),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VolumeNotFound(volume_id) => {
                write!(f, "no volume found for ID ({volume_id})")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::VolumeNotFound(_) => None,
        }
    }
}

impl From<RepoError> for FormatError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// One volume's index entries, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintableIndex {
    entries: Vec<IndexEntry>,
}

impl PrintableIndex {
    /// Loads the entries for `volume_id`, verifying the volume exists.
    ///
    /// # Errors
    /// - `FormatError::VolumeNotFound` when the id does not resolve.
    pub fn load<R: IndexRepository>(repo: &R, volume_id: i64) -> Result<Self, FormatError> {
        if repo.find_volume(volume_id)?.is_none() {
            return Err(FormatError::VolumeNotFound(volume_id));
        }

        let entries = repo.list_entries_for_volume(volume_id)?;
        Ok(Self { entries })
    }

    /// Number of entries that will be rendered.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Renders the full index text.
    ///
    /// Each new-letter section is preceded by `"\n{LETTER}\n\n"`; each topic
    /// renders as one `"{topic}: {item}, {page}; …"` line. Returns an empty
    /// string when the volume has no entries.
    pub fn render(&self) -> String {
        let mut output = String::new();
        let mut current_letter = String::new();

        let mut start = 0;
        while start < self.entries.len() {
            let topic = self.entries[start].topic.as_str();
            let mut end = start + 1;
            while end < self.entries.len() && self.entries[end].topic == topic {
                end += 1;
            }

            let letter = leading_letter(topic);
            if letter != current_letter {
                output.push('\n');
                output.push_str(&letter);
                output.push_str("\n\n");
                current_letter = letter;
            }

            let pairs: Vec<String> = self.entries[start..end]
                .iter()
                .map(|entry| format!("{}, {}", entry.item, entry.page))
                .collect();
            output.push_str(topic);
            output.push_str(": ");
            output.push_str(&pairs.join("; "));
            output.push('\n');

            start = end;
        }

        output
    }
}

fn leading_letter(topic: &str) -> String {
    topic
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{leading_letter, FormatError, PrintableIndex};
    use crate::model::volume::Volume;
    use crate::repo::index_repo::IndexRepository;
    use crate::repo::memory::MemoryIndexRepository;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn seeded_repo() -> MemoryIndexRepository {
        let mut repo = MemoryIndexRepository::new();
        repo.insert_volume(&Volume::new(1, date(2020, 1, 1), date(2020, 12, 31), 48))
            .unwrap();
        repo
    }

    fn add_entry(repo: &mut MemoryIndexRepository, topic: &str, item: &str, page: i64) {
        let topic = repo.get_or_create_topic(topic).unwrap();
        let item = repo.get_or_create_item(item, topic.id).unwrap();
        repo.get_or_create_item_page(item.id, &page.to_string(), date(2020, 1, 1), 1)
            .unwrap();
    }

    #[test]
    fn leading_letter_upper_cases_first_char() {
        assert_eq!(leading_letter("birds"), "B");
        assert_eq!(leading_letter("Ants"), "A");
        assert_eq!(leading_letter(""), "");
    }

    #[test]
    fn render_returns_empty_string_without_entries() {
        let repo = seeded_repo();
        let index = PrintableIndex::load(&repo, 1).unwrap();
        assert_eq!(index.entry_count(), 0);
        assert_eq!(index.render(), "");
    }

    #[test]
    fn render_groups_topics_under_single_letter_header() {
        let mut repo = seeded_repo();
        add_entry(&mut repo, "Bees", "Honey", 7);
        add_entry(&mut repo, "Birds", "Eagle", 3);
        add_entry(&mut repo, "Ants", "Queen", 2);

        let index = PrintableIndex::load(&repo, 1).unwrap();
        assert_eq!(
            index.render(),
            "\nA\n\nAnts: Queen, 2\n\nB\n\nBees: Honey, 7\nBirds: Eagle, 3\n"
        );
    }

    #[test]
    fn load_rejects_unknown_volume() {
        let repo = seeded_repo();
        let err = PrintableIndex::load(&repo, 7).unwrap_err();
        assert!(matches!(err, FormatError::VolumeNotFound(7)));
        assert_eq!(err.to_string(), "no volume found for ID (7)");
    }
}
