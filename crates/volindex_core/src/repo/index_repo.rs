//! Index repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide typed persistence APIs for volumes, topics, items, item-pages.
//! - Own the entry-listing query that feeds the printable index.
//!
//! # Invariants
//! - `list_entries_for_volume` sorts by (topic name, page as integer, item
//!   name); page is TEXT in storage, so the sort applies an explicit numeric
//!   cast.
//! - `get_or_create_item` resolves duplicate (name, topic) rows to the lowest
//!   id and reports how many rows matched instead of failing.
//! - Construction verifies connection readiness before any query runs.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::volume::Volume;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error for index repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Transport or storage failure.
    Db(DbError),
    /// Connection has not been migrated to the supported schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// A table required by this repository is absent.
    MissingRequiredTable(&'static str),
    /// A column required by this repository is absent.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Stored data cannot be interpreted as domain data.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not ready: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::InvalidData(details) => write!(f, "invalid stored data: {details}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read model for one printable-index entry.
///
/// `page` stays TEXT exactly as stored; ordering is the repository's job,
/// rendering never re-sorts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Topic name the entry is filed under.
    pub topic: String,
    /// Item name.
    pub item: String,
    /// Page number as stored (TEXT).
    pub page: String,
}

/// Result of a get-or-create on topics or item-pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Row id, existing or newly assigned.
    pub id: i64,
    /// Whether this call created the row.
    pub created: bool,
}

/// Result of a get-or-create on items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemMatch {
    /// Resolved item id (lowest id when several rows matched).
    pub id: i64,
    /// Whether this call created the row.
    pub created: bool,
    /// How many pre-existing rows matched (0 when created; >1 signals the
    /// duplicate-item anomaly).
    pub matched: usize,
}

/// Typed data-access contract for the periodical index.
pub trait IndexRepository {
    /// Looks up one volume by id.
    fn find_volume(&self, volume_id: i64) -> RepoResult<Option<Volume>>;
    /// Looks up the volume whose date range contains `date` (lowest id wins
    /// if ranges ever overlap).
    fn find_volume_covering(&self, date: NaiveDate) -> RepoResult<Option<Volume>>;
    /// Registers a volume record.
    fn insert_volume(&mut self, volume: &Volume) -> RepoResult<()>;
    /// Lists all volumes ordered by id.
    fn list_volumes(&self) -> RepoResult<Vec<Volume>>;
    /// Gets or creates a topic by exact name.
    fn get_or_create_topic(&mut self, name: &str) -> RepoResult<UpsertOutcome>;
    /// Gets or creates an item by exact (name, topic); reports match count.
    fn get_or_create_item(&mut self, name: &str, topic_id: i64) -> RepoResult<ItemMatch>;
    /// Gets or creates one item-page occurrence.
    fn get_or_create_item_page(
        &mut self,
        item_id: i64,
        page: &str,
        date: NaiveDate,
        volume_id: i64,
    ) -> RepoResult<UpsertOutcome>;
    /// Lists a volume's entries pre-sorted for rendering.
    fn list_entries_for_volume(&self, volume_id: i64) -> RepoResult<Vec<IndexEntry>>;
}

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("volumes", &["id", "date_begin", "date_end", "pages"]),
    ("topics", &["id", "name"]),
    ("items", &["id", "name", "topic_id"]),
    ("item_pages", &["id", "item_id", "page", "date", "volume_id"]),
];

const VOLUME_SELECT_SQL: &str = "SELECT id, date_begin, date_end, pages FROM volumes";

/// SQLite-backed index repository.
///
/// Works over any `Connection`, including one borrowed from an open
/// transaction, so callers own the commit/rollback boundary.
pub struct SqliteIndexRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIndexRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl IndexRepository for SqliteIndexRepository<'_> {
    fn find_volume(&self, volume_id: i64) -> RepoResult<Option<Volume>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VOLUME_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([volume_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_volume_row(row)?));
        }
        Ok(None)
    }

    fn find_volume_covering(&self, date: NaiveDate) -> RepoResult<Option<Volume>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VOLUME_SELECT_SQL}
             WHERE date_begin <= ?1 AND date_end >= ?1
             ORDER BY id ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([date])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_volume_row(row)?));
        }
        Ok(None)
    }

    fn insert_volume(&mut self, volume: &Volume) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO volumes (id, date_begin, date_end, pages)
             VALUES (?1, ?2, ?3, ?4);",
            params![volume.id, volume.date_begin, volume.date_end, volume.pages],
        )?;
        Ok(())
    }

    fn list_volumes(&self) -> RepoResult<Vec<Volume>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VOLUME_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut volumes = Vec::new();
        while let Some(row) = rows.next()? {
            volumes.push(parse_volume_row(row)?);
        }
        Ok(volumes)
    }

    fn get_or_create_topic(&mut self, name: &str) -> RepoResult<UpsertOutcome> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM topics WHERE name = ?1;")?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(UpsertOutcome {
                id: row.get(0)?,
                created: false,
            });
        }

        self.conn
            .execute("INSERT INTO topics (name) VALUES (?1);", [name])?;
        Ok(UpsertOutcome {
            id: self.conn.last_insert_rowid(),
            created: true,
        })
    }

    fn get_or_create_item(&mut self, name: &str, topic_id: i64) -> RepoResult<ItemMatch> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM items
             WHERE name = ?1 AND topic_id = ?2
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query(params![name, topic_id])?;
        let mut ids: Vec<i64> = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }

        if let Some(&id) = ids.first() {
            return Ok(ItemMatch {
                id,
                created: false,
                matched: ids.len(),
            });
        }

        self.conn.execute(
            "INSERT INTO items (name, topic_id) VALUES (?1, ?2);",
            params![name, topic_id],
        )?;
        Ok(ItemMatch {
            id: self.conn.last_insert_rowid(),
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
        let mut stmt = self.conn.prepare(
            "SELECT id FROM item_pages
             WHERE item_id = ?1 AND page = ?2 AND date = ?3 AND volume_id = ?4
             ORDER BY id ASC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query(params![item_id, page, date, volume_id])?;
        if let Some(row) = rows.next()? {
            return Ok(UpsertOutcome {
                id: row.get(0)?,
                created: false,
            });
        }

        self.conn.execute(
            "INSERT INTO item_pages (item_id, page, date, volume_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![item_id, page, date, volume_id],
        )?;
        Ok(UpsertOutcome {
            id: self.conn.last_insert_rowid(),
            created: true,
        })
    }

    fn list_entries_for_volume(&self, volume_id: i64) -> RepoResult<Vec<IndexEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name AS topic, i.name AS item, p.page AS page
             FROM item_pages p
             INNER JOIN items i ON i.id = p.item_id
             INNER JOIN topics t ON t.id = i.topic_id
             WHERE p.volume_id = ?1
             ORDER BY t.name ASC, CAST(p.page AS INTEGER) ASC, i.name ASC;",
        )?;
        let mut rows = stmt.query([volume_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(IndexEntry {
                topic: row.get("topic")?,
                item: row.get("item")?,
                page: row.get("page")?,
            });
        }
        Ok(entries)
    }
}

fn parse_volume_row(row: &Row<'_>) -> RepoResult<Volume> {
    Ok(Volume {
        id: row.get("id")?,
        date_begin: row.get("date_begin")?,
        date_end: row.get("date_end")?,
        pages: row.get("pages")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
