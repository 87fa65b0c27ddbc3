use chrono::NaiveDate;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use volindex_core::db::open_db_in_memory;
use volindex_core::{ImportError, ImportService, IndexRepository, SqliteIndexRepository, Volume};

#[test]
fn import_creates_topics_items_and_pages() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,Jan\n\
         Birds,Finch,10,2020,Feb\n",
    );

    let report = ImportService::new(&mut conn).import_csv(&file).unwrap();

    assert_eq!(report.rows, 2);
    assert_eq!(report.new_topics, 1);
    assert_eq!(report.new_items, 2);
    assert_eq!(report.new_item_pages, 2);
    assert_eq!(report.encoding, "UTF-8");
    assert_eq!(count_rows(&conn, "topics"), 1);
    assert_eq!(count_rows(&conn, "items"), 2);
    assert_eq!(count_rows(&conn, "item_pages"), 2);
}

#[test]
fn reimporting_the_same_file_creates_nothing_new() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,Jan\n",
    );

    ImportService::new(&mut conn).import_csv(&file).unwrap();
    let report = ImportService::new(&mut conn).import_csv(&file).unwrap();

    assert_eq!(report.rows, 1);
    assert_eq!(report.new_topics, 0);
    assert_eq!(report.new_items, 0);
    assert_eq!(report.new_item_pages, 0);
    assert_eq!(count_rows(&conn, "item_pages"), 1);
}

#[test]
fn page_overflow_aborts_import_with_no_partial_rows() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    // First row is importable; the failure on the second must also undo it.
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,Jan\n\
         Birds,Finch,80,2020,Feb\n",
    );

    let err = ImportService::new(&mut conn).import_csv(&file).unwrap_err();

    assert!(matches!(
        err,
        ImportError::PageOutOfRange {
            page: 80,
            pages: 48,
            volume_id: 1,
        }
    ));
    assert_eq!(count_rows(&conn, "topics"), 0);
    assert_eq!(count_rows(&conn, "items"), 0);
    assert_eq!(count_rows(&conn, "item_pages"), 0);
}

#[test]
fn row_with_no_covering_volume_fails_import() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2021,Jan\n",
    );

    let err = ImportService::new(&mut conn).import_csv(&file).unwrap_err();

    match err {
        ImportError::NoVolumeForDate(missing) => assert_eq!(missing, date(2021, 1, 1)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count_rows(&conn, "item_pages"), 0);
}

#[test]
fn legacy_phrase_header_is_accepted_as_topic() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Phrase,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,Jan\n",
    );

    let report = ImportService::new(&mut conn).import_csv(&file).unwrap();

    assert_eq!(report.new_topics, 1);
    let topic: String = conn
        .query_row("SELECT name FROM topics;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(topic, "Birds");
}

#[test]
fn column_with_empty_cell_is_dropped_and_reported_missing() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,\n\
         Birds,Finch,10,2020,Feb\n",
    );

    let err = ImportService::new(&mut conn).import_csv(&file).unwrap_err();

    match err {
        ImportError::MissingColumns { missing } => {
            assert_eq!(missing, vec!["month".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fully_empty_rows_are_ignored() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         ,,,,\n\
         Birds,Eagle,3,2020,Jan\n",
    );

    let report = ImportService::new(&mut conn).import_csv(&file).unwrap();

    assert_eq!(report.rows, 1);
    assert_eq!(count_rows(&conn, "item_pages"), 1);
}

#[test]
fn month_names_are_matched_case_insensitively() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,MARCH\n\
         Birds,Finch,10,2020,mar\n",
    );

    ImportService::new(&mut conn).import_csv(&file).unwrap();

    let stored: String = conn
        .query_row("SELECT DISTINCT date FROM item_pages;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, "2020-03-01");
}

#[test]
fn numeric_month_values_are_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,3\n",
    );

    let err = ImportService::new(&mut conn).import_csv(&file).unwrap_err();

    match err {
        ImportError::UnknownMonth { value, row } => {
            assert_eq!(value, "3");
            assert_eq!(row, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn latin1_file_decodes_via_fallback_encoding() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let mut bytes = b"Topic,Item,Page,Year,Month\n".to_vec();
    bytes.extend_from_slice(b"Caf\xe9,Espresso,4,2020,Jan\n");
    let file = dir.path().join("latin1.csv");
    fs::write(&file, &bytes).unwrap();

    let report = ImportService::new(&mut conn).import_csv(&file).unwrap();

    assert_eq!(report.encoding, "windows-1252");
    let topic: String = conn
        .query_row("SELECT name FROM topics;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(topic, "Café");
}

#[test]
fn duplicate_items_resolve_to_the_lowest_id() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    conn.execute("INSERT INTO topics (name) VALUES ('Birds');", [])
        .unwrap();
    let topic_id: i64 = conn
        .query_row("SELECT id FROM topics WHERE name = 'Birds';", [], |row| {
            row.get(0)
        })
        .unwrap();
    conn.execute(
        "INSERT INTO items (name, topic_id) VALUES ('Eagle', ?1), ('Eagle', ?1);",
        [topic_id],
    )
    .unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3,2020,Jan\n",
    );

    let report = ImportService::new(&mut conn).import_csv(&file).unwrap();

    assert_eq!(report.new_topics, 0);
    assert_eq!(report.new_items, 0);
    assert_eq!(report.new_item_pages, 1);
    assert_eq!(count_rows(&conn, "items"), 2);
    let used_item_id: i64 = conn
        .query_row("SELECT item_id FROM item_pages;", [], |row| row.get(0))
        .unwrap();
    let lowest_item_id: i64 = conn
        .query_row("SELECT MIN(id) FROM items WHERE name = 'Eagle';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(used_item_id, lowest_item_id);
}

#[test]
fn spreadsheet_float_cells_import_as_integers() {
    let mut conn = open_db_in_memory().unwrap();
    seed_volume(&conn, 1, date(2020, 1, 1), date(2020, 12, 31), 48);
    let dir = TempDir::new().unwrap();
    let file = write_csv(
        &dir,
        "index.csv",
        "Topic,Item,Page,Year,Month\n\
         Birds,Eagle,3.0,2020.0,Jan\n",
    );

    ImportService::new(&mut conn).import_csv(&file).unwrap();

    let page: String = conn
        .query_row("SELECT page FROM item_pages;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(page, "3");
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn seed_volume(conn: &Connection, id: i64, date_begin: NaiveDate, date_end: NaiveDate, pages: i64) {
    let mut repo = SqliteIndexRepository::try_new(conn).unwrap();
    repo.insert_volume(&Volume::new(id, date_begin, date_end, pages))
        .unwrap();
}

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
