use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::config::AppConfig;
use crate::domain::codec::DisplayValue;
use crate::domain::entities::edit::Statement;
use crate::domain::entities::table::{
    ColumnMeta, KeyClass, RawValue, SnapshotRow, TableEntry, TableKind,
};
use crate::domain::error::EditError;
use crate::domain::unique_key::resolve_unique_key;
use crate::infra::sqlite::queries::{describe_table, unquote_default};
use crate::infra::sqlite::repo::SqliteRepo;
use crate::ui::state::app_state::Workspace;
use crate::ui::state::query_tabs::QueryTabs;
use crate::usecase::ports::repo::{
    ExecutionFailure, QueryOutcome, RepoError, ResultGrid, StatementExecutor, TableSource,
};
use crate::usecase::services::edit_service::EditService;
use crate::usecase::services::query_service::QueryService;

const TWO_ROW_TABLE: &str = "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
     INSERT INTO t VALUES (1, 'a'), (2, 'b');";

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("table-editor-{prefix}-{nanos}"))
}

fn seed_db(prefix: &str, sql: &str) -> (PathBuf, PathBuf) {
    let temp_dir = unique_test_dir(prefix);
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("app.sqlite");
    let conn = Connection::open(&db_path).expect("should open sqlite db");
    conn.execute_batch(sql).expect("seed sql should run");
    (temp_dir, db_path)
}

fn edit_service(db_path: &Path, config: &AppConfig) -> EditService {
    let repo = Rc::new(SqliteRepo::open(db_path).expect("should open repo"));
    EditService::new(repo.clone(), repo, config)
}

fn query_service(db_path: &Path) -> QueryService {
    let repo = Rc::new(SqliteRepo::open(db_path).expect("should open repo"));
    QueryService::new(repo.clone(), repo)
}

fn names_by_id(db_path: &Path) -> Vec<(i64, String)> {
    let conn = Connection::open(db_path).expect("should open sqlite db");
    let mut stmt = conn
        .prepare("SELECT id, name FROM t ORDER BY id")
        .expect("select should prepare");
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("select should run")
        .collect::<rusqlite::Result<Vec<_>>>()
        .expect("rows should collect")
}

fn text(value: &str) -> DisplayValue {
    DisplayValue::Text(value.to_string())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date should be valid")
}

struct FakeSource {
    columns: Vec<ColumnMeta>,
    rows: Vec<SnapshotRow>,
}

impl TableSource for FakeSource {
    fn list_databases(&self) -> Result<Vec<String>, RepoError> {
        Ok(vec!["shop".to_string()])
    }

    fn list_tables(&self, _database: &str) -> Result<Vec<TableEntry>, RepoError> {
        Ok(vec![TableEntry {
            name: "items".to_string(),
            kind: TableKind::Table,
        }])
    }

    fn describe_table(&self, _database: &str, _table: &str) -> Result<Vec<ColumnMeta>, RepoError> {
        Ok(self.columns.clone())
    }

    fn fetch_rows(&self, _database: &str, _table: &str) -> Result<Vec<SnapshotRow>, RepoError> {
        Ok(self.rows.clone())
    }
}

/// Records every statement it is handed and fails at `fail_at`.
struct RecordingExecutor {
    fail_at: Option<usize>,
    attempted: RefCell<Vec<Statement>>,
}

impl RecordingExecutor {
    fn new(fail_at: Option<usize>) -> Self {
        Self {
            fail_at,
            attempted: RefCell::new(Vec::new()),
        }
    }
}

impl StatementExecutor for RecordingExecutor {
    fn execute_all(&self, statements: &[Statement]) -> Result<usize, ExecutionFailure> {
        for (index, statement) in statements.iter().enumerate() {
            self.attempted.borrow_mut().push(statement.clone());
            if self.fail_at == Some(index) {
                return Err(ExecutionFailure {
                    index,
                    message: "boom".to_string(),
                });
            }
        }
        Ok(statements.len())
    }

    fn run_query(&self, _sql: &str) -> Result<QueryOutcome, RepoError> {
        Ok(QueryOutcome::Rows(ResultGrid::default()))
    }

    fn use_database(&self, _database: &str) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Serves the first load, then fails every later row fetch.
struct ReloadFailingSource {
    inner: FakeSource,
    fetches: Cell<usize>,
}

impl TableSource for ReloadFailingSource {
    fn list_databases(&self) -> Result<Vec<String>, RepoError> {
        self.inner.list_databases()
    }

    fn list_tables(&self, database: &str) -> Result<Vec<TableEntry>, RepoError> {
        self.inner.list_tables(database)
    }

    fn describe_table(&self, database: &str, table: &str) -> Result<Vec<ColumnMeta>, RepoError> {
        self.inner.describe_table(database, table)
    }

    fn fetch_rows(&self, database: &str, table: &str) -> Result<Vec<SnapshotRow>, RepoError> {
        self.fetches.set(self.fetches.get() + 1);
        if self.fetches.get() > 1 {
            return Err(RepoError::Message("connection lost".to_string()));
        }
        self.inner.fetch_rows(database, table)
    }
}

fn sized_items() -> FakeSource {
    FakeSource {
        columns: vec![
            ColumnMeta::new("id", "int(11)").with_key(KeyClass::Primary),
            ColumnMeta::new("size", "enum('s','m','l')").with_default("m"),
        ],
        rows: vec![
            vec![RawValue::from("1"), RawValue::from("s")],
            vec![RawValue::from("2"), RawValue::from("l")],
        ],
    }
}

#[test]
fn describe_table_reports_keys_and_defaults() {
    let (temp_dir, db_path) = seed_db(
        "describe",
        "CREATE TABLE people (
            nick TEXT NOT NULL,
            email TEXT UNIQUE,
            id INTEGER PRIMARY KEY,
            note TEXT DEFAULT 'n/a'
        );",
    );
    let conn = Connection::open(&db_path).expect("should open sqlite db");

    let columns = describe_table(&conn, "main", "people").expect("describe should succeed");

    let keys: Vec<KeyClass> = columns.iter().map(|column| column.key_class).collect();
    assert_eq!(
        keys,
        vec![
            KeyClass::None,
            KeyClass::Unique,
            KeyClass::Primary,
            KeyClass::None
        ]
    );
    assert_eq!(columns[3].default_raw(), Some("n/a"));
    assert_eq!(columns[0].default_raw(), None);
    assert!(!columns[0].nullable);
    assert!(columns[3].nullable);
    assert_eq!(columns[2].key_class.label(), "PRI");

    let key = resolve_unique_key(&columns).expect("table has columns");
    assert_eq!(key.name, "email");
    assert_eq!(key.index, 1);

    let missing = describe_table(&conn, "main", "nope");
    assert!(missing.is_err(), "unknown table should fail");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn unquote_default_strips_literal_quotes_only() {
    assert_eq!(unquote_default("'2020-01-01'"), "2020-01-01");
    assert_eq!(unquote_default("'it''s'"), "it's");
    assert_eq!(unquote_default("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
    assert_eq!(unquote_default("0"), "0");
}

#[test]
fn saving_an_edited_cell_updates_only_that_row() {
    let (temp_dir, db_path) = seed_db("save-update", TWO_ROW_TABLE);
    let service = edit_service(&db_path, &AppConfig::default());
    let mut session = service.load("main", "t").expect("load should succeed");

    session.set_cell(1, 1, "bb").expect("edit should be accepted");

    let pending = session.pending_statements().expect("diff should succeed");
    assert_eq!(
        pending,
        vec![Statement::new(
            "UPDATE `main`.`t` SET `name` = ? WHERE `id` = '2'",
            vec!["bb".to_string()],
        )]
    );

    let report = service.save(&mut session).expect("save should succeed");

    assert_eq!(report.applied, 1);
    assert!(!session.is_dirty(), "reloaded session should be clean");
    assert_eq!(session.cell(1, 1), Some(&text("bb")));
    assert_eq!(
        names_by_id(&db_path),
        vec![(1, "a".to_string()), (2, "bb".to_string())]
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn flagged_row_is_deleted_without_an_update() {
    let (temp_dir, db_path) = seed_db("save-delete", TWO_ROW_TABLE);
    let service = edit_service(&db_path, &AppConfig::default());
    let mut session = service.load("main", "t").expect("load should succeed");

    session.set_cell(0, 1, "zz").expect("edit should be accepted");
    assert!(session.toggle_deleted(0).expect("toggle should succeed"));

    let pending = session.pending_statements().expect("diff should succeed");
    assert_eq!(
        pending,
        vec![Statement::new(
            "DELETE FROM `main`.`t` WHERE `id` = ?",
            vec!["1".to_string()],
        )]
    );

    let blocked = session.set_cell(0, 1, "again");
    assert!(
        matches!(blocked, Err(EditError::Format(_))),
        "deleted rows should reject edits: {blocked:?}"
    );

    service.save(&mut session).expect("save should succeed");

    assert_eq!(names_by_id(&db_path), vec![(2, "b".to_string())]);
    assert_eq!(session.loaded_row_count(), 1);
    assert!(session.deleted().is_empty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn appended_row_is_inserted_after_existing_row_statements() {
    let (temp_dir, db_path) = seed_db("save-insert", TWO_ROW_TABLE);
    let service = edit_service(&db_path, &AppConfig::default());
    let mut session = service.load("main", "t").expect("load should succeed");

    let row = session.add_row().expect("add should succeed");
    assert_eq!(row, 2);
    assert!(session.is_appended(row));
    session.set_cell(row, 0, "3").expect("id should be accepted");
    session.set_cell(row, 1, "c").expect("name should be accepted");
    session.set_cell(0, 1, "aa").expect("edit should be accepted");

    let pending = session.pending_statements().expect("diff should succeed");
    assert_eq!(pending.len(), 2);
    assert!(pending[0].text.starts_with("UPDATE"), "{}", pending[0]);
    assert_eq!(
        pending[1],
        Statement::new(
            "INSERT INTO `main`.`t` VALUES (?, ?)",
            vec!["3".to_string(), "c".to_string()],
        )
    );

    let report = service.save(&mut session).expect("save should succeed");

    assert_eq!(report.applied, 2);
    assert_eq!(
        names_by_id(&db_path),
        vec![
            (1, "aa".to_string()),
            (2, "b".to_string()),
            (3, "c".to_string())
        ]
    );
    assert_eq!(session.loaded_row_count(), 3);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn failed_save_keeps_earlier_statements_and_skips_later_ones() {
    let (temp_dir, db_path) = seed_db("save-partial", TWO_ROW_TABLE);
    let service = edit_service(&db_path, &AppConfig::default());
    let mut session = service.load("main", "t").expect("load should succeed");

    session.set_cell(0, 1, "aa").expect("edit should be accepted");
    let duplicate = session.add_row().expect("add should succeed");
    session.set_cell(duplicate, 0, "1").expect("id should be accepted");
    session.set_cell(duplicate, 1, "dup").expect("name should be accepted");
    let never = session.add_row().expect("add should succeed");
    session.set_cell(never, 0, "9").expect("id should be accepted");
    session.set_cell(never, 1, "never").expect("name should be accepted");

    let result = service.save(&mut session);

    match result {
        Err(EditError::Execution {
            index,
            statement,
            message,
            applied,
        }) => {
            assert_eq!(index, 1);
            assert_eq!(applied, 1);
            assert!(statement.contains("INSERT"), "{statement}");
            assert!(message.contains("UNIQUE constraint failed"), "{message}");
        }
        other => panic!("expected an execution failure, got {other:?}"),
    }
    assert_eq!(
        names_by_id(&db_path),
        vec![(1, "aa".to_string()), (2, "b".to_string())]
    );
    assert!(session.is_dirty(), "failed save should keep the edits");
    assert_eq!(session.rows().len(), 4);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn executor_is_not_asked_to_continue_after_a_failure() {
    let executor = Rc::new(RecordingExecutor::new(Some(1)));
    let service = EditService::new(
        Rc::new(sized_items()),
        executor.clone(),
        &AppConfig::default(),
    );
    let mut session = service.load("shop", "items").expect("load should succeed");

    session.set_cell(0, 1, "m").expect("edit should be accepted");
    session.toggle_deleted(1).expect("toggle should succeed");
    let row = session.add_row().expect("add should succeed");
    session.set_cell(row, 0, "3").expect("id should be accepted");

    let err = service
        .save(&mut session)
        .expect_err("second statement should fail");

    assert_eq!(executor.attempted.borrow().len(), 2);
    assert!(executor.attempted.borrow()[1].text.starts_with("DELETE"));
    assert_eq!(
        err.to_string(),
        "statement 2 failed: boom",
        "error should name the failing statement"
    );
}

#[test]
fn enum_cells_only_accept_listed_options() {
    let executor = Rc::new(RecordingExecutor::new(None));
    let service = EditService::new(
        Rc::new(sized_items()),
        executor.clone(),
        &AppConfig::default(),
    );
    let mut session = service.load("shop", "items").expect("load should succeed");

    assert_eq!(
        session.cell(0, 1),
        Some(&DisplayValue::Enum {
            options: vec!["s".to_string(), "m".to_string(), "l".to_string()],
            selected: "s".to_string(),
        })
    );
    assert!(session.set_cell(0, 1, "xl").is_err());
    assert!(!session.is_dirty());

    session.set_cell(0, 1, "l").expect("listed option should be accepted");
    let row = session.add_row().expect("add should succeed");
    assert_eq!(
        session.cell(row, 1).map(DisplayValue::encode),
        Some("m".to_string()),
        "appended rows should start at the column default"
    );

    let report = service.save(&mut session).expect("save should succeed");

    assert_eq!(report.applied, 2);
    let attempted = executor.attempted.borrow();
    assert_eq!(attempted[0].parameters, vec!["l".to_string()]);
    assert_eq!(
        attempted[1],
        Statement::new(
            "INSERT INTO `shop`.`items` (`size`) VALUES (?)",
            vec!["m".to_string()],
        ),
        "blank cells are left out of the insert"
    );
}

#[test]
fn applied_save_is_not_repeated_when_the_reload_fails() {
    let executor = Rc::new(RecordingExecutor::new(None));
    let service = EditService::new(
        Rc::new(ReloadFailingSource {
            inner: sized_items(),
            fetches: Cell::new(0),
        }),
        executor.clone(),
        &AppConfig::default(),
    );
    let mut session = service.load("shop", "items").expect("load should succeed");

    session.set_cell(0, 1, "l").expect("edit should be accepted");
    session.toggle_deleted(1).expect("toggle should succeed");
    let row = session.add_row().expect("add should succeed");
    session.set_cell(row, 0, "3").expect("id should be accepted");

    let report = service.save(&mut session).expect("save should succeed");

    assert_eq!(report.applied, 3);
    let refresh_error = report.refresh_error.expect("reload should have failed");
    assert!(refresh_error.contains("connection lost"), "{refresh_error}");
    assert!(!session.is_dirty(), "applied edits should not be pending again");
    assert_eq!(session.loaded_row_count(), 2);
    assert_eq!(session.cell(0, 1).map(DisplayValue::encode), Some("l".to_string()));
    assert_eq!(session.cell(1, 0).map(DisplayValue::encode), Some("3".to_string()));

    let again = service.save(&mut session).expect("empty save should succeed");
    assert_eq!(again.applied, 0);
    assert_eq!(executor.attempted.borrow().len(), 3);
}

#[test]
fn date_range_widens_to_value_and_default() {
    let (temp_dir, db_path) = seed_db(
        "date-range",
        "CREATE TABLE events (id INTEGER PRIMARY KEY, happened DATE DEFAULT '2020-01-01');
         INSERT INTO events VALUES (1, '1999-05-05');",
    );
    let config = AppConfig {
        date_min: date(2000, 1, 1),
        date_max: date(2010, 12, 31),
        ..AppConfig::default()
    };
    let service = edit_service(&db_path, &config);
    let mut session = service.load("main", "events").expect("load should succeed");

    match session.cell(0, 1) {
        Some(DisplayValue::Date { value, range }) => {
            assert_eq!(*value, Some(date(1999, 5, 5)));
            assert!(range.contains(date(1999, 5, 5)));
            assert!(range.contains(date(2020, 1, 1)));
            assert!(!range.contains(date(1990, 1, 1)));
        }
        other => panic!("expected a date cell, got {other:?}"),
    }

    assert!(session.set_cell(0, 1, "1990-01-01").is_err());
    session
        .set_cell(0, 1, "2015-06-01")
        .expect("date inside the range should be accepted");
    service.save(&mut session).expect("save should succeed");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let stored: String = conn
        .query_row("SELECT happened FROM events WHERE id = ?1", params![1], |row| {
            row.get(0)
        })
        .expect("row should exist");
    assert_eq!(stored, "2015-06-01");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn added_rows_start_from_column_defaults() {
    let (temp_dir, db_path) = seed_db(
        "add-row",
        "CREATE TABLE items (
            id INTEGER PRIMARY KEY,
            label TEXT DEFAULT 'new',
            made DATE DEFAULT '2020-01-01',
            stamp DATETIME DEFAULT CURRENT_TIMESTAMP
        );",
    );
    let service = edit_service(&db_path, &AppConfig::default());
    let mut session = service.load("main", "items").expect("load should succeed");

    let row = session.add_row().expect("add should succeed");

    let cells: Vec<String> = session.rows()[row].iter().map(DisplayValue::encode).collect();
    assert_eq!(cells, vec!["", "new", "2020-01-01", ""]);

    session.toggle_deleted(row).expect("toggle should succeed");
    assert!(
        session
            .pending_statements()
            .expect("diff should succeed")
            .is_empty(),
        "an appended row flagged for deletion is never inserted"
    );
    assert!(!session.toggle_deleted(row).expect("toggle should succeed"));
    assert!(!session.is_deleted(row));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn appended_rows_leave_blank_cells_to_column_defaults() {
    let (temp_dir, db_path) = seed_db(
        "insert-defaults",
        "CREATE TABLE items (
            id INTEGER PRIMARY KEY,
            label TEXT DEFAULT 'new',
            stamp DATETIME DEFAULT CURRENT_TIMESTAMP
        );
         INSERT INTO items (id, label) VALUES (1, 'first');",
    );
    let service = edit_service(&db_path, &AppConfig::default());
    let mut session = service.load("main", "items").expect("load should succeed");

    let row = session.add_row().expect("add should succeed");
    session.set_cell(row, 1, "second").expect("label should be accepted");
    assert_eq!(
        session.pending_statements().expect("diff should succeed"),
        vec![Statement::new(
            "INSERT INTO `main`.`items` (`label`) VALUES (?)",
            vec!["second".to_string()],
        )]
    );

    service.save(&mut session).expect("save should succeed");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let (id, stamp): (i64, Option<String>) = conn
        .query_row(
            "SELECT id, stamp FROM items WHERE label = 'second'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("row should exist");
    assert_eq!(id, 2, "the rowid alias should be assigned by SQLite");
    assert!(stamp.is_some_and(|stamp| !stamp.is_empty()));
    assert_eq!(session.cell(1, 0).map(DisplayValue::encode), Some("2".to_string()));
    assert!(!session.is_dirty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn load_rejects_dates_that_are_not_zero_padded() {
    let (temp_dir, db_path) = seed_db(
        "loose-date",
        "CREATE TABLE ev (id INTEGER PRIMARY KEY, d DATE);
         INSERT INTO ev VALUES (1, '2020-01-05');",
    );
    let service = edit_service(&db_path, &AppConfig::default());

    let session = service.load("main", "ev").expect("canonical dates should load");
    assert!(!session.is_dirty(), "an untouched table has nothing to save");

    Connection::open(&db_path)
        .expect("should open sqlite db")
        .execute("INSERT INTO ev VALUES (2, '2020-1-5')", [])
        .expect("insert should run");

    match service.load("main", "ev") {
        Err(EditError::Format(message)) => assert!(message.contains("2020-1-5"), "{message}"),
        other => panic!("expected a format error, got {other:?}"),
    }

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn read_only_databases_reject_edits() {
    let (temp_dir, db_path) = seed_db("read-only", TWO_ROW_TABLE);
    let config = AppConfig {
        read_only_databases: vec!["MAIN".to_string()],
        ..AppConfig::default()
    };
    let service = edit_service(&db_path, &config);
    let mut session = service.load("main", "t").expect("load should succeed");

    assert!(session.is_read_only());
    assert!(matches!(
        session.set_cell(0, 1, "x"),
        Err(EditError::ReadOnly(_))
    ));
    assert!(matches!(session.add_row(), Err(EditError::ReadOnly(_))));
    assert!(matches!(
        session.toggle_deleted(0),
        Err(EditError::ReadOnly(_))
    ));
    assert!(matches!(
        service.save(&mut session),
        Err(EditError::ReadOnly(_))
    ));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn discard_reloads_the_loaded_rows() {
    let (temp_dir, db_path) = seed_db("discard", TWO_ROW_TABLE);
    let service = edit_service(&db_path, &AppConfig::default());
    let mut session = service.load("main", "t").expect("load should succeed");

    session.set_cell(0, 1, "changed").expect("edit should be accepted");
    session.add_row().expect("add should succeed");
    session.toggle_deleted(1).expect("toggle should succeed");
    assert!(session.is_dirty());

    service.discard(&mut session).expect("discard should succeed");

    assert!(!session.is_dirty());
    assert_eq!(session.rows().len(), 2);
    assert_eq!(session.cell(0, 1), Some(&text("a")));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn script_runs_statements_in_order() {
    let (temp_dir, db_path) = seed_db("script", TWO_ROW_TABLE);
    let mut service = query_service(&db_path);

    let report = service.run_script(
        "USE main;
         SELECT id, name FROM t ORDER BY id;
         UPDATE t SET name = 'x' WHERE id = 1;",
    );

    assert_eq!(report.error, None);
    assert!(!report.schema_changed);
    assert_eq!(service.current_database(), Some("main"));
    assert_eq!(report.outputs.len(), 2);
    assert_eq!(
        report.outputs[0].outcome,
        QueryOutcome::Rows(ResultGrid {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec!["1".to_string(), "a".to_string()],
                vec!["2".to_string(), "b".to_string()],
            ],
        })
    );
    assert_eq!(report.outputs[1].outcome, QueryOutcome::Affected(1));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn script_stops_at_first_error() {
    let (temp_dir, db_path) = seed_db("script-error", TWO_ROW_TABLE);
    let mut service = query_service(&db_path);

    let report = service.run_script("SELECT 1; USE nowhere; DELETE FROM t");

    let error = report.error.clone().expect("USE should fail");
    assert_eq!(error.number, 2);
    assert_eq!(error.statement, "USE nowhere");
    assert!(error.message.contains("Unknown database"), "{}", error.message);
    assert!(error.to_string().starts_with("In query 2:"));
    assert_eq!(report.outputs.len(), 1);
    assert_eq!(names_by_id(&db_path).len(), 2, "later statements never ran");

    let report = service.run_script("SELEC 1");
    assert_eq!(report.error.map(|error| error.number), Some(1));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn schema_statements_flag_a_tree_refresh() {
    let (temp_dir, db_path) = seed_db("script-schema", TWO_ROW_TABLE);
    let mut service = query_service(&db_path);

    let report = service.run_script("CREATE TABLE extra (a TEXT); INSERT INTO extra VALUES ('x')");

    assert_eq!(report.error, None);
    assert!(report.schema_changed);
    let tables = service.list_tables("main").expect("tables should list");
    assert!(tables.iter().any(|entry| entry.name == "extra"));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn rename_and_drop_tables_and_views() {
    let (temp_dir, db_path) = seed_db(
        "rename-drop",
        "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
         CREATE VIEW t_names AS SELECT name FROM t;",
    );
    let service = query_service(&db_path);

    let tables = service.list_tables("main").expect("tables should list");
    assert_eq!(
        tables,
        vec![
            TableEntry {
                name: "t".to_string(),
                kind: TableKind::Table
            },
            TableEntry {
                name: "t_names".to_string(),
                kind: TableKind::View
            },
        ]
    );

    service
        .drop_table("main", &tables[1])
        .expect("view drop should succeed");
    service
        .rename_table("main", "t", "people")
        .expect("rename should succeed");

    let names: Vec<String> = service
        .list_tables("main")
        .expect("tables should list")
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["people".to_string()]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn attached_databases_are_listed_and_editable() {
    let (temp_dir, db_path) = seed_db("attach-main", "CREATE TABLE local (a TEXT);");
    let other_path = temp_dir.join("other.sqlite");
    Connection::open(&other_path)
        .expect("should open sqlite db")
        .execute_batch(TWO_ROW_TABLE)
        .expect("seed sql should run");

    let workspace = Workspace::open(&db_path, &AppConfig::default()).expect("should open");
    workspace
        .repo
        .attach(&other_path, "other")
        .expect("attach should succeed");

    let tree = workspace.tree().expect("tree should load");
    assert!(tree.contains_key("main"));
    assert!(tree.contains_key("other"));
    assert_eq!(tree["other"][0].name, "t");

    let mut session = workspace
        .edit
        .load("other", "t")
        .expect("load should succeed");
    session.set_cell(0, 1, "remote").expect("edit should be accepted");
    workspace.edit.save(&mut session).expect("save should succeed");

    assert_eq!(
        names_by_id(&other_path),
        vec![(1, "remote".to_string()), (2, "b".to_string())]
    );

    drop(workspace);
    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn use_of_an_attached_database_is_rejected() {
    let (temp_dir, db_path) = seed_db("use-attached", "CREATE TABLE t (v TEXT);");
    let other_path = temp_dir.join("other.sqlite");
    Connection::open(&other_path)
        .expect("should open sqlite db")
        .execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('other');")
        .expect("seed sql should run");

    let mut workspace = Workspace::open(&db_path, &AppConfig::default()).expect("should open");
    workspace
        .repo
        .attach(&other_path, "o")
        .expect("attach should succeed");

    let report = workspace.query.run_script("USE o; SELECT v FROM t");

    let error = report.error.expect("USE o should fail");
    assert_eq!(error.number, 1);
    assert!(error.message.contains("not supported"), "{}", error.message);
    assert!(report.outputs.is_empty(), "the SELECT must not run against main");
    assert_eq!(workspace.query.current_database(), None);

    drop(workspace);
    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn config_round_trips_through_json() {
    let temp_dir = unique_test_dir("config");
    let path = temp_dir.join("nested").join("config.json");

    let missing = AppConfig::load(&path).expect("missing config should load defaults");
    assert_eq!(missing, AppConfig::default());

    let config = AppConfig {
        database_path: Some(temp_dir.join("shop.sqlite")),
        read_only_databases: vec!["archive".to_string()],
        date_min: date(1900, 1, 1),
        log_filter: "table_editor=debug".to_string(),
        ..AppConfig::default()
    };
    config.save(&path).expect("config should save");

    let loaded = AppConfig::load(&path).expect("config should load");
    assert_eq!(loaded, config);
    assert!(loaded.is_read_only("Archive"));
    assert!(!loaded.is_read_only("main"));
    assert_eq!(loaded.codec_ranges().date.min, date(1900, 1, 1));

    fs::write(&path, r#"{ "log_filter": "warn" }"#).expect("should write partial config");
    let partial = AppConfig::load(&path).expect("partial config should load");
    assert_eq!(partial.log_filter, "warn");
    assert_eq!(partial.date_max, AppConfig::default().date_max);

    fs::write(&path, "not json").expect("should write broken config");
    assert!(AppConfig::load(&path).is_err());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn query_files_open_mark_changes_and_save() {
    let temp_dir = unique_test_dir("query-files");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let script_path = temp_dir.join("report.sql");
    fs::write(&script_path, "SELECT 1;").expect("should write query file");

    let mut tabs = QueryTabs::new();
    tabs.add_tab();
    tabs.open_file(&script_path).expect("open should succeed");
    assert_eq!(tabs.active_tab().text(), "SELECT 1;");
    assert_eq!(tabs.active_tab().label(), "report.sql");

    tabs.set_text("SELECT 2;".to_string());
    assert_eq!(tabs.active_tab().label(), "* report.sql");
    assert_eq!(tabs.unsaved(), vec![1]);

    tabs.set_text("SELECT 1;".to_string());
    assert!(tabs.unsaved().is_empty(), "restoring the text clears the mark");

    tabs.set_text("SELECT 3;".to_string());
    assert_eq!(tabs.save_all().expect("save should succeed"), 1);
    assert_eq!(
        fs::read_to_string(&script_path).expect("should read query file"),
        "SELECT 3;"
    );
    assert_eq!(tabs.active_tab().label(), "report.sql");

    let copy_path = temp_dir.join("copy.sql");
    tabs.select(0);
    tabs.set_text("DELETE FROM t;".to_string());
    tabs.save_as(0, &copy_path).expect("save as should succeed");
    assert_eq!(tabs.active_tab().path(), Some(copy_path.as_path()));
    assert_eq!(tabs.active_tab().label(), "copy.sql");
    assert_eq!(
        fs::read_to_string(&copy_path).expect("should read query file"),
        "DELETE FROM t;"
    );

    assert!(tabs.open_file(&temp_dir.join("missing.sql")).is_err());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}
