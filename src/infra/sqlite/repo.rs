use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::domain::entities::edit::Statement;
use crate::domain::entities::table::{ColumnMeta, SnapshotRow, TableEntry};
use crate::infra::sqlite::queries::{
    describe_table, execute_all, fetch_rows, list_databases, list_tables, run_query,
};
use crate::infra::sqlite::schema::{attach_database, open_connection};
use crate::usecase::ports::repo::{
    ExecutionFailure, QueryOutcome, RepoError, StatementExecutor, TableSource,
};

pub struct SqliteRepo {
    pub db_path: PathBuf,
    conn: Connection,
}

impl SqliteRepo {
    pub fn open(db_path: &Path) -> Result<Self, RepoError> {
        let conn = open_connection(db_path).map_err(|err| RepoError::Message(err.to_string()))?;
        tracing::info!(path = %db_path.display(), "opened database");
        Ok(Self {
            db_path: db_path.to_path_buf(),
            conn,
        })
    }

    pub fn attach(&self, db_path: &Path, alias: &str) -> Result<(), RepoError> {
        attach_database(&self.conn, db_path, alias)
            .map_err(|err| RepoError::Message(err.to_string()))
    }
}

impl TableSource for SqliteRepo {
    fn list_databases(&self) -> Result<Vec<String>, RepoError> {
        list_databases(&self.conn).map_err(|err| RepoError::Message(err.to_string()))
    }

    fn list_tables(&self, database: &str) -> Result<Vec<TableEntry>, RepoError> {
        list_tables(&self.conn, database).map_err(|err| RepoError::Message(err.to_string()))
    }

    fn describe_table(&self, database: &str, table: &str) -> Result<Vec<ColumnMeta>, RepoError> {
        describe_table(&self.conn, database, table)
            .map_err(|err| RepoError::Message(err.to_string()))
    }

    fn fetch_rows(&self, database: &str, table: &str) -> Result<Vec<SnapshotRow>, RepoError> {
        fetch_rows(&self.conn, database, table).map_err(|err| RepoError::Message(err.to_string()))
    }
}

impl StatementExecutor for SqliteRepo {
    fn execute_all(&self, statements: &[Statement]) -> Result<usize, ExecutionFailure> {
        execute_all(&self.conn, statements)
    }

    fn run_query(&self, sql: &str) -> Result<QueryOutcome, RepoError> {
        run_query(&self.conn, sql).map_err(|err| RepoError::Message(format!("{err:#}")))
    }

    // Unqualified names always resolve against `main` on one connection.
    fn use_database(&self, database: &str) -> Result<(), RepoError> {
        if database == "main" {
            return Ok(());
        }
        Err(RepoError::Message(format!(
            "USE {database} is not supported on SQLite; qualify names as `{database}`.table"
        )))
    }
}
