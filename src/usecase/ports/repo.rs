use crate::domain::entities::edit::Statement;
use crate::domain::entities::table::{ColumnMeta, SnapshotRow, TableEntry};

pub use crate::domain::error::RepoError;

pub trait TableSource {
    fn list_databases(&self) -> Result<Vec<String>, RepoError>;
    fn list_tables(&self, database: &str) -> Result<Vec<TableEntry>, RepoError>;
    fn describe_table(&self, database: &str, table: &str) -> Result<Vec<ColumnMeta>, RepoError>;
    fn fetch_rows(&self, database: &str, table: &str) -> Result<Vec<SnapshotRow>, RepoError>;
}

pub trait StatementExecutor {
    /// Applies `statements` in order and stops at the first failure. Nothing
    /// already applied is rolled back. Returns the number applied.
    fn execute_all(&self, statements: &[Statement]) -> Result<usize, ExecutionFailure>;

    fn run_query(&self, sql: &str) -> Result<QueryOutcome, RepoError>;

    /// Makes `database` the target of unqualified names in later statements.
    fn use_database(&self, database: &str) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Rows(ResultGrid),
    Affected(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultGrid {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
