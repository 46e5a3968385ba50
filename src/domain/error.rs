use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("{0}")]
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("format error: {0}")]
    Format(String),

    #[error("grid is out of step with the loaded table: {0}")]
    Misaligned(String),

    #[error("`{0}` is read-only")]
    ReadOnly(String),

    /// The server rejected a statement. `applied` statements before it stay
    /// applied.
    #[error("statement {} failed: {message}", .index + 1)]
    Execution {
        index: usize,
        statement: String,
        message: String,
        applied: usize,
    },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type EditResult<T> = Result<T, EditError>;
