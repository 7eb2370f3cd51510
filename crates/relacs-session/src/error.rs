use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is already running")]
    AlreadyRunning,
    #[error("no session is running")]
    NotRunning,
    #[error("table key has no columns")]
    EmptyTableKey,
    #[error("column count mismatch: table has {expected} columns, got {got} values")]
    ColumnMismatch { expected: usize, got: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
