use relacs_engine::EngineError;
use thiserror::Error;

pub type ReproResult<T> = Result<T, ReproError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReproError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' expected a {1} value")]
    WrongType(String, &'static str),

    #[error("interrupted")]
    Interrupted,
}
