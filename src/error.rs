use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Engine(#[from] relacs_engine::EngineError),
    #[error(transparent)]
    Macro(#[from] relacs_macro::MacroError),
    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

pub type ContextResult<T> = Result<T, ContextError>;
