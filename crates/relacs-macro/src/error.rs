use thiserror::Error;

#[derive(Debug, Error)]
pub enum MacroError {
    #[error("macro file parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("unknown macro '{0}'")]
    UnknownMacro(String),
    #[error("macro '{0}' has no commands")]
    EmptyMacro(String),
    #[error("no fallback macro defined")]
    NoFallback,
    #[error("macro command stack is empty")]
    StackEmpty,
    #[error(transparent)]
    Repro(#[from] relacs_repro::ReproError),
}

pub type MacroResult<T> = Result<T, MacroError>;
