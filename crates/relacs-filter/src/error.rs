use thiserror::Error;

pub type FilterResult<T> = Result<T, FilterError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("filter node '{0}' depends on unknown input '{1}'")]
    UnknownInput(String, String),
    #[error("filter graph has a dependency cycle through '{0}'")]
    Cycle(String),
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),
}
