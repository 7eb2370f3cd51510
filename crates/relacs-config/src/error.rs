use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(String, String),

    #[error("failed to parse settings: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
