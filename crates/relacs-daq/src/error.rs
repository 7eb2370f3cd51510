use relacs_trace::ErrorKind;
use thiserror::Error;

pub type DaqResult<T> = Result<T, DaqError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DaqError {
    #[error("{kind:?}: {message}")]
    Kind { kind: ErrorKind, message: String },
}

impl DaqError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Kind {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DaqError::Kind { kind, .. } => *kind,
        }
    }
}

/// Attenuator-specific error taxonomy (spec.md §4.2), wrapped into
/// [`ErrorKind::ATTENUATOR_ERROR`] when surfaced on an OutData.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttenuatorError {
    #[error("attenuation underflow")]
    Underflow,
    #[error("attenuation overflow")]
    Overflow,
    #[error("requested intensity underflows the attenuator's range")]
    IntensityUnderflow,
    #[error("requested intensity overflows the attenuator's range")]
    IntensityOverflow,
    #[error("failed to compute intensity")]
    IntensityFailed,
    #[error("attenuator device is not open")]
    NotOpen,
    #[error("attenuator operation failed")]
    Failed,
    #[error("no attenuator device present")]
    NoDevice,
}

pub type AttenuatorResult<T> = Result<T, AttenuatorError>;
