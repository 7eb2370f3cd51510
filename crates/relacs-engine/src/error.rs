use relacs_daq::DaqError;
use relacs_filter::FilterError;
use relacs_trace::ErrorKind;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Daq(#[from] DaqError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("no device assigned to trace '{0}'")]
    NoDeviceAssigned(u32),

    #[error("device busy: a priority signal is currently running")]
    Busy,

    #[error("an OutList mixes more than one delay value")]
    MultipleDelays,

    #[error("an OutList mixes more than one priority value")]
    MultiplePriorities,

    #[error("gain change mid-run is not permitted under CounterSync")]
    InvalidSampleRateUnderCounterSync,

    #[error("{0:?}")]
    Kind(ErrorKind),
}
