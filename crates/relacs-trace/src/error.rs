use thiserror::Error;

pub type TraceResult<T> = Result<T, TraceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    #[error("index {index} is below the accessible minimum {min_index}")]
    BelowMinIndex { index: i64, min_index: i64 },

    #[error("index {index} is at or beyond size {size}")]
    AtOrBeyondSize { index: i64, size: i64 },

    #[error("time {time} is out of range")]
    TimeOutOfRange { time: f64 },

    #[error("window [{from}, {to}) is empty")]
    EmptyWindow { from: i64, to: i64 },
}
