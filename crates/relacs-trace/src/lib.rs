//! The cyclic trace store: [`InData`] ring buffers of engineering-unit
//! samples, [`EventData`] event streams, and the restart-marker bookkeeping
//! both share (spec.md §4.1, §4.5).

mod buffer;
mod error;
mod events;
mod indata;
mod range;
mod restart;
mod stats;

pub use buffer::CyclicBuffer;
pub use error::{TraceError, TraceResult};
pub use events::EventData;
pub use indata::{AcquisitionMode, InData, ReferenceMode, SourceFlag};
pub use range::{RangeLoop, Sequence};
pub use restart::RestartMarker;
pub use stats::Stats;

bitflags::bitflags! {
    /// Error taxonomy shared by InData and OutData (spec.md §7). Defined
    /// here since InData is the lowest layer that needs it; `relacs-daq`
    /// reuses it for OutData.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ErrorKind: u32 {
        // Device
        const NO_DEVICE             = 1 << 0;
        const DEVICE_NOT_OPEN       = 1 << 1;
        const INVALID_DEVICE        = 1 << 2;
        const BUSY                  = 1 << 3;
        const UNKNOWN                = 1 << 4;
        // Channel
        const INVALID_CHANNEL       = 1 << 5;
        const INVALID_GAIN          = 1 << 6;
        const INVALID_REFERENCE     = 1 << 7;
        const INVALID_SAMPLE_RATE   = 1 << 8;
        const INVALID_DELAY         = 1 << 9;
        const INVALID_START_SOURCE  = 1 << 10;
        const INVALID_CONTINUOUS    = 1 << 11;
        // Data
        const NO_DATA                = 1 << 12;
        const BUFFER_OVERFLOW       = 1 << 13;
        const OVERFLOW_UNDERRUN     = 1 << 14;
        const CALIBRATION_FAILED    = 1 << 15;
        // Signal
        const OVERFLOW               = 1 << 16;
        const UNDERFLOW              = 1 << 17;
        const NO_INTENSITY           = 1 << 18;
        const ATTENUATOR_ERROR       = 1 << 19;
        // Meta
        const MULTIPLE_DELAYS        = 1 << 20;
        const MULTIPLE_PRIORITIES    = 1 << 21;
    }
}

impl Default for ErrorKind {
    fn default() -> Self {
        ErrorKind::empty()
    }
}
