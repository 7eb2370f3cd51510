//! DAQ back-end abstractions: [`AnalogInput`], [`AnalogOutput`],
//! [`Attenuator`], [`DigitalIO`], and [`Trigger`] traits an acquisition
//! engine drives without knowing the concrete hardware (spec.md §4.2),
//! plus deterministic simulated back-ends and a tag-keyed [`DeviceRegistry`].

mod channel;
mod error;
mod outdata;
mod registry;
mod simulated;
mod traits;

pub use channel::{Calibration, ChannelConfig};
pub use error::{AttenuatorError, AttenuatorResult, DaqError, DaqResult};
pub use outdata::{OutData, OutDataState, TraceSpec, MUTE_INTENSITY};
pub use registry::DeviceRegistry;
pub use simulated::{SimulatedAnalogInput, SimulatedAnalogOutput, SimulatedAttenuator};
pub use traits::{AnalogInput, AnalogOutput, Attenuator, DigitalIO, Trigger};
