use crate::channel::ChannelConfig;
use crate::error::{AttenuatorResult, DaqResult};
use crate::outdata::OutData;
use relacs_trace::InData;

/// A multi-channel analog-input back-end (spec.md §4.2).
///
/// Implementations drive real or simulated hardware. The acquisition
/// engine calls these in order: `open`, then per-trial
/// `test_read`/`prepare_read`/`start_read`, then repeated `read_data`
/// until `stop`.
pub trait AnalogInput: Send {
    /// Device identity string, e.g. a driver/board name.
    fn device_name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> DaqResult<()>;

    fn close(&mut self) -> DaqResult<()>;

    /// Validates `channels` against hardware limits without touching the
    /// device. Returns `Ok(())` only if every channel is acceptable as-is.
    fn test_read(&self, channels: &[ChannelConfig]) -> DaqResult<()>;

    /// Commits to `channels`, programming hardware registers but not yet
    /// starting the clock.
    fn prepare_read(&mut self, channels: &[ChannelConfig]) -> DaqResult<()>;

    /// Arms the configured acquisition. After this call samples begin
    /// accumulating in the device's internal buffer (spec.md §4.1
    /// "restart protocol" — the caller must push a restart marker to each
    /// `InData` before the first sample from this call is appended).
    fn start_read(&mut self) -> DaqResult<()>;

    /// Drains whatever raw samples are currently available, appending
    /// engineering-unit values to each trace in `traces` (same order as
    /// the channels passed to `prepare_read`). Returns the number of
    /// samples appended per channel.
    fn read_data(&mut self, traces: &mut [InData]) -> DaqResult<usize>;

    fn stop(&mut self) -> DaqResult<()>;

    fn reset(&mut self) -> DaqResult<()>;

    fn max_channels(&self) -> usize;
}

/// A multi-channel analog-output back-end (spec.md §4.2).
pub trait AnalogOutput: Send {
    fn device_name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> DaqResult<()>;

    fn close(&mut self) -> DaqResult<()>;

    /// Validates `signals` without touching the device, setting error
    /// flags on any signal that cannot be delivered as specified.
    fn test_write(&self, signals: &mut [OutData]) -> DaqResult<()>;

    /// Commits to `signals`, programming hardware registers.
    fn prepare_write(&mut self, signals: &[OutData]) -> DaqResult<()>;

    /// Arms delivery. Once hardware acknowledges the first sample, the
    /// engine stamps `signal_time` on each signal and on the traces it
    /// overlaps (spec.md §6).
    fn start_write(&mut self, signals: &[OutData]) -> DaqResult<()>;

    /// Writes a signal immediately, bypassing the triggered/armed path
    /// (spec.md §4.3 "directWrite", used for e.g. attenuator resets).
    fn direct_write(&mut self, signal: &OutData) -> DaqResult<()>;

    fn stop(&mut self) -> DaqResult<()>;

    fn reset(&mut self) -> DaqResult<()>;

    fn max_channels(&self) -> usize;
}

/// An attenuator sitting between an `AnalogOutput` channel and the
/// transducer, converting a requested intensity into an attenuation plus
/// a signal-level rescale (spec.md §4.2).
pub trait Attenuator: Send {
    fn device_name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> DaqResult<()>;

    fn close(&mut self) -> DaqResult<()>;

    /// The analog-output line this attenuator sits on.
    fn ao_channel(&self) -> u32;

    /// Computes the attenuation level needed to deliver `intensity` at
    /// `frequency` and returns the scale factor to apply to the raw
    /// signal samples so the attenuated output matches `intensity`.
    fn attenuate(&mut self, intensity: f64, frequency: f64) -> AttenuatorResult<f64>;

    /// Sets the hardware attenuation level directly, in dB.
    fn write(&mut self, attenuation_db: f64) -> AttenuatorResult<()>;

    fn mute(&mut self) -> AttenuatorResult<()>;

    /// Whether the attenuator is currently muted (spec.md §8 seed test C).
    fn is_muted(&self) -> bool;
}

/// A digital line bank used for TTL triggers, shutter control, etc.
/// (spec.md §4.2).
pub trait DigitalIO: Send {
    fn device_name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> DaqResult<()>;

    fn close(&mut self) -> DaqResult<()>;

    fn configure_line(&mut self, line: u32, output: bool) -> DaqResult<()>;

    fn write_line(&mut self, line: u32, high: bool) -> DaqResult<()>;

    fn read_line(&self, line: u32) -> DaqResult<bool>;
}

/// A hardware trigger source gating the start of acquisition/output
/// (spec.md §4.2).
pub trait Trigger: Send {
    fn device_name(&self) -> &str;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> DaqResult<()>;

    fn close(&mut self) -> DaqResult<()>;

    /// Blocks (or polls) until the trigger condition fires, returning the
    /// wall-clock time it fired at.
    fn wait(&mut self) -> DaqResult<f64>;
}
