use relacs_trace::ErrorKind;

/// Sentinel intensity value meaning "mute this channel" rather than any
/// real attenuation level (spec.md §8 seed test C;
/// `OutData::MuteIntensity` in the original RELACS `outdata.h`).
pub const MUTE_INTENSITY: f64 = -1.0;

/// Declarative description of an output channel (spec.md §3 "TraceSpec").
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSpec {
    pub device_id: u32,
    pub channel_id: u32,
    pub unit: String,
    pub max_voltage: f64,
    pub reversed: bool,
    pub fixed_sample_rate: Option<f64>,
}

impl TraceSpec {
    pub fn new(device_id: u32, channel_id: u32, unit: impl Into<String>, max_voltage: f64) -> Self {
        Self {
            device_id,
            channel_id,
            unit: unit.into(),
            max_voltage,
            reversed: false,
            fixed_sample_rate: None,
        }
    }
}

/// Lifecycle state of an [`OutData`] (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutDataState {
    Built,
    Tested,
    Prepared,
    Running,
    Done,
}

/// An output signal: an ordered sample sequence plus the delivery
/// parameters the acquisition engine and attenuator need (spec.md §3
/// "OutData").
#[derive(Debug, Clone)]
pub struct OutData {
    samples: Vec<f64>,
    sample_interval: f64,
    carrier_frequency: Option<f64>,
    intensity: Option<f64>,
    delay: f64,
    mute: bool,
    scale: f64,
    device_id: u32,
    channel_id: u32,
    priority: bool,
    state: OutDataState,
    errors: ErrorKind,
    error_message: String,
    /// Wall-clock of the hardware-acknowledged first sample, set once the
    /// engine's write succeeds (spec.md §6 "Signal on the output wire").
    signal_time: Option<f64>,
}

impl OutData {
    pub fn new(device_id: u32, channel_id: u32, sample_interval: f64) -> Self {
        Self {
            samples: Vec::new(),
            sample_interval,
            carrier_frequency: None,
            intensity: None,
            delay: 0.0,
            mute: false,
            scale: 1.0,
            device_id,
            channel_id,
            priority: false,
            state: OutDataState::Built,
            errors: ErrorKind::empty(),
            error_message: String::new(),
            signal_time: None,
        }
    }

    pub fn from_samples(device_id: u32, channel_id: u32, sample_interval: f64, samples: Vec<f64>) -> Self {
        let mut out = Self::new(device_id, channel_id, sample_interval);
        out.samples = samples;
        out
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 * self.sample_interval
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn carrier_frequency(&self) -> Option<f64> {
        self.carrier_frequency
    }

    pub fn set_carrier_frequency(&mut self, fcar: f64) {
        self.carrier_frequency = Some(fcar);
    }

    pub fn intensity(&self) -> Option<f64> {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f64) {
        self.intensity = Some(intensity);
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn set_delay(&mut self, delay: f64) {
        self.delay = delay;
    }

    pub fn mute(&self) -> bool {
        self.mute
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
        if mute {
            self.scale = 0.0;
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn priority(&self) -> bool {
        self.priority
    }

    pub fn set_priority(&mut self, priority: bool) {
        self.priority = priority;
    }

    pub fn state(&self) -> OutDataState {
        self.state
    }

    pub fn set_state(&mut self, state: OutDataState) {
        self.state = state;
    }

    pub fn errors(&self) -> ErrorKind {
        self.errors
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn set_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.errors |= kind;
        self.error_message = message.into();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear_errors(&mut self) {
        self.errors = ErrorKind::empty();
        self.error_message.clear();
    }

    pub fn signal_time(&self) -> Option<f64> {
        self.signal_time
    }

    /// Records the wall-clock of the hardware-acknowledged first sample.
    /// Invariant (spec.md §8 #4): must be `>=` the call time of `write`.
    pub fn set_signal_time(&mut self, wall_time: f64) {
        self.signal_time = Some(wall_time);
    }

    /// Time at which the sample at buffer index `k` is emitted, per
    /// spec.md §6: `signalTime + k * dt`.
    pub fn emission_time(&self, k: usize) -> Option<f64> {
        self.signal_time.map(|t| t + k as f64 * self.sample_interval)
    }
}
