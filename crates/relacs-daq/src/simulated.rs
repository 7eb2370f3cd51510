use crate::channel::ChannelConfig;
use crate::error::{AttenuatorError, AttenuatorResult, DaqError, DaqResult};
use crate::outdata::OutData;
use crate::traits::{AnalogInput, AnalogOutput, Attenuator};
use relacs_trace::{ErrorKind, InData};

/// A deterministic analog-input back-end that synthesises a sum of sine
/// waves per channel instead of reading real hardware. Used by the
/// engine's simulation mode and by integration tests (spec.md §1
/// "simulation-first").
pub struct SimulatedAnalogInput {
    name: String,
    open: bool,
    channels: Vec<ChannelConfig>,
    samples_emitted: u64,
    /// Samples handed back per `read_data` call; keeps tests deterministic
    /// without needing real time to elapse.
    chunk_size: usize,
}

impl SimulatedAnalogInput {
    pub fn new(name: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            name: name.into(),
            open: false,
            channels: Vec::new(),
            samples_emitted: 0,
            chunk_size,
        }
    }

    fn sample_at(channel: &ChannelConfig, n: u64) -> f64 {
        let t = n as f64 / channel.sample_rate;
        // 10 Hz carrier plus a channel-dependent harmonic, deterministic
        // and reproducible across runs.
        (2.0 * std::f64::consts::PI * 10.0 * t).sin()
            + 0.1 * (2.0 * std::f64::consts::PI * (20.0 + channel.channel_id as f64) * t).sin()
    }
}

impl AnalogInput for SimulatedAnalogInput {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> DaqResult<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> DaqResult<()> {
        self.open = false;
        Ok(())
    }

    fn test_read(&self, channels: &[ChannelConfig]) -> DaqResult<()> {
        if channels.len() > self.max_channels() {
            return Err(DaqError::new(ErrorKind::INVALID_CHANNEL, "too many channels requested"));
        }
        for ch in channels {
            if ch.sample_rate <= 0.0 {
                return Err(DaqError::new(ErrorKind::INVALID_SAMPLE_RATE, "sample rate must be positive"));
            }
        }
        Ok(())
    }

    fn prepare_read(&mut self, channels: &[ChannelConfig]) -> DaqResult<()> {
        self.test_read(channels)?;
        self.channels = channels.to_vec();
        Ok(())
    }

    fn start_read(&mut self) -> DaqResult<()> {
        if !self.open {
            return Err(DaqError::new(ErrorKind::DEVICE_NOT_OPEN, "device not open"));
        }
        self.samples_emitted = 0;
        Ok(())
    }

    fn read_data(&mut self, traces: &mut [InData]) -> DaqResult<usize> {
        if traces.len() != self.channels.len() {
            return Err(DaqError::new(ErrorKind::INVALID_CHANNEL, "trace count does not match prepared channels"));
        }
        for (trace, channel) in traces.iter_mut().zip(&self.channels) {
            for i in 0..self.chunk_size {
                let n = self.samples_emitted + i as u64;
                let raw = Self::sample_at(channel, n);
                trace.push(channel.calibration.to_engineering(raw));
            }
        }
        self.samples_emitted += self.chunk_size as u64;
        Ok(self.chunk_size)
    }

    fn stop(&mut self) -> DaqResult<()> {
        Ok(())
    }

    fn reset(&mut self) -> DaqResult<()> {
        self.channels.clear();
        self.samples_emitted = 0;
        Ok(())
    }

    fn max_channels(&self) -> usize {
        16
    }
}

/// A deterministic analog-output back-end that just records the last
/// signals it was told to deliver, for assertions in tests.
pub struct SimulatedAnalogOutput {
    name: String,
    open: bool,
    last_written: Vec<OutData>,
}

impl SimulatedAnalogOutput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: false,
            last_written: Vec::new(),
        }
    }

    pub fn last_written(&self) -> &[OutData] {
        &self.last_written
    }
}

impl AnalogOutput for SimulatedAnalogOutput {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> DaqResult<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> DaqResult<()> {
        self.open = false;
        Ok(())
    }

    fn test_write(&self, signals: &mut [OutData]) -> DaqResult<()> {
        for signal in signals.iter_mut() {
            if signal.is_empty() {
                signal.set_error(ErrorKind::NO_DATA, "signal has no samples");
            }
        }
        Ok(())
    }

    fn prepare_write(&mut self, signals: &[OutData]) -> DaqResult<()> {
        if !self.open {
            return Err(DaqError::new(ErrorKind::DEVICE_NOT_OPEN, "device not open"));
        }
        self.last_written = signals.to_vec();
        Ok(())
    }

    fn start_write(&mut self, signals: &[OutData]) -> DaqResult<()> {
        self.last_written = signals.to_vec();
        Ok(())
    }

    fn direct_write(&mut self, signal: &OutData) -> DaqResult<()> {
        self.last_written = vec![signal.clone()];
        Ok(())
    }

    fn stop(&mut self) -> DaqResult<()> {
        Ok(())
    }

    fn reset(&mut self) -> DaqResult<()> {
        self.last_written.clear();
        Ok(())
    }

    fn max_channels(&self) -> usize {
        16
    }
}

/// A deterministic attenuator: a linear dB-to-scale model good enough for
/// the seed tests' mute/unmute assertions.
pub struct SimulatedAttenuator {
    name: String,
    open: bool,
    ao_channel: u32,
    attenuation_db: f64,
    muted: bool,
}

impl SimulatedAttenuator {
    pub fn new(name: impl Into<String>, ao_channel: u32) -> Self {
        Self {
            name: name.into(),
            open: false,
            ao_channel,
            attenuation_db: 0.0,
            muted: false,
        }
    }

    pub fn attenuation_db(&self) -> f64 {
        self.attenuation_db
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

impl Attenuator for SimulatedAttenuator {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> DaqResult<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> DaqResult<()> {
        self.open = false;
        Ok(())
    }

    fn ao_channel(&self) -> u32 {
        self.ao_channel
    }

    fn attenuate(&mut self, intensity: f64, _frequency: f64) -> AttenuatorResult<f64> {
        if !self.open {
            return Err(AttenuatorError::NotOpen);
        }
        if intensity <= 0.0 {
            return Err(AttenuatorError::IntensityUnderflow);
        }
        // linear model: 0 dB at intensity == 1.0 (full scale), 20 dB per
        // decade below that.
        let db = -20.0 * intensity.log10();
        if db < 0.0 {
            return Err(AttenuatorError::IntensityOverflow);
        }
        self.write(db)?;
        Ok(intensity)
    }

    fn write(&mut self, attenuation_db: f64) -> AttenuatorResult<()> {
        if !self.open {
            return Err(AttenuatorError::NotOpen);
        }
        self.attenuation_db = attenuation_db;
        self.muted = false;
        Ok(())
    }

    fn mute(&mut self) -> AttenuatorResult<()> {
        if !self.open {
            return Err(AttenuatorError::NotOpen);
        }
        self.muted = true;
        Ok(())
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_input_produces_deterministic_stream() {
        let mut ai = SimulatedAnalogInput::new("sim0", 100);
        ai.open().unwrap();
        let channels = vec![ChannelConfig::new(0, 10_000.0)];
        ai.prepare_read(&channels).unwrap();
        ai.start_read().unwrap();
        let mut trace = InData::new(1000, 1.0 / 10_000.0, 0.0, 0, 0, "V");
        ai.read_data(std::slice::from_mut(&mut trace)).unwrap();
        assert_eq!(trace.size(), 100);

        let mut ai2 = SimulatedAnalogInput::new("sim0", 100);
        ai2.open().unwrap();
        ai2.prepare_read(&channels).unwrap();
        ai2.start_read().unwrap();
        let mut trace2 = InData::new(1000, 1.0 / 10_000.0, 0.0, 0, 0, "V");
        ai2.read_data(std::slice::from_mut(&mut trace2)).unwrap();
        assert_eq!(trace.at(0).unwrap(), trace2.at(0).unwrap());
    }

    #[test]
    fn attenuator_mute_sets_flag_and_blocks_write_unless_reopened() {
        let mut att = SimulatedAttenuator::new("att0", 0);
        att.open().unwrap();
        att.write(10.0).unwrap();
        att.mute().unwrap();
        assert!(att.is_muted());
    }

    #[test]
    fn attenuator_rejects_nonpositive_intensity() {
        let mut att = SimulatedAttenuator::new("att0", 0);
        att.open().unwrap();
        assert_eq!(att.attenuate(0.0, 100.0), Err(AttenuatorError::IntensityUnderflow));
    }
}
