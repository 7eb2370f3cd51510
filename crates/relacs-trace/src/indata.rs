use crate::buffer::CyclicBuffer;
use crate::error::TraceResult;
use crate::restart::{marker_at_or_before, RestartMarker};
use crate::stats::{Histogram, Stats};
use crate::ErrorKind;

/// How the input channel is wired relative to ground (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMode {
    Common,
    Differential,
    Ground,
    Other,
}

/// Whether the trace's samples arrived straight from hardware or were
/// derived by a filter/detector (spec.md §3 "source flag").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFlag {
    RawFromHardware,
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    Continuous,
    Finite,
}

/// An input trace: a cyclic sequence of engineering-unit floats at a fixed
/// sample interval, with restart-aware time indexing (spec.md §3, §4.1).
#[derive(Debug, Clone)]
pub struct InData {
    buffer: CyclicBuffer<f64>,
    sample_interval: f64,
    channel_id: u32,
    device_id: u32,
    voltage_range: f64,
    gain: f64,
    offset: f64,
    unit: String,
    reference_mode: ReferenceMode,
    source: SourceFlag,
    priority: bool,
    mode: AcquisitionMode,
    restarts: Vec<RestartMarker>,
    signal_time: Option<f64>,
    errors: ErrorKind,
    error_message: String,
}

impl InData {
    pub fn new(
        capacity: usize,
        sample_interval: f64,
        origin_time: f64,
        channel_id: u32,
        device_id: u32,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            buffer: CyclicBuffer::new(capacity),
            sample_interval,
            channel_id,
            device_id,
            voltage_range: 1.0,
            gain: 1.0,
            offset: 0.0,
            unit: unit.into(),
            reference_mode: ReferenceMode::Ground,
            source: SourceFlag::RawFromHardware,
            priority: false,
            mode: AcquisitionMode::Continuous,
            restarts: vec![RestartMarker::new(0, origin_time)],
            signal_time: None,
            errors: ErrorKind::empty(),
            error_message: String::new(),
        }
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn sample_rate(&self) -> f64 {
        1.0 / self.sample_interval
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn reference_mode(&self) -> ReferenceMode {
        self.reference_mode
    }

    pub fn set_reference_mode(&mut self, mode: ReferenceMode) {
        self.reference_mode = mode;
    }

    pub fn source(&self) -> SourceFlag {
        self.source
    }

    pub fn set_source(&mut self, source: SourceFlag) {
        self.source = source;
    }

    pub fn priority(&self) -> bool {
        self.priority
    }

    pub fn set_priority(&mut self, priority: bool) {
        self.priority = priority;
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AcquisitionMode) {
        self.mode = mode;
    }

    pub fn voltage_range(&self) -> f64 {
        self.voltage_range
    }

    pub fn set_voltage_range(&mut self, range: f64) {
        self.voltage_range = range;
    }

    pub fn set_gain_offset(&mut self, gain: f64, offset: f64) {
        self.gain = gain;
        self.offset = offset;
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn size(&self) -> i64 {
        self.buffer.size()
    }

    pub fn min_index(&self) -> i64 {
        self.buffer.min_index()
    }

    pub fn push(&mut self, value: f64) {
        self.buffer.push(value);
    }

    pub fn push_slice(&mut self, values: &[f64]) {
        self.buffer.push_slice(values);
    }

    pub fn at(&self, index: i64) -> TraceResult<f64> {
        self.buffer.get(index)
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

    pub fn clear_errors(&mut self) {
        self.errors = ErrorKind::empty();
        self.error_message.clear();
    }

    /// Appends a restart marker at the current size with the given
    /// wall-clock time (spec.md §4.1 "restart protocol"). The DAQ reader
    /// calls this before pushing any sample produced by the new arming —
    /// see invariant spec.md §5(a).
    pub fn restart(&mut self, wall_time: f64) {
        self.restarts.push(RestartMarker::new(self.size(), wall_time));
    }

    pub fn restarts(&self) -> &[RestartMarker] {
        &self.restarts
    }

    /// Restart-aware time of sample `index`: `t0(restart at or before i) +
    /// (i - i_restart) * dt` (spec.md §4.1).
    pub fn pos(&self, index: i64) -> f64 {
        let marker = marker_at_or_before(&self.restarts, index).unwrap_or(RestartMarker::new(0, 0.0));
        marker.wall_time + (index - marker.index) as f64 * self.sample_interval
    }

    /// Restart-aware inverse of [`Self::pos`], clamped to `min_index()`.
    pub fn index_at_time(&self, time: f64) -> i64 {
        let marker = self
            .restarts
            .iter()
            .rev()
            .find(|m| self.pos(m.index) <= time)
            .copied()
            .unwrap_or_else(|| self.restarts[0]);
        let raw = marker.index + ((time - marker.wall_time) / self.sample_interval).round() as i64;
        raw.max(self.min_index())
    }

    pub fn at_time(&self, time: f64) -> TraceResult<f64> {
        self.at(self.index_at_time(time))
    }

    /// The wall-clock of the last stimulus emission observed on this
    /// trace, updated by [`Self::set_signal`].
    pub fn signal_time(&self) -> Option<f64> {
        self.signal_time
    }

    pub fn set_signal(&mut self, wall_time: f64) {
        self.signal_time = Some(wall_time);
    }

    /// The index in this trace's space corresponding to `signal_time()`.
    /// Invariant 1 (spec.md §8): `min_index() <= signal_index() <=
    /// size()`.
    pub fn signal_index(&self) -> i64 {
        match self.signal_time {
            Some(t) => self.index_at_time(t).clamp(self.min_index(), self.size()),
            None => self.size(),
        }
    }

    /// The authoritative clock: the time of the next sample to be pushed,
    /// derived from sample count and restart markers (spec.md §9).
    pub fn current_time(&self) -> f64 {
        self.pos(self.size())
    }

    fn window_indices(&self, from: i64, to: i64) -> (i64, i64) {
        (from.max(self.min_index()), to.min(self.size()))
    }

    pub fn mean(&self, from_index: i64, to_index: i64) -> f64 {
        let (from, to) = self.window_indices(from_index, to_index);
        if to <= from {
            return 0.0;
        }
        let sum: f64 = (from..to).map(|i| self.buffer.get_or_default(i)).sum();
        sum / (to - from) as f64
    }

    pub fn mean_time(&self, from_time: f64, to_time: f64) -> f64 {
        self.mean(self.index_at_time(from_time), self.index_at_time(to_time))
    }

    pub fn stats(&self, from_index: i64, to_index: i64) -> Stats {
        let (from, to) = self.window_indices(from_index, to_index);
        Stats::from_iter((from..to).map(|i| self.buffer.get_or_default(i)))
    }

    pub fn stats_time(&self, from_time: f64, to_time: f64) -> Stats {
        self.stats(self.index_at_time(from_time), self.index_at_time(to_time))
    }

    pub fn histogram(&self, from_index: i64, to_index: i64, bins: usize, low: f64, high: f64) -> Histogram {
        let (from, to) = self.window_indices(from_index, to_index);
        Histogram::from_iter((from..to).map(|i| self.buffer.get_or_default(i)), bins, low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seed test A (spec.md §8): single-channel acquisition.
    #[test]
    fn single_channel_acquisition() {
        let dt = 1.0 / 10_000.0;
        let mut trace = InData::new(5000, dt, 0.0, 0, 0, "V");
        let known_mean = 0.25;
        for i in 0..5000 {
            // deterministic synthesised block: a sign-alternating ripple
            // around a known mean, cancelling exactly over an even count.
            let ripple = if i % 2 == 0 { 0.001 } else { -0.001 };
            trace.push(known_mean + ripple);
        }
        assert_eq!(trace.size(), 5000);
        assert_eq!(trace.min_index(), 0);
        assert!((trace.pos(5000) - 0.5).abs() < 1e-9);
        assert!((trace.mean(0, 5000) - known_mean).abs() < 1e-9);
    }

    #[test]
    fn invariant_signal_index_bounds() {
        let mut trace = InData::new(100, 0.1, 0.0, 0, 0, "V");
        for i in 0..50 {
            trace.push(i as f64);
        }
        trace.set_signal(2.5);
        assert!(trace.signal_index() <= trace.size());
        assert!(trace.min_index() <= trace.signal_index());
    }

    #[test]
    fn restart_sample_time_matches_marker() {
        let dt = 0.01;
        let mut trace = InData::new(100, dt, 0.0, 0, 0, "V");
        for i in 0..10 {
            trace.push(i as f64);
        }
        trace.restart(100.0);
        trace.push(42.0);
        let first_new_index = trace.size() - 1;
        assert!((trace.pos(first_new_index) - 100.0).abs() <= dt);
    }

    #[test]
    fn below_min_index_is_an_error() {
        let mut trace = InData::new(4, 1.0, 0.0, 0, 0, "V");
        for i in 0..10 {
            trace.push(i as f64);
        }
        assert!(trace.at(trace.min_index() - 1).is_err());
        assert!(trace.at(trace.min_index()).is_ok());
    }
}
