use crate::restart::{marker_at_or_before, RestartMarker};

/// An append-only timestamped event stream with optional amplitude and
/// width per event (spec.md §3, §4.5).
#[derive(Debug, Clone)]
pub struct EventData {
    times: Vec<f64>,
    sizes: Vec<Option<f64>>,
    widths: Vec<Option<f64>>,
    mean_size: f64,
    mean_ratio: f64,
    size_unit: String,
    restarts: Vec<RestartMarker>,
    last_time: Option<f64>,
}

impl EventData {
    pub fn new(size_unit: impl Into<String>, mean_ratio: f64) -> Self {
        Self {
            times: Vec::new(),
            sizes: Vec::new(),
            widths: Vec::new(),
            mean_size: 0.0,
            mean_ratio,
            size_unit: size_unit.into(),
            restarts: vec![RestartMarker::new(0, 0.0)],
            last_time: None,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn mean_size(&self) -> f64 {
        self.mean_size
    }

    pub fn set_mean_ratio(&mut self, ratio: f64) {
        self.mean_ratio = ratio;
    }

    pub fn size_unit(&self) -> &str {
        &self.size_unit
    }

    /// Appends an event at `time` with optional `size`/`width`. Events
    /// with `time` earlier than the last kept time are dropped (spec.md
    /// §3 invariant, §8 invariant 10).
    pub fn push(&mut self, time: f64, size: Option<f64>, width: Option<f64>) {
        if let Some(last) = self.last_time {
            if time < last {
                tracing::debug!(time, last, "dropping out-of-order event");
                return;
            }
        }
        self.times.push(time);
        self.sizes.push(size);
        self.widths.push(width);
        self.last_time = Some(time);

        if let Some(s) = size {
            let n = self.times.len() as f64;
            // running mean with a 1/N-like decay, reduced when events are
            // sparse so the indicator cannot oscillate wildly (spec.md
            // §4.5).
            let ratio = self.adaptive_ratio(time);
            self.mean_size += ratio * (s - self.mean_size);
            let _ = n;
        }
    }

    /// Reduces the configured mean ratio when the local event rate (over
    /// the last second) is low, per spec.md §4.5.
    fn adaptive_ratio(&self, time: f64) -> f64 {
        let window_start = time - 1.0;
        let recent = self
            .times
            .iter()
            .rev()
            .take_while(|&&t| t >= window_start)
            .count()
            .max(1) as f64;
        if recent < 1.0 {
            self.mean_ratio
        } else {
            self.mean_ratio.min(self.mean_ratio * recent)
        }
    }

    pub fn restart(&mut self, wall_time: f64) {
        self.restarts.push(RestartMarker::new(self.len() as i64, wall_time));
        self.last_time = None;
    }

    pub fn restarts(&self) -> &[RestartMarker] {
        &self.restarts
    }

    /// Restart-aware position of event index `i`, mirroring
    /// [`crate::InData::pos`].
    pub fn pos(&self, index: i64, sample_interval: f64) -> f64 {
        let marker = marker_at_or_before(&self.restarts, index).unwrap_or(RestartMarker::new(0, 0.0));
        marker.wall_time + (index - marker.index) as f64 * sample_interval
    }

    /// Mean firing rate over the whole kept history.
    pub fn mean_rate(&self) -> f64 {
        if self.times.len() < 2 {
            return 0.0;
        }
        let span = self.times[self.times.len() - 1] - self.times[0];
        if span <= 0.0 {
            0.0
        } else {
            (self.times.len() - 1) as f64 / span
        }
    }

    /// Accumulates a trial-by-trial firing-rate estimate into `rate`,
    /// implementing spec.md §4.5's
    /// `rate[k] = rate[k] + (1/(trial+1)) * (newrate[k] - rate[k])`.
    pub fn add_frequency(&self, rate: &mut [f64], trial: &mut i32, offset: f64, bin_width: f64) {
        let bins = rate.len();
        let mut counts = vec![0u32; bins];
        for &t in &self.times {
            let shifted = t - offset;
            if shifted < 0.0 {
                continue;
            }
            let bin = (shifted / bin_width) as usize;
            if bin < bins {
                counts[bin] += 1;
            }
        }
        let n = (*trial + 1) as f64;
        for k in 0..bins {
            let new_rate = counts[k] as f64 / bin_width;
            rate[k] += (1.0 / n) * (new_rate - rate[k]);
        }
        *trial += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_drops_earlier_than_last() {
        let mut events = EventData::new("mV", 0.1);
        events.push(1.0, Some(5.0), None);
        events.push(0.5, Some(5.0), None);
        assert_eq!(events.len(), 1);
        events.push(1.5, Some(5.0), None);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn times_are_monotonic() {
        let mut events = EventData::new("mV", 0.1);
        for t in [0.1, 0.2, 0.05, 0.3, 0.3] {
            events.push(t, None, None);
        }
        for w in events.times().windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn restart_resets_last_time_tracking() {
        let mut events = EventData::new("mV", 0.1);
        events.push(1.0, None, None);
        events.restart(5.0);
        // after a restart, an earlier-looking time is accepted again
        events.push(0.1, None, None);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn add_frequency_running_mean() {
        let mut rate = vec![0.0; 4];
        let mut trial = 0;
        let mut events = EventData::new("mV", 0.1);
        for t in [0.05, 0.15, 0.25, 0.35] {
            events.push(t, None, None);
        }
        events.add_frequency(&mut rate, &mut trial, 0.0, 0.1);
        assert_eq!(trial, 1);
        assert!(rate.iter().all(|&r| (r - 10.0).abs() < 1e-9));
    }
}
