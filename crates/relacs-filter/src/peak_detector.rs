use relacs_trace::{EventData, InData};

use crate::error::FilterResult;
use crate::traits::{Detector, Node};

/// Generic adaptive peak/trough detector: the canonical built-in
/// `Detector` (spec.md §4.4). Tracks a running trough and peak, accepts a
/// spike once the drop after the peak exceeds `ratio * (peak - trough)`,
/// adapts its threshold toward `min_thresh` with a decay time constant,
/// and optionally rejects spikes that are too narrow or too close to the
/// previous one.
///
/// Parameter names and constants are grounded on the options
/// `spikedetector.cc` exposes (`threshold`, `minthresh`, `maxthresh`,
/// `decay`, `ratio`, `testwidth`/`maxwidth`, `testisi`/`minisi`), reduced
/// here to the engine-facing fields (no GUI option-tree binding).
pub struct PeakDetector {
    id: String,
    input_ids: Vec<String>,

    min_thresh: f64,
    max_thresh: f64,
    decay: f64,
    ratio: f64,
    test_width: bool,
    max_width: f64,
    test_isi: bool,
    min_isi: f64,

    threshold: f64,
    last_index: i64,
    trough_val: f64,
    trough_idx: i64,
    peak_val: f64,
    peak_idx: i64,
    last_spike_time: Option<f64>,
    initialized: bool,
}

impl PeakDetector {
    pub fn new(id: impl Into<String>, input_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input_ids: vec![input_id.into()],
            min_thresh: 1.0,
            max_thresh: 100.0,
            decay: 10.0,
            ratio: 0.5,
            test_width: false,
            max_width: 0.0015,
            test_isi: false,
            min_isi: 0.001,
            threshold: 1.0,
            last_index: i64::MIN,
            trough_val: f64::INFINITY,
            trough_idx: 0,
            peak_val: f64::NEG_INFINITY,
            peak_idx: 0,
            last_spike_time: None,
            initialized: false,
        }
    }

    pub fn with_threshold_bounds(mut self, min_thresh: f64, max_thresh: f64) -> Self {
        self.min_thresh = min_thresh;
        self.max_thresh = max_thresh;
        self.threshold = min_thresh;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_width_test(mut self, max_width: f64) -> Self {
        self.test_width = true;
        self.max_width = max_width;
        self
    }

    pub fn with_isi_test(mut self, min_isi: f64) -> Self {
        self.test_isi = true;
        self.min_isi = min_isi;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Parabolic sub-sample refinement of the peak time, per spec.md
    /// §4.4's "optional parabolic sub-sample refinement".
    fn refine_time(&self, input: &InData, peak_idx: i64, dt: f64) -> f64 {
        let (Ok(y0), Ok(ym1), Ok(yp1)) = (
            input.at(peak_idx),
            input.at(peak_idx - 1),
            input.at(peak_idx + 1),
        ) else {
            return input.pos(peak_idx);
        };
        let denom = ym1 - 2.0 * y0 + yp1;
        let offset = if denom.abs() > f64::EPSILON {
            0.5 * (ym1 - yp1) / denom
        } else {
            0.0
        };
        input.pos(peak_idx) + offset.clamp(-1.0, 1.0) * dt
    }

    /// Approximates the half-amplitude width of the peak at `peak_idx` by
    /// scanning outward until the trace drops below the half-height
    /// level, per spec.md §4.4's optional width test.
    fn half_max_width(&self, input: &InData, peak_idx: i64, dt: f64) -> f64 {
        let half = self.trough_val + (self.peak_val - self.trough_val) / 2.0;
        let mut left = peak_idx;
        while left > input.min_index() && input.at(left).unwrap_or(half) > half {
            left -= 1;
        }
        let mut right = peak_idx;
        let limit = input.size();
        while right < limit && input.at(right).unwrap_or(half) > half {
            right += 1;
        }
        (right - left) as f64 * dt
    }

    /// Decays the adaptive threshold toward `min_thresh` over `elapsed`
    /// seconds with time constant `decay`.
    fn decay_threshold(&mut self, elapsed: f64) {
        if self.decay <= 0.0 {
            self.threshold = self.min_thresh;
            return;
        }
        let factor = (-elapsed / self.decay).exp();
        self.threshold = self.min_thresh + (self.threshold - self.min_thresh) * factor;
    }
}

impl Node for PeakDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn input_ids(&self) -> &[String] {
        &self.input_ids
    }

    /// Drops accumulated peak/trough/threshold state without rewinding
    /// the watermark (`last_index`): a restart marker means "the
    /// discontinuity at this point must not be mistaken for a spike", not
    /// "reprocess everything already seen" (spec.md §8 seed test D).
    fn reset(&mut self) {
        self.trough_val = f64::INFINITY;
        self.peak_val = f64::NEG_INFINITY;
        self.last_spike_time = None;
        self.threshold = self.min_thresh;
        self.initialized = false;
    }
}

impl Detector for PeakDetector {
    fn process(&mut self, input: &InData, to_index: i64, events: &mut EventData) -> FilterResult<()> {
        let dt = input.sample_interval();
        let from = self.last_index.max(input.min_index());
        if from >= to_index {
            return Ok(());
        }
        if !self.initialized {
            if let Ok(v0) = input.at(from) {
                self.trough_val = v0;
                self.peak_val = v0;
                self.trough_idx = from;
                self.peak_idx = from;
            }
            self.initialized = true;
        }

        for i in from..to_index {
            let v = input.at(i)?;
            self.decay_threshold(dt);

            if v > self.peak_val {
                self.peak_val = v;
                self.peak_idx = i;
            }
            if v < self.trough_val {
                self.trough_val = v;
                self.trough_idx = i;
            }

            if self.peak_idx > self.trough_idx {
                let size = self.peak_val - self.trough_val;
                let dropped_back = v <= self.peak_val - self.ratio * size;
                if size >= self.threshold && dropped_back {
                    let time = self.refine_time(input, self.peak_idx, dt);

                    let isi_ok = !self.test_isi
                        || self
                            .last_spike_time
                            .map(|last| time - last >= self.min_isi)
                            .unwrap_or(true);

                    let width = if self.test_width {
                        Some(self.half_max_width(input, self.peak_idx, dt))
                    } else {
                        None
                    };
                    let width_ok = !self.test_width || width.map(|w| w <= self.max_width).unwrap_or(true);

                    if isi_ok && width_ok {
                        events.push(time, Some(size), width);
                        self.last_spike_time = Some(time);
                        self.threshold = (size * self.ratio).clamp(self.min_thresh, self.max_thresh);
                    }

                    // start a fresh search from the confirming sample.
                    self.trough_val = v;
                    self.trough_idx = i;
                    self.peak_val = v;
                    self.peak_idx = i;
                }
            }
        }
        self.last_index = to_index;
        Ok(())
    }
}
