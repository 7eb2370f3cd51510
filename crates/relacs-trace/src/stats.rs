/// Reservoir statistics over a window of samples (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stdev: f64,
    pub count: usize,
}

impl Stats {
    pub fn from_iter(values: impl Iterator<Item = f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut samples = Vec::new();
        for v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
            samples.push(v);
        }
        if count == 0 {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                stdev: 0.0,
                count: 0,
            };
        }
        let mean = sum / count as f64;
        let variance = if count > 1 {
            samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64
        } else {
            0.0
        };
        Self {
            min,
            max,
            mean,
            stdev: variance.sqrt(),
            count,
        }
    }
}

/// A fixed-bin-count histogram of a window of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub low: f64,
    pub high: f64,
    pub bins: Vec<u64>,
}

impl Histogram {
    pub fn from_iter(values: impl Iterator<Item = f64>, bin_count: usize, low: f64, high: f64) -> Self {
        let mut bins = vec![0u64; bin_count.max(1)];
        let span = (high - low).max(f64::EPSILON);
        for v in values {
            if v < low || v > high {
                continue;
            }
            let frac = (v - low) / span;
            let idx = ((frac * bin_count as f64) as usize).min(bin_count - 1);
            bins[idx] += 1;
        }
        Self { low, high, bins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_constant_signal() {
        let stats = Stats::from_iter(std::iter::repeat(2.0).take(100));
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.stdev, 0.0);
        assert_eq!(stats.count, 100);
    }

    #[test]
    fn histogram_counts_all_samples() {
        let hist = Histogram::from_iter([0.1, 0.5, 0.9].into_iter(), 10, 0.0, 1.0);
        assert_eq!(hist.bins.iter().sum::<u64>(), 3);
    }
}
