use relacs_trace::{EventData, InData};

use crate::error::FilterResult;

/// Shared identity every pipeline node declares (spec.md §4.4).
pub trait Node {
    fn id(&self) -> &str;

    fn input_ids(&self) -> &[String];

    /// Called when any input this node depends on reports a restart
    /// marker. Implementations must drop internal state derived from
    /// samples before the restart (spec.md §4.4 "on a restart marker it
    /// resets its internal state").
    fn reset(&mut self);
}

/// A trace → trace node (e.g. a bandpass or notch filter).
///
/// `process` must be idempotent: calling it again with a `to_index` it
/// has already consumed must not re-append anything (spec.md §4.4
/// incremental contract). Implementations track their own watermark.
pub trait Filter: Node {
    fn process(&mut self, input: &InData, to_index: i64, output: &mut InData) -> FilterResult<()>;
}

/// A trace → event-stream node (e.g. the built-in peak detector).
pub trait Detector: Node {
    fn process(&mut self, input: &InData, to_index: i64, events: &mut EventData) -> FilterResult<()>;
}

/// An event-stream → event-stream node (e.g. a burst detector running on
/// top of a spike detector's output).
pub trait FilterEvents: Node {
    fn process(&mut self, input: &EventData, to_index: usize, output: &mut EventData) -> FilterResult<()>;
}
