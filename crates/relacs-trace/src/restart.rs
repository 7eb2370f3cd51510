/// A (sample-index, wall-time) pair recorded whenever the DAQ clock is
/// re-armed (spec.md §3, "restart marker"). Time queries at or after
/// `index` use `wall_time` as their origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestartMarker {
    pub index: i64,
    pub wall_time: f64,
}

impl RestartMarker {
    pub fn new(index: i64, wall_time: f64) -> Self {
        Self { index, wall_time }
    }
}

/// Finds the restart marker at or immediately before `index`. Markers are
/// kept in non-decreasing index order by the caller (`CyclicBuffer` only
/// ever appends with a monotonic index).
pub(crate) fn marker_at_or_before(markers: &[RestartMarker], index: i64) -> Option<RestartMarker> {
    markers
        .iter()
        .rev()
        .find(|m| m.index <= index)
        .copied()
        .or_else(|| markers.first().copied())
}
