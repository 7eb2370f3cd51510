use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use relacs_daq::OutData;
use relacs_engine::AcquisitionEngine;
use relacs_trace::InData;

use crate::control::RunControl;
use crate::error::{ReproError, ReproResult};
use crate::options::Options;

/// How a RePro's `main` ended (spec.md §4.6 lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReproStatus {
    Completed,
    SoftStopped,
    HardStopped,
}

/// What `RePro::main` is given to read traces/events, write stimuli, and
/// cooperate with cancellation (spec.md §4.6: "exposes read-access to
/// traces/events, a write(OutData)... that delegates to the acquisition
/// engine, timing primitives, stop requests").
#[derive(Clone)]
pub struct ReproHandle {
    engine: Arc<Mutex<AcquisitionEngine>>,
    control: RunControl,
}

impl ReproHandle {
    pub fn new(engine: Arc<Mutex<AcquisitionEngine>>, control: RunControl) -> Self {
        Self { engine, control }
    }

    pub fn trace_clone(&self, index: usize) -> InData {
        self.engine.lock().trace(index).clone()
    }

    /// Delegates to [`AcquisitionEngine::write`], returning
    /// [`ReproError::Interrupted`] promptly if a hard-stop arrived while
    /// waiting for the lock (spec.md §5's cancellation-aware requirement
    /// on the `write` family).
    pub fn write(&self, ao_index: usize, signal: &mut OutData, ai_indices: &[usize], gain_changed: bool, wall_time: f64) -> ReproResult<()> {
        if self.control.is_interrupted() {
            return Err(ReproError::Interrupted);
        }
        self.engine.lock().write(ao_index, signal, ai_indices, gain_changed, wall_time).map_err(Into::into)
    }

    pub fn direct_write(&self, ao_index: usize, signal: &mut OutData, wall_time: f64) -> ReproResult<()> {
        if self.control.is_interrupted() {
            return Err(ReproError::Interrupted);
        }
        self.engine.lock().direct_write(ao_index, signal, wall_time).map_err(Into::into)
    }

    pub fn sleep(&self, duration: Duration) -> bool {
        self.control.sleep(duration)
    }

    pub fn sleep_wait<F: FnMut() -> bool>(&self, timeout: Duration, predicate: F) -> bool {
        self.control.sleep_wait(timeout, predicate)
    }

    pub fn is_interrupted(&self) -> bool {
        self.control.is_interrupted()
    }

    pub fn soft_stop_requested(&self) -> bool {
        self.control.soft_stop_requested()
    }

    /// Exposes the underlying [`RunControl`] so a runner can signal
    /// soft/hard stop from outside the worker thread.
    pub fn control_handle(&self) -> RunControl {
        self.control.clone()
    }
}

/// A unit of experimental work with a `main()` that runs on a dedicated
/// worker thread (spec.md §4.6). Lifecycle: `pre_config → init → main →
/// save → done`, driven by [`crate::runner::run_repro`].
pub trait RePro: Send {
    fn name(&self) -> &str;

    fn options(&self) -> &Options;

    fn options_mut(&mut self) -> &mut Options;

    fn pre_config(&mut self, _handle: &ReproHandle) -> ReproResult<()> {
        Ok(())
    }

    fn init(&mut self, _handle: &ReproHandle) -> ReproResult<()> {
        Ok(())
    }

    fn main(&mut self, handle: &ReproHandle) -> ReproResult<ReproStatus>;

    fn save(&mut self, _handle: &ReproHandle) -> ReproResult<()> {
        Ok(())
    }

    /// Called unconditionally after `save`, even on error, for releasing
    /// any resources the RePro itself acquired.
    fn done(&mut self) {}
}
