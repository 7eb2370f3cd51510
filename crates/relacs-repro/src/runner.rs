use std::thread::{self, JoinHandle};

use crate::control::RunControl;
use crate::repro::{RePro, ReproHandle, ReproStatus};

/// A handle to a RePro running on its own worker thread (spec.md §5:
/// "the currently running RePro" is a distinguished thread). Dropping this
/// without calling [`RunningRepro::join`] leaves the worker thread
/// detached; callers normally `soft_stop`/`interrupt` then `join`.
pub struct RunningRepro {
    control: RunControl,
    join: JoinHandle<ReproStatus>,
}

impl RunningRepro {
    pub fn soft_stop(&self) {
        self.control.request_soft_stop();
    }

    pub fn interrupt(&self) {
        self.control.interrupt();
    }

    /// Blocks until `main`/`save`/`done` have all run, returning the
    /// terminal status.
    pub fn join(self) -> ReproStatus {
        self.join.join().unwrap_or(ReproStatus::HardStopped)
    }
}

/// Runs `repro` on a dedicated thread through its full lifecycle
/// (spec.md §4.6: `preConfig → init → main → save → done`). `done` always
/// runs, even if an earlier stage errored, mirroring the "between-RePro
/// hand-off" guarantee that stimulus output is always cleaned up.
pub fn run_repro<R>(mut repro: R, handle: ReproHandle) -> RunningRepro
where
    R: RePro + 'static,
{
    let control = handle_control(&handle);
    let join = thread::spawn(move || {
        let status = (|| -> ReproStatus {
            if repro.pre_config(&handle).is_err() {
                return ReproStatus::HardStopped;
            }
            if repro.init(&handle).is_err() {
                return ReproStatus::HardStopped;
            }
            match repro.main(&handle) {
                Ok(status) => status,
                Err(_) if handle.is_interrupted() => ReproStatus::HardStopped,
                Err(_) => ReproStatus::SoftStopped,
            }
        })();
        let _ = repro.save(&handle);
        repro.done();
        status
    });
    RunningRepro { control, join }
}

fn handle_control(handle: &ReproHandle) -> RunControl {
    handle.control_handle()
}
