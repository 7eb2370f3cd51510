//! The RePro runtime: the [`RePro`] trait and its `pre_config → init →
//! main → save → done` lifecycle, an [`Options`] tree RePros expose as
//! their parameter surface, a [`RunControl`] cancellation/suspension
//! primitive, and [`run_repro`] worker-thread scheduling (spec.md §4.6).

mod control;
mod error;
mod options;
mod repro;
mod runner;

pub use control::RunControl;
pub use error::{ReproError, ReproResult};
pub use options::{OptionValue, Options};
pub use repro::{RePro, ReproHandle, ReproStatus};
pub use runner::{run_repro, RunningRepro};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use relacs_daq::{ChannelConfig, OutData, SimulatedAnalogInput, SimulatedAnalogOutput};
    use relacs_engine::{AcquisitionEngine, SyncMode};

    struct CountToThree {
        options: Options,
        counted: Arc<std::sync::atomic::AtomicU32>,
    }

    impl RePro for CountToThree {
        fn name(&self) -> &str {
            "CountToThree"
        }

        fn options(&self) -> &Options {
            &self.options
        }

        fn options_mut(&mut self) -> &mut Options {
            &mut self.options
        }

        fn main(&mut self, handle: &ReproHandle) -> ReproResult<ReproStatus> {
            for _ in 0..3 {
                if handle.soft_stop_requested() || handle.is_interrupted() {
                    return Ok(ReproStatus::SoftStopped);
                }
                self.counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                handle.sleep(Duration::from_millis(1));
            }
            Ok(ReproStatus::Completed)
        }
    }

    fn test_engine() -> Arc<Mutex<AcquisitionEngine>> {
        let mut engine = AcquisitionEngine::new(SyncMode::NoSync);
        let ai = engine.add_analog_input(Box::new(SimulatedAnalogInput::new("sim-ai", 10))).unwrap();
        engine.add_analog_output(Box::new(SimulatedAnalogOutput::new("sim-ao"))).unwrap();
        engine.add_trace(ai, ChannelConfig::new(0, 10_000.0), 1000, "V").unwrap();
        Arc::new(Mutex::new(engine))
    }

    #[test]
    fn repro_runs_to_completion_on_its_own_thread() {
        let handle = ReproHandle::new(test_engine(), RunControl::new());
        let counted = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let repro = CountToThree {
            options: Options::new(),
            counted: counted.clone(),
        };
        let running = run_repro(repro, handle);
        let status = running.join();
        assert_eq!(status, ReproStatus::Completed);
        assert_eq!(counted.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn interrupting_a_repro_stops_it_before_completion() {
        struct Forever {
            options: Options,
        }
        impl RePro for Forever {
            fn name(&self) -> &str {
                "Forever"
            }
            fn options(&self) -> &Options {
                &self.options
            }
            fn options_mut(&mut self) -> &mut Options {
                &mut self.options
            }
            fn main(&mut self, handle: &ReproHandle) -> ReproResult<ReproStatus> {
                loop {
                    if handle.is_interrupted() {
                        return Ok(ReproStatus::HardStopped);
                    }
                    handle.sleep(Duration::from_millis(5));
                }
            }
        }

        let handle = ReproHandle::new(test_engine(), RunControl::new());
        let running = run_repro(Forever { options: Options::new() }, handle);
        std::thread::sleep(Duration::from_millis(20));
        running.interrupt();
        assert_eq!(running.join(), ReproStatus::HardStopped);
    }

    #[test]
    fn write_through_handle_delegates_to_the_engine() {
        let handle = ReproHandle::new(test_engine(), RunControl::new());
        let mut signal = OutData::from_samples(0, 0, 1.0 / 1000.0, vec![1.0; 10]);
        handle.write(0, &mut signal, &[0], false, 1.0).unwrap();
        assert_eq!(signal.signal_time(), Some(1.0));
    }
}
