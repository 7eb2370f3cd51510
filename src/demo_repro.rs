use std::time::Duration;

use relacs_repro::{Options, RePro, ReproHandle, ReproResult, ReproStatus};

/// A generic RePro standing in for the concrete scientific RePros spec.md
/// §1 excludes as out-of-scope plugins. It reads a `duration` option (in
/// seconds) if the macro command supplied one, sleeps proportionally, and
/// completes — enough to drive a macro file end-to-end without any real
/// hardware or experiment logic.
pub struct DemoRePro {
    name: String,
    options: Options,
}

impl DemoRePro {
    pub fn new(name: impl Into<String>, params: &[(String, String)]) -> Self {
        let mut options = Options::new();
        options.add_number("duration", 0.0, 0.0, 3600.0, 0.01, "s");
        for (key, value) in params {
            if key == "duration" {
                let _ = options.set("duration", value);
            } else {
                options.add_text(key, value.clone());
            }
        }
        Self { name: name.into(), options }
    }
}

impl RePro for DemoRePro {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    fn main(&mut self, handle: &ReproHandle) -> ReproResult<ReproStatus> {
        let seconds = self.options.number("duration").unwrap_or(0.0);
        // Scaled down so a macro file full of "real" durations still
        // drives through the CLI demo in well under a second.
        let demo_millis = (seconds * 10.0).min(50.0) as u64;
        if handle.soft_stop_requested() {
            return Ok(ReproStatus::SoftStopped);
        }
        if !handle.sleep(Duration::from_millis(demo_millis)) {
            return Ok(ReproStatus::HardStopped);
        }
        Ok(ReproStatus::Completed)
    }
}
