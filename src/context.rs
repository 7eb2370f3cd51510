use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use relacs_config::EngineSettings;
use relacs_daq::{ChannelConfig, SimulatedAnalogInput, SimulatedAnalogOutput, SimulatedAttenuator};
use relacs_engine::{AcquisitionEngine, SyncMode};
use relacs_macro::{parse_macro_file, ExecutedCommand, MacroEngine};
use relacs_repro::{run_repro, ReproHandle, RunControl};
use relacs_session::Session;
use tracing::info;

use crate::demo_repro::DemoRePro;
use crate::error::{ContextError, ContextResult};

/// Wires an [`AcquisitionEngine`] fitted with one simulated input/output/
/// attenuator triple, a [`Session`], and a [`MacroEngine`] into a single
/// handle a CLI binary or integration test can drive (spec.md §4's
/// modules are independent crates; this is the composition root that
/// corresponds to the original `RELACSWidget` minus its Qt surface).
pub struct EngineContext {
    engine: Arc<Mutex<AcquisitionEngine>>,
    session: Session,
    ai_index: usize,
    trace_index: usize,
}

impl EngineContext {
    /// Builds one simulated AI/AO pair, an attenuator on AO channel 0, and
    /// a single registered trace, using `settings.poll_interval_ms` only
    /// as documentation of the back-end's polling cadence (the simulated
    /// back-end has no real poll loop to configure).
    pub fn bootstrap(_settings: &EngineSettings) -> ContextResult<Self> {
        let mut engine = AcquisitionEngine::new(SyncMode::NoSync);
        let ai_index = engine.add_analog_input(Box::new(SimulatedAnalogInput::new("sim-ai-0", 256)))?;
        let ao_index = engine.add_analog_output(Box::new(SimulatedAnalogOutput::new("sim-ao-0")))?;
        engine.add_attenuator(0, Box::new(SimulatedAttenuator::new("sim-att-0", 0)))?;
        let trace_index = engine.add_trace(ai_index, ChannelConfig::new(0, 10_000.0), 10_000, "V")?;
        info!(ai_index, ao_index, trace_index, "bootstrapped simulated acquisition engine");
        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            session: Session::new(),
            ai_index,
            trace_index,
        })
    }

    pub fn engine(&self) -> Arc<Mutex<AcquisitionEngine>> {
        self.engine.clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn ai_index(&self) -> usize {
        self.ai_index
    }

    pub fn trace_index(&self) -> usize {
        self.trace_index
    }

    /// Reads `path`, loads it into a [`MacroEngine`], starts at macro 0
    /// command 0 (or the `STARTUP` macro if one is flagged), and drives
    /// `advance()` to completion, dispatching each yielded command: RePro
    /// runs synchronously to completion on its own worker thread via
    /// [`run_repro`], session/table commands update `self.session`, and
    /// everything else (shell/message/browse/switch/filter/detector) is
    /// logged — `bootstrap` registers no filter/detector nodes on the
    /// engine's pipeline, and there is no shell or GUI wired into this
    /// demo context (spec.md §1 Non-goals: no plugin RePros, no GUI).
    pub fn run_macro_file(&mut self, path: impl AsRef<Path>) -> ContextResult<Vec<ExecutedCommand>> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(ContextError::Io)?;
        let (macros, warnings) = parse_macro_file(&text)?;
        for warning in &warnings {
            tracing::warn!(%warning, "macro file warning");
        }
        let mut macro_engine = MacroEngine::load(macros)?;
        if !macro_engine.start_up() {
            macro_engine.start_macro(0, 0)?;
        }

        let mut executed = Vec::new();
        while let Some(command) = macro_engine.advance()? {
            self.dispatch(&command);
            executed.push(command);
        }
        Ok(executed)
    }

    fn dispatch(&mut self, command: &ExecutedCommand) {
        match command {
            ExecutedCommand::RunRepro { name, params } => {
                let handle = ReproHandle::new(self.engine.clone(), RunControl::new());
                let repro = DemoRePro::new(name.clone(), params);
                let status = run_repro(repro, handle).join();
                if self.session.state() == relacs_session::SessionState::Running {
                    self.session.record_repro_run();
                }
                info!(name = %name, ?status, "repro finished");
            }
            ExecutedCommand::StartSession => {
                if let Err(err) = self.session.start_the_session() {
                    tracing::warn!(%err, "startsession ignored");
                }
            }
            ExecutedCommand::SaveData => {
                info!("savedata");
            }
            ExecutedCommand::Shell { command } => {
                info!(%command, "shell (not executed in this demo context)");
            }
            ExecutedCommand::Message { text, timeout } => {
                info!(%text, ?timeout, "message");
            }
            ExecutedCommand::Browse { path } => {
                info!(%path, "browse");
            }
            ExecutedCommand::Switch { file } => {
                info!(%file, "switch macro file (not reloaded in this demo context)");
            }
            ExecutedCommand::Filter { name, action } => {
                info!(%name, %action, "filter command");
            }
            ExecutedCommand::Detector { name, action } => {
                info!(%name, %action, "detector command");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_registers_one_trace() {
        let ctx = EngineContext::bootstrap(&EngineSettings::default()).unwrap();
        assert_eq!(ctx.engine().lock().trace_count(), 1);
    }

    #[test]
    fn run_macro_file_drives_repros_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.cfg");
        std::fs::write(&path, "macro M\n  repro Demo duration=0.1\n  savedata\n").unwrap();

        let mut ctx = EngineContext::bootstrap(&EngineSettings::default()).unwrap();
        let executed = ctx.run_macro_file(&path).unwrap();
        assert_eq!(executed.len(), 2);
        assert!(matches!(&executed[0], ExecutedCommand::RunRepro { name, .. } if name == "Demo"));
        assert_eq!(executed[1], ExecutedCommand::SaveData);
    }
}
