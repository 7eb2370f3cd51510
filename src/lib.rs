//! Facade crate wiring the acquisition engine, session controller, and
//! macro-command interpreter into a single [`EngineContext`] a CLI binary
//! or test harness can drive end-to-end, standing in for the original
//! `RELACSWidget` with its Qt surface removed (spec.md §1 Non-goals: no
//! GUI, no concrete scientific RePros — [`demo_repro::DemoRePro`] is the
//! one generic stand-in RePro needed to exercise the macro engine).

mod context;
mod demo_repro;
mod error;

pub use context::EngineContext;
pub use demo_repro::DemoRePro;
pub use error::{ContextError, ContextResult};

pub use relacs_config::EngineSettings;
pub use relacs_daq::{AnalogInput, AnalogOutput, Attenuator, OutData};
pub use relacs_engine::{AcquisitionEngine, SyncMode};
pub use relacs_macro::{ExecutedCommand, MacroEngine};
pub use relacs_repro::{RePro, ReproHandle, ReproStatus};
pub use relacs_session::{Session, SessionState};
pub use relacs_trace::InData;
