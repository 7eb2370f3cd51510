//! Configuration for the acquisition-and-stimulation core.
//!
//! Loading hierarchy matches the rest of the workspace's ambient stack:
//! defaults < settings file < environment variables, validated after the
//! merge.

mod error;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level engine settings. Surfaces the only environment/CLI knobs
/// spec.md §6 asks the core to expose: where to find the macro file and
/// settings file, where to write save-files, and how hard to poll the
/// DAQ reader thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Path to the macro definition file (spec.md §6 "Macro file format").
    pub macros_file: PathBuf,
    /// Directory into which session save-files are written.
    pub save_files_dir: PathBuf,
    /// Polling interval, in milliseconds, for the DAQ reader thread when a
    /// back-end has no wake-up channel of its own.
    pub poll_interval_ms: u64,
    /// Placeholder string for missing values in table files (spec.md §6).
    pub missing_value: String,
    /// Preserve the original `setSignalTime` rewind behaviour (spec.md §9
    /// Open Question). Off by default.
    pub allow_signal_time_rewind: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            macros_file: PathBuf::from("macros.cfg"),
            save_files_dir: PathBuf::from("data"),
            poll_interval_ms: 1,
            missing_value: "-".to_string(),
            allow_signal_time_rewind: false,
        }
    }
}

impl EngineSettings {
    /// Load settings: defaults, overridden by `path` if it exists,
    /// overridden again by `RELACS_*` environment variables, then
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let mut settings = if path.as_ref().exists() {
            Self::from_file(path.as_ref())?
        } else {
            Self::default()
        };
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RELACS_MACROS_FILE") {
            self.macros_file = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RELACS_SAVE_FILES_DIR") {
            self.save_files_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RELACS_POLL_INTERVAL_MS") {
            if let Ok(ms) = v.parse() {
                self.poll_interval_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("RELACS_MISSING_VALUE") {
            self.missing_value = v;
        }
        if let Ok(v) = std::env::var("RELACS_ALLOW_SIGNAL_TIME_REWIND") {
            self.allow_signal_time_rewind = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.missing_value.is_empty() {
            return Err(ConfigError::Invalid(
                "missing_value must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = EngineSettings::load("/nonexistent/path/relacs.toml").unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relacs.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "poll_interval_ms = 5").unwrap();
        let settings = EngineSettings::load(&path).unwrap();
        assert_eq!(settings.poll_interval_ms, 5);
    }

    #[test]
    fn zero_poll_interval_is_invalid() {
        let mut settings = EngineSettings::default();
        settings.poll_interval_ms = 0;
        assert!(settings.validate().is_err());
    }
}
