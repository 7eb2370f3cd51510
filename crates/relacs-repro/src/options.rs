use crate::error::{ReproError, ReproResult};

/// A single typed option value (spec.md §6 "structured option trees"),
/// reduced from `spikedetector.cc`'s `addNumber`/`addBoolean`/`addInteger`
/// calls to the engine-facing subset: a value plus bounds/format metadata
/// that a GUI dialog (out of scope here) would bind to, but that this
/// crate never interprets beyond carrying it.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Number {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
        unit: String,
    },
    Integer {
        value: i64,
        min: i64,
        max: i64,
    },
    Boolean(bool),
    Text(String),
}

impl OptionValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Number { value, .. } => Some(*value),
            OptionValue::Integer { value, .. } => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// An ordered name → value option tree, the parameter surface RePros
/// expose and Macros bind into via `expandParameter` (spec.md §4.6/§4.7).
#[derive(Debug, Clone, Default)]
pub struct Options {
    entries: Vec<(String, OptionValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_number(&mut self, name: impl Into<String>, value: f64, min: f64, max: f64, step: f64, unit: impl Into<String>) {
        self.entries.push((
            name.into(),
            OptionValue::Number {
                value,
                min,
                max,
                step,
                unit: unit.into(),
            },
        ));
    }

    pub fn add_integer(&mut self, name: impl Into<String>, value: i64, min: i64, max: i64) {
        self.entries.push((name.into(), OptionValue::Integer { value, min, max }));
    }

    pub fn add_boolean(&mut self, name: impl Into<String>, value: bool) {
        self.entries.push((name.into(), OptionValue::Boolean(value)));
    }

    pub fn add_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), OptionValue::Text(value.into())));
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn number(&self, name: &str) -> ReproResult<f64> {
        self.get(name)
            .ok_or_else(|| ReproError::UnknownOption(name.to_string()))?
            .as_f64()
            .ok_or_else(|| ReproError::WrongType(name.to_string(), "number"))
    }

    pub fn boolean(&self, name: &str) -> ReproResult<bool> {
        self.get(name)
            .ok_or_else(|| ReproError::UnknownOption(name.to_string()))?
            .as_bool()
            .ok_or_else(|| ReproError::WrongType(name.to_string(), "boolean"))
    }

    pub fn text(&self, name: &str) -> ReproResult<&str> {
        self.get(name)
            .ok_or_else(|| ReproError::UnknownOption(name.to_string()))?
            .as_str()
            .ok_or_else(|| ReproError::WrongType(name.to_string(), "text"))
    }

    /// Sets an existing option's value in place, clamping numeric values to
    /// their declared `[min, max]` (spec.md §6). Used by the macro engine's
    /// `expandParameter` to bind a run's parameter string onto a RePro's
    /// options before `main` runs.
    pub fn set(&mut self, name: &str, raw: &str) -> ReproResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| ReproError::UnknownOption(name.to_string()))?;
        match &mut entry.1 {
            OptionValue::Number { value, min, max, .. } => {
                let parsed: f64 = raw.parse().map_err(|_| ReproError::WrongType(name.to_string(), "number"))?;
                *value = parsed.clamp(*min, *max);
            }
            OptionValue::Integer { value, min, max } => {
                let parsed: i64 = raw.parse().map_err(|_| ReproError::WrongType(name.to_string(), "integer"))?;
                *value = parsed.clamp(*min, *max);
            }
            OptionValue::Boolean(value) => {
                *value = matches!(raw, "true" | "1" | "yes");
            }
            OptionValue::Text(value) => {
                *value = raw.to_string();
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, OptionValue)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_numbers_to_bounds() {
        let mut options = Options::new();
        options.add_number("threshold", 10.0, 0.0, 100.0, 0.5, "mV");
        options.set("threshold", "500").unwrap();
        assert_eq!(options.number("threshold").unwrap(), 100.0);
    }

    #[test]
    fn unknown_option_is_an_error() {
        let options = Options::new();
        assert!(options.number("missing").is_err());
    }

    #[test]
    fn boolean_round_trip() {
        let mut options = Options::new();
        options.add_boolean("testwidth", false);
        options.set("testwidth", "true").unwrap();
        assert!(options.boolean("testwidth").unwrap());
    }
}
