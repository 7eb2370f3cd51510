use std::collections::HashMap;

use crate::error::{DaqError, DaqResult};
use crate::traits::{AnalogInput, AnalogOutput, Attenuator};
use relacs_trace::ErrorKind;

type AiFactory = Box<dyn Fn() -> Box<dyn AnalogInput> + Send + Sync>;
type AoFactory = Box<dyn Fn() -> Box<dyn AnalogOutput> + Send + Sync>;
type AttFactory = Box<dyn Fn() -> Box<dyn Attenuator> + Send + Sync>;

/// Maps a device-type tag (e.g. `"sim-ai"`, `"comedi-ai"`) to a factory
/// closure that builds a fresh back-end instance, so the session's device
/// configuration can name back-ends without the engine depending on every
/// driver crate directly (spec.md §4.2 "open-set of back-ends").
#[derive(Default)]
pub struct DeviceRegistry {
    analog_inputs: HashMap<String, AiFactory>,
    analog_outputs: HashMap<String, AoFactory>,
    attenuators: HashMap<String, AttFactory>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_analog_input<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn AnalogInput> + Send + Sync + 'static,
    {
        self.analog_inputs.insert(tag.into(), Box::new(factory));
    }

    pub fn register_analog_output<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn AnalogOutput> + Send + Sync + 'static,
    {
        self.analog_outputs.insert(tag.into(), Box::new(factory));
    }

    pub fn register_attenuator<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Attenuator> + Send + Sync + 'static,
    {
        self.attenuators.insert(tag.into(), Box::new(factory));
    }

    pub fn create_analog_input(&self, tag: &str) -> DaqResult<Box<dyn AnalogInput>> {
        let factory = self
            .analog_inputs
            .get(tag)
            .ok_or_else(|| DaqError::new(ErrorKind::NO_DEVICE, format!("no analog input registered for tag '{tag}'")))?;
        Ok(factory())
    }

    pub fn create_analog_output(&self, tag: &str) -> DaqResult<Box<dyn AnalogOutput>> {
        let factory = self
            .analog_outputs
            .get(tag)
            .ok_or_else(|| DaqError::new(ErrorKind::NO_DEVICE, format!("no analog output registered for tag '{tag}'")))?;
        Ok(factory())
    }

    pub fn create_attenuator(&self, tag: &str) -> DaqResult<Box<dyn Attenuator>> {
        let factory = self
            .attenuators
            .get(tag)
            .ok_or_else(|| DaqError::new(ErrorKind::NO_DEVICE, format!("no attenuator registered for tag '{tag}'")))?;
        Ok(factory())
    }

    pub fn analog_input_tags(&self) -> Vec<&str> {
        self.analog_inputs.keys().map(String::as_str).collect()
    }

    pub fn analog_output_tags(&self) -> Vec<&str> {
        self.analog_outputs.keys().map(String::as_str).collect()
    }

    pub fn attenuator_tags(&self) -> Vec<&str> {
        self.attenuators.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedAnalogInput;

    #[test]
    fn register_and_create_round_trip() {
        let mut registry = DeviceRegistry::new();
        registry.register_analog_input("sim-ai", || Box::new(SimulatedAnalogInput::new("sim0", 64)));
        let ai = registry.create_analog_input("sim-ai").unwrap();
        assert_eq!(ai.device_name(), "sim0");
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let registry = DeviceRegistry::new();
        assert!(registry.create_analog_input("missing").is_err());
    }
}
