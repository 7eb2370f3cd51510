//! The acquisition engine: owns the DAQ back-ends, fans raw blocks into
//! the cyclic trace store, and exposes `read`/`write`/`direct_write`/
//! `stop` under the synchronisation and priority policy of spec.md §4.3.

mod engine;
mod error;
mod pipeline;
mod sync;

pub use engine::AcquisitionEngine;
pub use error::{EngineError, EngineResult};
pub use pipeline::{FilterPipeline, NodeInput};
pub use sync::SyncMode;

#[cfg(test)]
mod tests {
    use super::*;
    use relacs_daq::{Calibration, ChannelConfig, OutData, SimulatedAnalogInput, SimulatedAnalogOutput, SimulatedAttenuator};

    fn wired_engine() -> (AcquisitionEngine, usize, usize, usize) {
        let mut engine = AcquisitionEngine::new(SyncMode::NoSync);
        let ai_index = engine.add_analog_input(Box::new(SimulatedAnalogInput::new("sim-ai", 50))).unwrap();
        let ao_index = engine.add_analog_output(Box::new(SimulatedAnalogOutput::new("sim-ao"))).unwrap();
        let mut config = ChannelConfig::new(0, 10_000.0);
        config.calibration = Calibration::identity();
        let trace_index = engine.add_trace(ai_index, config, 2000, "V").unwrap();
        (engine, ai_index, ao_index, trace_index)
    }

    #[test]
    fn read_appends_samples_and_a_restart_marker() {
        let (mut engine, _ai_index, _ao_index, trace_index) = wired_engine();
        let produced = engine.read(0.0).unwrap();
        assert_eq!(produced, 50);
        assert_eq!(engine.trace(trace_index).size(), 50);
        assert_eq!(engine.trace(trace_index).restarts().len(), 2);
    }

    #[test]
    fn write_stamps_signal_time_on_success() {
        let (mut engine, ai_index, ao_index, _trace_index) = wired_engine();
        let mut signal = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![1.0; 100]);
        engine.write(ao_index, &mut signal, &[ai_index], false, 5.0).unwrap();
        assert_eq!(signal.signal_time(), Some(5.0));
    }

    #[test]
    fn priority_signal_preempts_running_nonpriority_one() {
        let (mut engine, ai_index, ao_index, _trace_index) = wired_engine();
        let mut first = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![1.0; 100]);
        engine.write(ao_index, &mut first, &[ai_index], false, 0.0).unwrap();

        let mut second = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![2.0; 100]);
        second.set_priority(true);
        assert!(engine.write(ao_index, &mut second, &[ai_index], false, 1.0).is_ok());
    }

    #[test]
    fn nonpriority_signal_is_rejected_while_priority_signal_runs() {
        let (mut engine, ai_index, ao_index, _trace_index) = wired_engine();
        let mut first = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![1.0; 100]);
        first.set_priority(true);
        engine.write(ao_index, &mut first, &[ai_index], false, 0.0).unwrap();

        let mut second = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![2.0; 100]);
        assert_eq!(engine.write(ao_index, &mut second, &[ai_index], false, 1.0), Err(EngineError::Busy));
    }

    #[test]
    fn counter_sync_rejects_gain_change_mid_run() {
        let mut engine = AcquisitionEngine::new(SyncMode::CounterSync);
        let ai_index = engine.add_analog_input(Box::new(SimulatedAnalogInput::new("sim-ai", 50))).unwrap();
        let ao_index = engine.add_analog_output(Box::new(SimulatedAnalogOutput::new("sim-ao"))).unwrap();
        let mut signal = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![1.0; 10]);
        let result = engine.write(ao_index, &mut signal, &[ai_index], true, 0.0);
        assert_eq!(result, Err(EngineError::InvalidSampleRateUnderCounterSync));
    }

    #[test]
    fn attenuated_channel_is_muted_on_request() {
        let (mut engine, ai_index, ao_index, _trace_index) = wired_engine();
        engine.add_attenuator(0, Box::new(SimulatedAttenuator::new("att0", 0))).unwrap();
        let mut signal = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![1.0; 10]);
        signal.set_mute(true);
        engine.write(ao_index, &mut signal, &[ai_index], false, 0.0).unwrap();
        assert!(signal.mute());
    }

    #[test]
    fn attenuated_channel_clamps_scale_to_one_regardless_of_intensity() {
        let (mut engine, ai_index, ao_index, _trace_index) = wired_engine();
        engine.add_attenuator(0, Box::new(SimulatedAttenuator::new("att0", 0))).unwrap();
        let mut signal = OutData::from_samples(ao_index as u32, 0, 1.0 / 1000.0, vec![1.0; 10]);
        signal.set_intensity(0.5);
        engine.write(ao_index, &mut signal, &[ai_index], false, 0.0).unwrap();
        assert_eq!(signal.scale(), 1.0, "the level belongs to the attenuator, not the digital scale");
    }
}
