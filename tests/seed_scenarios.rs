//! Cross-crate integration tests for the concrete seed scenarios (spec.md
//! §8 "Concrete scenarios"). Scenario A is covered at the unit level in
//! `relacs-trace` (`single_channel_acquisition`); the rest cross
//! `relacs-daq`/`relacs-engine`/`relacs-trace`/`relacs-filter`/
//! `relacs-macro` boundaries and so belong here.

use relacs_daq::{ChannelConfig, OutData, SimulatedAnalogInput, SimulatedAnalogOutput, SimulatedAttenuator, MUTE_INTENSITY};
use relacs_engine::{AcquisitionEngine, SyncMode};
use relacs_filter::{Detector, Node, PeakDetector};
use relacs_macro::{parse_macro_file, ExecutedCommand, MacroEngine};
use relacs_trace::{EventData, InData};

fn engine_with_one_channel() -> (AcquisitionEngine, usize, usize) {
    let mut engine = AcquisitionEngine::new(SyncMode::NoSync);
    let ai = engine.add_analog_input(Box::new(SimulatedAnalogInput::new("sim-ai", 50))).unwrap();
    let ao = engine.add_analog_output(Box::new(SimulatedAnalogOutput::new("sim-ao"))).unwrap();
    engine.add_trace(ai, ChannelConfig::new(0, 10_000.0), 1000, "V").unwrap();
    (engine, ai, ao)
}

/// (B) Stimulus hand-off: arm a 0.1 s / 10 kHz signal with a 500 Hz
/// carrier, write it at t=1.0, expect `signalTime() >= 1.0`.
#[test]
fn scenario_b_stimulus_hand_off() {
    let (mut engine, _ai, ao) = engine_with_one_channel();
    engine.add_attenuator(0, Box::new(SimulatedAttenuator::new("att", 0))).unwrap();

    let sample_interval = 1.0 / 10_000.0;
    let samples = vec![1.0; (0.1 / sample_interval) as usize];
    let mut signal = OutData::from_samples(0, 0, sample_interval, samples);
    signal.set_carrier_frequency(500.0);
    signal.set_intensity(1.0);

    engine.write(ao, &mut signal, &[], false, 1.0).unwrap();

    assert!(signal.signal_time().unwrap() >= 1.0);
    assert_eq!(signal.carrier_frequency(), Some(500.0));
    assert!((signal.duration() - 0.1).abs() < 1e-9);
}

/// (C) Attenuator mute on zero/mute intensity: `intensity == MuteIntensity`
/// results in `Attenuator::mute()` being called and the signal scale
/// being set to 0.
#[test]
fn scenario_c_attenuator_mute_on_mute_intensity() {
    let (mut engine, _ai, ao) = engine_with_one_channel();
    engine.add_attenuator(0, Box::new(SimulatedAttenuator::new("att", 0))).unwrap();

    let sample_interval = 1.0 / 10_000.0;
    let mut signal = OutData::from_samples(0, 0, sample_interval, vec![1.0; 100]);
    signal.set_intensity(MUTE_INTENSITY);

    engine.write(ao, &mut signal, &[], false, 0.0).unwrap();

    assert_eq!(engine.attenuator_muted(0), Some(true));
    assert_eq!(signal.scale(), 0.0);
}

/// (D) Detector restart: push 1 s of trace, restart at 0.5 s, push
/// another 0.5 s; no event may straddle the restart boundary. A dip right
/// before the boundary followed by a rise right after it would, without a
/// restart-triggered reset, be read as one large spike spanning 0.5s; the
/// reset must prevent that and still let a genuine post-restart spike
/// register normally.
#[test]
fn scenario_d_detector_restart_does_not_straddle() {
    let dt = 1.0 / 10_000.0;
    let mut trace = InData::new(10_000, dt, 0.0, 0, 0, "mV");

    for _ in 0..4990 {
        trace.push(0.0);
    }
    // A dip to -20 that fully recovers to baseline before the boundary.
    for frac in [0.2, 0.4, 0.6, 0.8, 1.0, 0.8, 0.6, 0.4, 0.2, 0.0] {
        trace.push(-20.0 * frac);
    }
    assert_eq!(trace.size(), 5000);

    let mut detector = PeakDetector::new("spikes", "raw").with_threshold_bounds(5.0, 100.0);
    let mut events = EventData::new("mV", 0.1);
    detector.process(&trace, trace.size(), &mut events).unwrap();
    assert!(events.is_empty(), "the recovered dip alone must not fire before the restart");

    trace.restart(0.5);
    detector.reset();

    for _ in 0..100 {
        trace.push(0.0);
    }
    // A clean, isolated spike well clear of the boundary.
    for frac in [0.2, 0.4, 0.6, 0.8, 1.0, 0.8, 0.6, 0.4, 0.2, 0.0] {
        trace.push(20.0 * frac);
    }
    for _ in 0..4890 {
        trace.push(0.0);
    }
    assert_eq!(trace.size(), 10_000);

    detector.process(&trace, trace.size(), &mut events).unwrap();

    assert_eq!(events.len(), 1, "only the isolated post-restart spike should fire");
    let time = events.times()[0];
    assert!(time > 0.5 + 10.0 * dt, "event at {time} is too close to the restart boundary at 0.5s");
}

/// (E) Macro variables: a macro declaring `duration=0.2s; repeats=3`
/// invoked with `duration=0.5s` yields the first command seeing
/// `duration=0.5s; repeats=3`.
#[test]
fn scenario_e_macro_variable_override() {
    let text = "macro Caller\n  macro Sweep duration=0.5s\nmacro Sweep duration=0.2s;repeats=3\n  repro Sweeper dur=$duration;reps=$repeats\n";
    let (macros, warnings) = parse_macro_file(text).unwrap();
    assert!(warnings.is_empty());

    let sweep_idx_before_load = macros.iter().position(|m| m.name == "Sweep").unwrap();
    assert_eq!(
        macros[sweep_idx_before_load].variables.iter().find(|(k, _)| k == "duration").unwrap().1,
        "0.2s",
        "the callee's own declared default is untouched by the invocation"
    );

    let mut engine = MacroEngine::load(macros).unwrap();
    let idx = engine.index("Caller").unwrap();
    engine.start_macro(idx, 0).unwrap();

    let executed = engine.advance().unwrap().unwrap();
    match executed {
        ExecutedCommand::RunRepro { params, .. } => {
            assert_eq!(params.iter().find(|(k, _)| k == "dur").unwrap().1, "0.5s");
            assert_eq!(params.iter().find(|(k, _)| k == "reps").unwrap().1, "3");
        }
        other => panic!("unexpected {other:?}"),
    }
}

/// (F) RangeLoop sequence: `AlternateOutUp` over 5 elements, starting at
/// the centre, yields `2, 3, 1, 4, 0` on both the first and second
/// repetition.
#[test]
fn scenario_f_rangeloop_alternate_out_up_from_centre() {
    use relacs_trace::{RangeLoop, Sequence};

    let mut range = RangeLoop::from_values([0.0, 1.0, 2.0, 3.0, 4.0])
        .with_sequence(Sequence::AlternateOutUp)
        .with_repeats(2, 1, 1);
    range.reset(2, true);

    let mut first_pass = Vec::new();
    for _ in 0..5 {
        first_pass.push(range.pos().unwrap());
        range.advance();
    }
    assert_eq!(first_pass, vec![2, 3, 1, 4, 0]);

    let mut second_pass = Vec::new();
    for _ in 0..5 {
        second_pass.push(range.pos().unwrap());
        range.advance();
    }
    assert_eq!(second_pass, vec![2, 3, 1, 4, 0]);
}
