use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use relacs_daq::{AnalogInput, AnalogOutput, Attenuator, ChannelConfig, OutData, OutDataState};
use relacs_filter::{Detector, Filter, FilterEvents};
use relacs_trace::{ErrorKind, EventData, InData};

use crate::error::{EngineError, EngineResult};
use crate::pipeline::{FilterPipeline, NodeInput};
use crate::sync::SyncMode;

struct AiSlot {
    device: Box<dyn AnalogInput>,
    configs: Vec<ChannelConfig>,
    trace_indices: Vec<usize>,
}

struct RunningOutput {
    priority: bool,
    ao_index: usize,
}

/// Owns the DAQ back-ends and the cyclic trace store, enforces the
/// synchronisation and priority policy, and exposes the
/// `read`/`write`/`direct_write`/`stop` surface the rest of the system
/// consumes (spec.md §4.3).
///
/// The reader/writer lock on `traces` and the single `writer_lock` mutex
/// mirror the shared-resource policy of spec.md §5: many RePro threads may
/// read concurrently, only the DAQ reader (here, `read`) writes, and all
/// output operations (`write`/`direct_write`/`stop`) serialise through one
/// mutex.
pub struct AcquisitionEngine {
    ai_slots: Vec<AiSlot>,
    ao_devices: Vec<Box<dyn AnalogOutput>>,
    attenuators: HashMap<u32, Box<dyn Attenuator>>,
    traces: RwLock<Vec<InData>>,
    writer_lock: Mutex<Option<RunningOutput>>,
    sync_mode: SyncMode,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    filter_pipeline: FilterPipeline,
}

impl AcquisitionEngine {
    pub fn new(sync_mode: SyncMode) -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        Self {
            ai_slots: Vec::new(),
            ao_devices: Vec::new(),
            attenuators: HashMap::new(),
            traces: RwLock::new(Vec::new()),
            writer_lock: Mutex::new(None),
            sync_mode,
            wake_tx,
            wake_rx,
            filter_pipeline: FilterPipeline::new(),
        }
    }

    /// A receiver the DAQ reader thread can block on between `read` calls,
    /// standing in for the back-end's data-available semaphore (spec.md
    /// §5).
    pub fn wake_receiver(&self) -> Receiver<()> {
        self.wake_rx.clone()
    }

    /// Adds and opens an AI back-end, returning its slot index.
    pub fn add_analog_input(&mut self, mut device: Box<dyn AnalogInput>) -> EngineResult<usize> {
        device.open()?;
        self.ai_slots.push(AiSlot {
            device,
            configs: Vec::new(),
            trace_indices: Vec::new(),
        });
        Ok(self.ai_slots.len() - 1)
    }

    /// Adds and opens an AO back-end, returning its slot index.
    pub fn add_analog_output(&mut self, mut device: Box<dyn AnalogOutput>) -> EngineResult<usize> {
        device.open()?;
        self.ao_devices.push(device);
        Ok(self.ao_devices.len() - 1)
    }

    /// Adds and opens an attenuator wired to `ao_channel`.
    pub fn add_attenuator(&mut self, ao_channel: u32, mut attenuator: Box<dyn Attenuator>) -> EngineResult<()> {
        attenuator
            .open()
            .map_err(|_| EngineError::Kind(ErrorKind::ATTENUATOR_ERROR))?;
        self.attenuators.insert(ao_channel, attenuator);
        Ok(())
    }

    /// Registers a trace backed by `ai_index`'s channel `config`, creating
    /// its cyclic store entry. Returns the trace's index for later `read`
    /// calls.
    pub fn add_trace(&mut self, ai_index: usize, config: ChannelConfig, capacity: usize, unit: impl Into<String>) -> EngineResult<usize> {
        let slot = self
            .ai_slots
            .get_mut(ai_index)
            .ok_or_else(|| EngineError::Kind(ErrorKind::NO_DEVICE))?;
        let trace = InData::new(capacity, 1.0 / config.sample_rate, 0.0, config.channel_id, ai_index as u32, unit);
        let mut traces = self.traces.write();
        traces.push(trace);
        let trace_index = traces.len() - 1;
        drop(traces);
        slot.trace_indices.push(trace_index);
        slot.configs.push(config);
        Ok(trace_index)
    }

    pub fn trace(&self, index: usize) -> parking_lot::MappedRwLockReadGuard<'_, InData> {
        parking_lot::RwLockReadGuard::map(self.traces.read(), |traces| &traces[index])
    }

    pub fn trace_count(&self) -> usize {
        self.traces.read().len()
    }

    /// Whether the attenuator wired to `channel_id` is currently muted, if
    /// one is attached (spec.md §8 seed test C).
    pub fn attenuator_muted(&self, channel_id: u32) -> Option<bool> {
        self.attenuators.get(&channel_id).map(|a| a.is_muted())
    }

    /// Registers a trace→trace filter node against the pipeline driven by
    /// every `read()` (spec.md §4.4).
    pub fn add_filter(
        &mut self,
        id: impl Into<String>,
        input: NodeInput,
        capacity: usize,
        sample_interval: f64,
        unit: impl Into<String>,
        filter: Box<dyn Filter>,
    ) -> EngineResult<()> {
        self.filter_pipeline.add_filter(id, input, capacity, sample_interval, unit, filter)
    }

    /// Registers a trace→event detector node (spec.md §4.4).
    pub fn add_detector(
        &mut self,
        id: impl Into<String>,
        input: NodeInput,
        size_unit: impl Into<String>,
        mean_ratio: f64,
        detector: Box<dyn Detector>,
    ) -> EngineResult<()> {
        self.filter_pipeline.add_detector(id, input, size_unit, mean_ratio, detector)
    }

    /// Registers an event→event node chained off a detector's output
    /// (spec.md §4.4).
    pub fn add_filter_events(
        &mut self,
        id: impl Into<String>,
        input: NodeInput,
        size_unit: impl Into<String>,
        mean_ratio: f64,
        node: Box<dyn FilterEvents>,
    ) -> EngineResult<()> {
        self.filter_pipeline.add_filter_events(id, input, size_unit, mean_ratio, node)
    }

    pub fn filter_events(&self, id: &str) -> Option<&EventData> {
        self.filter_pipeline.events(id)
    }

    pub fn filter_trace(&self, id: &str) -> Option<&InData> {
        self.filter_pipeline.trace(id)
    }

    /// `read(InList)`: arms every AI, appends a restart marker to each of
    /// its traces before the new arming's first sample (spec.md §5
    /// ordering guarantee (a)), and drains whatever the back-end has
    /// ready. `wall_time` stands in for the caller's clock read at arming
    /// time.
    pub fn read(&mut self, wall_time: f64) -> EngineResult<usize> {
        let mut total = 0;
        let mut restarted_traces = Vec::new();
        for slot in &mut self.ai_slots {
            if slot.configs.is_empty() {
                continue;
            }
            slot.device.test_read(&slot.configs)?;
            slot.device.prepare_read(&slot.configs)?;
            slot.device.start_read()?;

            {
                let mut traces = self.traces.write();
                for &idx in &slot.trace_indices {
                    traces[idx].restart(wall_time);
                    restarted_traces.push(idx);
                }
            }

            let mut traces = self.traces.write();
            let mut subset: Vec<InData> = slot.trace_indices.iter().map(|&i| traces[i].clone()).collect();
            let n = slot.device.read_data(&mut subset)?;
            for (dst_idx, produced) in slot.trace_indices.iter().zip(subset) {
                traces[*dst_idx] = produced;
            }
            total += n;
        }

        {
            let traces = self.traces.read();
            self.filter_pipeline.drive(&traces, &restarted_traces)?;
        }

        let _ = self.wake_tx.try_send(());
        Ok(total)
    }

    /// `write(OutData)`: runs attenuation, then `testWrite → prepareWrite`,
    /// re-arming affected AIs first when a restart is required (spec.md
    /// §4.3). `gain_changed` is set by the caller when it reprogrammed any
    /// of `ai_indices`' channel range/reference/sample-rate since the last
    /// arming. Under [`SyncMode::CounterSync`] a gain change mid-run cannot
    /// be silently re-armed — the hardware counter has no notion of
    /// restart — so this returns
    /// [`EngineError::InvalidSampleRateUnderCounterSync`] instead (open
    /// question resolution, see `DESIGN.md`).
    pub fn write(
        &mut self,
        ao_index: usize,
        signal: &mut OutData,
        ai_indices: &[usize],
        gain_changed: bool,
        wall_time: f64,
    ) -> EngineResult<()> {
        let mut guard = self.writer_lock.lock();
        if let Some(running) = guard.as_ref() {
            if !signal.priority() && running.priority {
                return Err(EngineError::Busy);
            }
            if signal.priority() && !running.priority && running.ao_index < self.ao_devices.len() {
                self.ao_devices[running.ao_index].stop()?;
            }
        }

        if signal.intensity() == Some(relacs_daq::MUTE_INTENSITY) {
            signal.set_mute(true);
        }

        if let Some(attenuator) = self.attenuators.get_mut(&signal.channel_id()) {
            if signal.mute() {
                attenuator.mute().map_err(|_| EngineError::Kind(ErrorKind::ATTENUATOR_ERROR))?;
            } else if let Some(intensity) = signal.intensity() {
                match attenuator.attenuate(intensity, signal.carrier_frequency().unwrap_or(0.0)) {
                    // the attenuator, not the digital scale, carries the
                    // requested level; the scale stays at full output.
                    Ok(_) => signal.set_scale(1.0),
                    Err(_) => signal.set_error(ErrorKind::ATTENUATOR_ERROR, "attenuation failed"),
                }
            }
        } else if !signal.mute() {
            // no attenuator on this channel: fold the level into the
            // digital scale instead (spec.md §4.2).
            if let Some(intensity) = signal.intensity() {
                signal.set_scale(intensity);
            }
        }

        let ao = self
            .ao_devices
            .get_mut(ao_index)
            .ok_or(EngineError::Kind(ErrorKind::NO_DEVICE))?;
        let mut signals = [signal.clone()];
        ao.test_write(&mut signals)?;
        *signal = signals.into_iter().next().unwrap();
        if signal.has_errors() {
            signal.set_state(OutDataState::Tested);
            return Ok(());
        }

        let needs_restart = match self.sync_mode {
            SyncMode::NoSync | SyncMode::StartSync => true,
            SyncMode::AISync => false,
            SyncMode::CounterSync => {
                if gain_changed {
                    return Err(EngineError::InvalidSampleRateUnderCounterSync);
                }
                false
            }
        };

        ao.prepare_write(std::slice::from_ref(signal))?;
        signal.set_state(OutDataState::Prepared);

        if needs_restart {
            for &ai_index in ai_indices {
                if let Some(slot) = self.ai_slots.get_mut(ai_index) {
                    if !slot.configs.is_empty() {
                        slot.device.prepare_read(&slot.configs)?;
                        slot.device.start_read()?;
                        let mut traces = self.traces.write();
                        for &idx in &slot.trace_indices {
                            traces[idx].restart(wall_time);
                        }
                    }
                }
            }
        }

        ao.start_write(std::slice::from_ref(signal))?;
        signal.set_signal_time(wall_time);
        signal.set_state(OutDataState::Running);

        {
            let mut traces = self.traces.write();
            for &ai_index in ai_indices {
                if let Some(slot) = self.ai_slots.get(ai_index) {
                    for &idx in &slot.trace_indices {
                        traces[idx].set_signal(wall_time);
                    }
                }
            }
        }

        *guard = Some(RunningOutput {
            priority: signal.priority(),
            ao_index,
        });
        Ok(())
    }

    /// `directWrite`: one-shot waveform delivered immediately, bypassing
    /// FIFO streaming, but still running the attenuator and restart
    /// bookkeeping (spec.md §4.3).
    pub fn direct_write(&mut self, ao_index: usize, signal: &mut OutData, wall_time: f64) -> EngineResult<()> {
        let _guard = self.writer_lock.lock();
        if let Some(attenuator) = self.attenuators.get_mut(&signal.channel_id()) {
            if let Some(intensity) = signal.intensity() {
                if attenuator.attenuate(intensity, signal.carrier_frequency().unwrap_or(0.0)).is_ok() {
                    signal.set_scale(1.0);
                }
            }
        }
        let ao = self
            .ao_devices
            .get_mut(ao_index)
            .ok_or(EngineError::Kind(ErrorKind::NO_DEVICE))?;
        ao.direct_write(signal)?;
        signal.set_signal_time(wall_time);
        signal.set_state(OutDataState::Done);
        Ok(())
    }

    /// Idempotent: cancels output, drains the AI command queue, and
    /// releases the writer lock (spec.md §4.3).
    pub fn stop(&mut self) -> EngineResult<()> {
        for ao in &mut self.ao_devices {
            ao.stop()?;
        }
        for slot in &mut self.ai_slots {
            slot.device.stop()?;
        }
        *self.writer_lock.lock() = None;
        Ok(())
    }
}
