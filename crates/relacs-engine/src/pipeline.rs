use std::collections::{HashMap, HashSet};

use relacs_filter::{Detector, Filter, FilterEvents, Node, NodeSpec, Pipeline};
use relacs_trace::{EventData, InData};

use crate::error::EngineResult;

/// Where a filter-pipeline node reads its input from: a raw acquisition
/// trace, or another configured node's own output (spec.md §4.4 node
/// chaining).
pub enum NodeInput {
    Trace(usize),
    Node(String),
}

impl NodeInput {
    fn source_id(&self) -> String {
        match self {
            NodeInput::Trace(idx) => format!("trace:{idx}"),
            NodeInput::Node(id) => id.clone(),
        }
    }
}

enum PipelineNode {
    Filter(Box<dyn Filter>),
    Detector(Box<dyn Detector>),
    Events(Box<dyn FilterEvents>),
}

impl PipelineNode {
    fn reset(&mut self) {
        match self {
            PipelineNode::Filter(f) => f.reset(),
            PipelineNode::Detector(d) => d.reset(),
            PipelineNode::Events(e) => e.reset(),
        }
    }
}

enum NodeOutput {
    Trace(InData),
    Events(EventData),
}

/// The engine's filter/detector pipeline: registered [`Filter`]/
/// [`Detector`]/[`FilterEvents`] nodes, topologically ordered by their
/// declared inputs and driven once per successful `read()` (spec.md
/// §4.4: the engine sorts the configured nodes on their dependencies and
/// calls `process(from_index, to_index)` on each as new samples arrive).
#[derive(Default)]
pub struct FilterPipeline {
    specs: Vec<NodeSpec>,
    order: Vec<String>,
    inputs: HashMap<String, String>,
    nodes: HashMap<String, PipelineNode>,
    outputs: HashMap<String, NodeOutput>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, id: String, input: NodeInput, node: PipelineNode, output: NodeOutput) -> EngineResult<()> {
        let source_id = input.source_id();
        self.specs.push(NodeSpec::new(id.clone(), [source_id.clone()]));
        let pipeline = Pipeline::build(&self.specs)?;
        self.order = pipeline.order().to_vec();
        self.inputs.insert(id.clone(), source_id);
        self.nodes.insert(id.clone(), node);
        self.outputs.insert(id, output);
        Ok(())
    }

    /// Registers a trace→trace node. `capacity`/`sample_interval`/`unit`
    /// seed the node's own output trace the way [`AcquisitionEngine::
    /// add_trace`](crate::AcquisitionEngine::add_trace) seeds a raw one.
    pub fn add_filter(
        &mut self,
        id: impl Into<String>,
        input: NodeInput,
        capacity: usize,
        sample_interval: f64,
        unit: impl Into<String>,
        filter: Box<dyn Filter>,
    ) -> EngineResult<()> {
        let id = id.into();
        let output = InData::new(capacity, sample_interval, 0.0, 0, 0, unit);
        self.register(id, input, PipelineNode::Filter(filter), NodeOutput::Trace(output))
    }

    /// Registers a trace→event node (the built-in [`relacs_filter::
    /// PeakDetector`] or a custom one).
    pub fn add_detector(
        &mut self,
        id: impl Into<String>,
        input: NodeInput,
        size_unit: impl Into<String>,
        mean_ratio: f64,
        detector: Box<dyn Detector>,
    ) -> EngineResult<()> {
        let id = id.into();
        let output = EventData::new(size_unit, mean_ratio);
        self.register(id, input, PipelineNode::Detector(detector), NodeOutput::Events(output))
    }

    /// Registers an event→event node chained off a detector's output.
    pub fn add_filter_events(
        &mut self,
        id: impl Into<String>,
        input: NodeInput,
        size_unit: impl Into<String>,
        mean_ratio: f64,
        node: Box<dyn FilterEvents>,
    ) -> EngineResult<()> {
        let id = id.into();
        let output = EventData::new(size_unit, mean_ratio);
        self.register(id, input, PipelineNode::Events(node), NodeOutput::Events(output))
    }

    pub fn events(&self, id: &str) -> Option<&EventData> {
        match self.outputs.get(id) {
            Some(NodeOutput::Events(e)) => Some(e),
            _ => None,
        }
    }

    pub fn trace(&self, id: &str) -> Option<&InData> {
        match self.outputs.get(id) {
            Some(NodeOutput::Trace(t)) => Some(t),
            _ => None,
        }
    }

    fn run_trace_source(node: &mut PipelineNode, input: &InData, output: &mut NodeOutput) -> EngineResult<()> {
        match (node, output) {
            (PipelineNode::Filter(f), NodeOutput::Trace(out)) => Ok(f.process(input, input.size(), out)?),
            (PipelineNode::Detector(d), NodeOutput::Events(out)) => Ok(d.process(input, input.size(), out)?),
            _ => unreachable!("node/output kinds are paired at registration"),
        }
    }

    fn run_events_source(node: &mut PipelineNode, input: &EventData, output: &mut NodeOutput) -> EngineResult<()> {
        match (node, output) {
            (PipelineNode::Events(e), NodeOutput::Events(out)) => Ok(e.process(input, input.len(), out)?),
            _ => unreachable!("node/output kinds are paired at registration"),
        }
    }

    /// Runs every registered node in dependency order against the
    /// current `traces`. A node whose input is one of `restarted_traces`
    /// is reset before running, and that reset propagates to whatever
    /// is chained off it, matching the `Node::reset` contract ("on a
    /// restart marker it resets its internal state").
    pub fn drive(&mut self, traces: &[InData], restarted_traces: &[usize]) -> EngineResult<()> {
        let mut restarted_sources: HashSet<String> =
            restarted_traces.iter().map(|idx| format!("trace:{idx}")).collect();

        for id in self.order.clone() {
            let input_id = self.inputs[&id].clone();

            if restarted_sources.contains(&input_id) {
                self.nodes.get_mut(&id).unwrap().reset();
                restarted_sources.insert(id.clone());
            }

            let mut output = self.outputs.remove(&id).expect("every registered node has an output slot");

            let result = if let Some(idx_str) = input_id.strip_prefix("trace:") {
                let idx: usize = idx_str.parse().expect("trace source ids are numeric");
                let node = self.nodes.get_mut(&id).unwrap();
                Self::run_trace_source(node, &traces[idx], &mut output)
            } else {
                match self.outputs.get(&input_id) {
                    Some(NodeOutput::Trace(input_trace)) => {
                        let input_trace = input_trace.clone();
                        let node = self.nodes.get_mut(&id).unwrap();
                        Self::run_trace_source(node, &input_trace, &mut output)
                    }
                    Some(NodeOutput::Events(input_events)) => {
                        let input_events = input_events.clone();
                        let node = self.nodes.get_mut(&id).unwrap();
                        Self::run_events_source(node, &input_events, &mut output)
                    }
                    None => Ok(()),
                }
            };

            self.outputs.insert(id, output);
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relacs_filter::PeakDetector;

    fn pushed_trace(capacity: usize, dt: f64, values: &[f64]) -> InData {
        let mut trace = InData::new(capacity, dt, 0.0, 0, 0, "mV");
        for &v in values {
            trace.push(v);
        }
        trace
    }

    #[test]
    fn drive_runs_a_detector_attached_to_a_raw_trace() {
        let dt = 1.0 / 20_000.0;
        let mut samples = vec![0.0; 50];
        for frac in [0.2, 0.4, 0.6, 0.8, 1.0, 0.8, 0.6, 0.4, 0.2, 0.0] {
            samples.push(20.0 * frac);
        }
        samples.extend(vec![0.0; 50]);
        let trace = pushed_trace(2000, dt, &samples);

        let mut pipeline = FilterPipeline::new();
        let detector = PeakDetector::new("spikes", "raw").with_threshold_bounds(5.0, 100.0);
        pipeline.add_detector("spikes", NodeInput::Trace(0), "mV", 0.1, Box::new(detector)).unwrap();

        pipeline.drive(std::slice::from_ref(&trace), &[]).unwrap();
        assert_eq!(pipeline.events("spikes").unwrap().len(), 1);
    }

    #[test]
    fn drive_resets_a_node_when_its_source_trace_restarts() {
        let dt = 1.0 / 20_000.0;
        let trace = pushed_trace(2000, dt, &[0.0; 10]);

        let mut pipeline = FilterPipeline::new();
        let detector = PeakDetector::new("spikes", "raw").with_threshold_bounds(5.0, 100.0);
        pipeline.add_detector("spikes", NodeInput::Trace(0), "mV", 0.1, Box::new(detector)).unwrap();

        // driving twice with the source marked as restarted the second
        // time must not panic and must not fabricate events out of flat
        // baseline data.
        pipeline.drive(std::slice::from_ref(&trace), &[]).unwrap();
        pipeline.drive(std::slice::from_ref(&trace), &[0]).unwrap();
        assert!(pipeline.events("spikes").unwrap().is_empty());
    }
}
