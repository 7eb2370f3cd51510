use std::collections::{HashMap, HashSet};

use crate::error::{FilterError, FilterResult};

/// Declares one pipeline node's identity and the node ids it reads from,
/// without fixing what kind of node it is (`Filter`/`Detector`/
/// `FilterEvents` all share this shape). The engine owns the actual node
/// objects; this graph only orders them (spec.md §4.4: "the engine
/// topologically sorts on config").
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub id: String,
    pub input_ids: Vec<String>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, input_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            input_ids: input_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// A dependency-ordered pipeline: every node appears after all the nodes
/// it reads from.
pub struct Pipeline {
    order: Vec<String>,
}

impl Pipeline {
    /// Builds the evaluation order from a flat list of node declarations.
    /// Raw trace sources (AI channels) need not appear in `nodes`; any
    /// `input_ids` entry that doesn't match a node id is assumed to be
    /// such a source and is not itself ordered.
    pub fn build(nodes: &[NodeSpec]) -> FilterResult<Self> {
        let mut seen = HashSet::new();
        for node in nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(FilterError::DuplicateNode(node.id.clone()));
            }
        }

        let by_id: HashMap<&str, &NodeSpec> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let mut resolved: HashSet<String> = HashSet::new();
        let mut order = Vec::with_capacity(nodes.len());
        let mut remaining: Vec<&NodeSpec> = nodes.iter().collect();

        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|node| {
                let ready = node
                    .input_ids
                    .iter()
                    .all(|dep| !by_id.contains_key(dep.as_str()) || resolved.contains(dep));
                if ready {
                    order.push(node.id.clone());
                    resolved.insert(node.id.clone());
                }
                !ready
            });
            if remaining.len() == before {
                return Err(FilterError::Cycle(remaining[0].id.clone()));
            }
        }

        Ok(Self { order })
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_a_linear_chain() {
        let nodes = vec![
            NodeSpec::new("spikes", ["filtered"]),
            NodeSpec::new("filtered", ["raw"]),
        ];
        let pipeline = Pipeline::build(&nodes).unwrap();
        assert_eq!(pipeline.order(), ["filtered", "spikes"]);
    }

    #[test]
    fn unknown_input_is_treated_as_a_raw_source() {
        let nodes = vec![NodeSpec::new("spikes", ["ai-channel-0"])];
        let pipeline = Pipeline::build(&nodes).unwrap();
        assert_eq!(pipeline.order(), ["spikes"]);
    }

    #[test]
    fn detects_a_cycle() {
        let nodes = vec![NodeSpec::new("a", ["b"]), NodeSpec::new("b", ["a"])];
        assert!(Pipeline::build(&nodes).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let nodes = vec![NodeSpec::new("a", Vec::<String>::new()), NodeSpec::new("a", Vec::<String>::new())];
        assert!(matches!(Pipeline::build(&nodes), Err(FilterError::DuplicateNode(_))));
    }
}
