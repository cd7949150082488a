//! Finalized graph export
//!
//! Turns a rewritten [`Graph`] into an immutable, topologically ordered
//! snapshot and exports the provenance recorded on its nodes.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{RewriteError, RewriteResult};
use crate::graph::{Graph, Node, NodeId, ORIGINAL_NAMES};
use crate::opset::OpKind;

/// Original layer names carried by one node
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    /// Node label at finalization
    pub label: String,
    /// Original layer names, unchanged
    pub names: Vec<String>,
}

/// Immutable result of a rewrite session
#[derive(Debug, Clone)]
pub struct FinalizedGraph {
    /// Live nodes, producers before consumers
    pub nodes: Vec<Node>,
    /// Result sinks in registration order
    pub results: Vec<NodeId>,
    /// Provenance of every node that carries it, in topological order
    ///
    /// Keyed by node since labels need not be unique.
    pub provenance: IndexMap<NodeId, Provenance>,
}

impl FinalizedGraph {
    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a node by label
    pub fn node_by_label(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label() == label)
    }

    /// Original names of every node labelled `label`, in topological order
    pub fn provenance_of(&self, label: &str) -> Vec<&[String]> {
        self.provenance
            .values()
            .filter(|p| p.label == label)
            .map(|p| p.names.as_slice())
            .collect()
    }

    /// Original names recorded on node `id`
    pub fn node_provenance(&self, id: NodeId) -> Option<&[String]> {
        self.provenance.get(&id).map(|p| p.names.as_slice())
    }

    /// Node kinds in order
    pub fn kinds(&self) -> Vec<OpKind> {
        self.nodes.iter().map(Node::kind).collect()
    }
}

/// Builder for finalizing a graph
#[derive(Debug)]
pub struct Finalizer {
    /// Graph being finalized
    graph: Graph,
    /// Remove dead nodes first
    prune: bool,
    /// Require every node to reach a result
    require_coverage: bool,
}

impl Finalizer {
    /// Create a new finalizer
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            prune: true,
            require_coverage: true,
        }
    }

    /// Remove dead nodes before exporting
    pub fn prune(mut self, enabled: bool) -> Self {
        self.prune = enabled;
        self
    }

    /// Fail if some node does not reach any result
    pub fn require_coverage(mut self, enabled: bool) -> Self {
        self.require_coverage = enabled;
        self
    }

    /// Validate and export
    pub fn build(mut self) -> RewriteResult<FinalizedGraph> {
        if self.prune {
            let removed = self.graph.remove_dead_nodes();
            debug!(removed, "pruned before finalize");
        }

        self.graph.validate()?;
        if self.require_coverage {
            self.graph.validate_coverage()?;
        }

        let order = self.graph.topological_order();
        let mut nodes = Vec::with_capacity(order.len());
        let mut provenance = IndexMap::new();

        for id in order {
            let node = self
                .graph
                .node(id)
                .ok_or(RewriteError::UnknownNode(id))?;
            if node.metadata().contains_key(ORIGINAL_NAMES) {
                provenance.insert(
                    id,
                    Provenance {
                        label: node.label().to_string(),
                        names: node.original_names(),
                    },
                );
            }
            nodes.push(node.clone());
        }

        Ok(FinalizedGraph {
            nodes,
            results: self.graph.results().to_vec(),
            provenance,
        })
    }
}

/// Validate `graph` and export it with default settings
pub fn finalize(graph: Graph) -> RewriteResult<FinalizedGraph> {
    Finalizer::new(graph).build()
}
