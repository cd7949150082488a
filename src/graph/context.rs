//! Graph container
//!
//! `Graph` is the central structure for rewriting. It owns every node in an
//! id-indexed arena, keeps forward and backward edges in sync, and shares the
//! operator registry with its clones.

use std::sync::Arc;

use crate::opset::OpRegistry;

use super::journal::Journal;
use super::maps::{Node, NodeId};

/// Mutable directed computation graph
///
/// Invariants maintained by every mutation:
/// - the graph is acyclic
/// - every input edge targets an existing output of a live node
/// - every back-edge in a consumer list mirrors a forward edge
#[derive(Debug, Clone)]
pub struct Graph {
    /// Operator schemas shared across clones
    pub(crate) registry: Arc<OpRegistry>,

    /// Node arena; `None` marks a removed id, ids are never reused
    pub(crate) slots: Vec<Option<Node>>,

    /// Result sinks in registration order
    pub(crate) results: Vec<NodeId>,

    /// Undo log of the open transaction
    pub(crate) journal: Option<Journal>,

    /// Run structural validation after every replacement
    pub(crate) validate_on_replace: bool,
}

impl Graph {
    /// Create an empty graph using the built-in operator set
    pub fn new() -> Self {
        Self::with_registry(Arc::new(OpRegistry::standard()))
    }

    /// Create an empty graph using the given registry
    pub fn with_registry(registry: Arc<OpRegistry>) -> Self {
        Self {
            registry,
            slots: Vec::new(),
            results: Vec::new(),
            journal: None,
            validate_on_replace: true,
        }
    }

    /// Operator registry
    pub fn registry(&self) -> &OpRegistry {
        &self.registry
    }

    /// Enable or disable validation after each replacement
    pub fn set_validation(&mut self, enabled: bool) {
        self.validate_on_replace = enabled;
    }

    /// Whether replacements are validated
    pub fn validation_enabled(&self) -> bool {
        self.validate_on_replace
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }

    /// Next id to be assigned
    pub fn next_id(&self) -> NodeId {
        NodeId::new(self.slots.len() as u32)
    }

    // ========================================================================
    // Internal slot access
    // ========================================================================

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Record the prior state of `id` in the open transaction, if any
    ///
    /// Must run before every in-place change to an existing slot.
    pub(crate) fn touch(&mut self, id: NodeId) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record(id, &self.slots);
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: nodes (by id, with edges, labels and metadata),
/// result sinks and the id counter
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots && self.results == other.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{ElementType, TensorDesc};

    #[test]
    fn test_new_graph_is_empty() {
        let graph = Graph::new();
        assert_eq!(graph.node_count(), 0);
        assert!(graph.results().is_empty());
        assert!(graph.validation_enabled());
        assert!(!graph.in_transaction());
        assert_eq!(graph.next_id(), NodeId::new(0));
    }

    #[test]
    fn test_clone_is_equal() {
        let mut graph = Graph::new();
        let a = graph
            .add_parameter("a", TensorDesc::new(ElementType::F32, &[2]))
            .unwrap();
        graph.add_result("out", a.output(0)).unwrap();

        let copy = graph.clone();
        assert_eq!(copy, graph);

        graph.set_label(a, "renamed").unwrap();
        assert_ne!(copy, graph);
    }

    #[test]
    fn test_graph_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Graph>();
    }
}
