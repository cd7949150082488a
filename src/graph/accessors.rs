//! Graph queries
//!
//! Read-only lookups, ordering and reachability.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::opset::OpKind;
use crate::tensor::TensorDesc;

use super::context::Graph;
use super::maps::{InputSlot, Node, NodeId, OutputRef};

impl Graph {
    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a live node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Check if a node is live
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Live nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Live node ids in id order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().map(Node::id)
    }

    /// Result sinks in registration order
    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    // ========================================================================
    // Edge accessors
    // ========================================================================

    /// Descriptor of an output
    pub fn output_desc(&self, output: OutputRef) -> Option<&TensorDesc> {
        self.node(output.node)?.output_desc(output.index)
    }

    /// Consumers of an output, in attachment order
    pub fn consumers(&self, output: OutputRef) -> &[InputSlot] {
        self.node(output.node)
            .and_then(|n| n.outputs().get(output.index))
            .map(|o| o.consumers.as_slice())
            .unwrap_or(&[])
    }

    /// Output feeding input `index` of `consumer`
    pub fn producer_of(&self, consumer: NodeId, index: usize) -> Option<OutputRef> {
        self.node(consumer)?.input(index)
    }

    /// Check if a node is a compile-time constant
    pub fn is_constant(&self, id: NodeId) -> bool {
        self.node(id)
            .map(|n| self.registry.is_constant(n.kind()))
            .unwrap_or(false)
    }

    /// Find all nodes of a kind, in id order
    pub fn find_nodes_by_kind(&self, kind: OpKind) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.kind() == kind)
            .map(Node::id)
            .collect()
    }

    /// Count nodes by kind
    pub fn count_by_kind(&self) -> FxHashMap<OpKind, usize> {
        let mut counts = FxHashMap::default();
        for node in self.nodes() {
            *counts.entry(node.kind()).or_insert(0) += 1;
        }
        counts
    }

    // ========================================================================
    // Ordering and reachability
    // ========================================================================

    /// Producers before consumers, ties broken by id
    ///
    /// Nodes on a cycle are omitted, so a shorter result than
    /// [`node_count`](Self::node_count) signals a cyclic graph.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree: FxHashMap<NodeId, usize> = self
            .nodes()
            .map(|n| {
                let live_inputs = n.inputs().iter().filter(|i| self.contains(i.node)).count();
                (n.id(), live_inputs)
            })
            .collect();

        let mut ready: VecDeque<NodeId> = self
            .node_ids()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());

        while let Some(id) = ready.pop_front() {
            order.push(id);
            let Some(node) = self.node(id) else { continue };
            for output in node.outputs() {
                for slot in &output.consumers {
                    if let Some(degree) = in_degree.get_mut(&slot.node) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            ready.push_back(slot.node);
                        }
                    }
                }
            }
        }

        order
    }

    /// Consumers before producers
    pub fn reverse_topological_order(&self) -> Vec<NodeId> {
        let mut order = self.topological_order();
        order.reverse();
        order
    }

    /// Check if `node` reads, directly or transitively, from `ancestor`
    pub fn depends_on(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            let Some(n) = self.node(current) else { continue };
            for input in n.inputs() {
                if input.node == ancestor {
                    return true;
                }
                if visited.insert(input.node) {
                    stack.push(input.node);
                }
            }
        }

        false
    }
}
