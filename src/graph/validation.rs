//! Structural validation
//!
//! Checks the invariants every mutation must preserve. A failure here means
//! the graph is corrupted.

use rustc_hash::FxHashSet;

use crate::error::StructuralError;
use crate::opset::OpKind;

use super::context::Graph;
use super::maps::{InputSlot, NodeId};

impl Graph {
    /// Check edge consistency, result liveness and acyclicity
    pub fn validate(&self) -> Result<(), StructuralError> {
        for node in self.nodes() {
            for (input_index, &target) in node.inputs().iter().enumerate() {
                let producer_output = self
                    .node(target.node)
                    .and_then(|p| p.outputs().get(target.index));
                let Some(output) = producer_output else {
                    return Err(StructuralError::DanglingEdge {
                        consumer: node.id(),
                        input: input_index,
                        target,
                    });
                };

                let slot = InputSlot {
                    node: node.id(),
                    index: input_index,
                };
                if !output.consumers.contains(&slot) {
                    return Err(StructuralError::BrokenBackEdge {
                        output: target,
                        consumer: node.id(),
                        input: input_index,
                    });
                }
            }

            for (output_index, output) in node.outputs().iter().enumerate() {
                let source = node.id().output(output_index);
                for slot in &output.consumers {
                    if self.producer_of(slot.node, slot.index) != Some(source) {
                        return Err(StructuralError::BrokenBackEdge {
                            output: source,
                            consumer: slot.node,
                            input: slot.index,
                        });
                    }
                }
            }
        }

        if let Some(&missing) = self.results.iter().find(|&&r| !self.contains(r)) {
            return Err(StructuralError::MissingResult(missing));
        }

        let order = self.topological_order();
        if order.len() != self.node_count() {
            let ordered: FxHashSet<NodeId> = order.into_iter().collect();
            let node = self
                .node_ids()
                .find(|id| !ordered.contains(id))
                .unwrap_or(NodeId::new(0));
            return Err(StructuralError::Cycle { node });
        }

        Ok(())
    }

    /// Check that every non-parameter node contributes to some result
    pub fn validate_coverage(&self) -> Result<(), StructuralError> {
        let mut reached: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack: Vec<NodeId> = self.results.clone();

        while let Some(id) = stack.pop() {
            if !reached.insert(id) {
                continue;
            }
            if let Some(node) = self.node(id) {
                stack.extend(node.inputs().iter().map(|i| i.node));
            }
        }

        match self
            .nodes()
            .find(|n| n.kind() != OpKind::Parameter && !reached.contains(&n.id()))
        {
            Some(node) => Err(StructuralError::Unreachable(node.id())),
            None => Ok(()),
        }
    }
}
