//! Graph mutation operations
//!
//! Methods for modifying the graph structure: adding nodes, editing labels
//! and metadata, and replacing nodes. Every method records touched nodes in
//! the open transaction before changing them.

use smallvec::SmallVec;
use tracing::trace;

use crate::error::{RewriteError, RewriteResult, StructuralError};
use crate::opset::{Attributes, OpKind};
use crate::tensor::{checked_numel, ConstantData, TensorDesc};

use super::context::Graph;
use super::maps::{InputList, InputSlot, Node, NodeId, Output, OutputRef};
use super::metadata::{merge_metadata, MergePolicy, MetaValue};

impl Graph {
    // ========================================================================
    // Node construction
    // ========================================================================

    /// Add a node and connect its inputs
    ///
    /// Output descriptors come from the operator's shape inference. The
    /// default label is `"<Kind>_<id>"`.
    pub fn add_node(
        &mut self,
        kind: OpKind,
        inputs: &[OutputRef],
        attributes: Attributes,
    ) -> RewriteResult<NodeId> {
        let schema = *self
            .registry
            .get(kind)
            .ok_or(RewriteError::UnknownOp(kind))?;

        if !schema.arity.accepts(inputs.len()) {
            return Err(RewriteError::InvalidInputArity {
                kind,
                expected: schema.arity,
                actual: inputs.len(),
            });
        }

        let descs = inputs
            .iter()
            .map(|&input| {
                self.output_desc(input)
                    .cloned()
                    .ok_or(RewriteError::InvalidOutput(input))
            })
            .collect::<RewriteResult<Vec<TensorDesc>>>()?;

        let outputs = (schema.infer)(&descs, &attributes)
            .map_err(|reason| RewriteError::InvalidParameter { kind, reason })?;
        if let Some(desc) = outputs.iter().find(|d| checked_numel(&d.shape).is_none()) {
            return Err(RewriteError::InvalidParameter {
                kind,
                reason: format!("element count of {} overflows", desc),
            });
        }

        let id = self.next_id();
        for (index, &input) in inputs.iter().enumerate() {
            self.touch(input.node);
            if let Some(producer) = self.slot_mut(input.node) {
                producer.outputs[input.index]
                    .consumers
                    .push(InputSlot { node: id, index });
            }
        }

        self.slots.push(Some(Node {
            id,
            kind,
            inputs: inputs.iter().copied().collect(),
            outputs: outputs.into_iter().map(Output::new).collect(),
            attributes,
            label: format!("{}_{}", kind, id.index()),
            metadata: Default::default(),
        }));

        trace!(node = %id, kind = %kind, "added node");
        Ok(id)
    }

    /// Add a graph input
    pub fn add_parameter(&mut self, label: &str, desc: TensorDesc) -> RewriteResult<NodeId> {
        let dims: Vec<i64> = desc.shape.iter().map(|&d| d as i64).collect();
        let attributes = Attributes::new()
            .with("element_type", desc.element_type)
            .with("shape", dims);
        let id = self.add_node(OpKind::Parameter, &[], attributes)?;
        self.set_label(id, label)?;
        Ok(id)
    }

    /// Add a compile-time constant
    pub fn add_constant(&mut self, label: &str, data: ConstantData) -> RewriteResult<NodeId> {
        let id = self.add_node(OpKind::Constant, &[], Attributes::new().with("value", data))?;
        self.set_label(id, label)?;
        Ok(id)
    }

    /// Add a result sink reading `output`
    pub fn add_result(&mut self, label: &str, output: OutputRef) -> RewriteResult<NodeId> {
        let id = self.add_node(OpKind::Result, &[output], Attributes::new())?;
        self.set_label(id, label)?;
        self.results.push(id);
        Ok(id)
    }

    // ========================================================================
    // Labels and metadata
    // ========================================================================

    /// Set a node's label
    pub fn set_label(&mut self, id: NodeId, label: &str) -> RewriteResult<()> {
        self.ensure_live(id)?;
        self.touch(id);
        if let Some(node) = self.slot_mut(id) {
            node.label = label.to_string();
        }
        Ok(())
    }

    /// Set one metadata entry
    pub fn set_metadata(&mut self, id: NodeId, key: &str, value: MetaValue) -> RewriteResult<()> {
        self.ensure_live(id)?;
        self.touch(id);
        if let Some(node) = self.slot_mut(id) {
            node.metadata.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Merge the metadata of `from` into `to`
    ///
    /// Under [`MergePolicy::Provenance`] the target's provenance list becomes
    /// its label, then its previous list, then the source list.
    pub fn copy_metadata(
        &mut self,
        from: NodeId,
        to: NodeId,
        policy: MergePolicy,
    ) -> RewriteResult<()> {
        let source = self
            .node(from)
            .ok_or(RewriteError::UnknownNode(from))?
            .metadata
            .clone();
        self.ensure_live(to)?;

        self.touch(to);
        if let Some(node) = self.slot_mut(to) {
            let label = node.label.clone();
            merge_metadata(&mut node.metadata, &source, &label, policy);
        }
        Ok(())
    }

    // ========================================================================
    // Replacement
    // ========================================================================

    /// Redirect every consumer of `old` to `new_outputs` and remove `old`
    ///
    /// `new_outputs[i]` takes over the consumers of output `i`. All checks
    /// run before anything is mutated. Producers left without consumers are
    /// removed transitively; results and parameters are never removed.
    pub fn replace_node(&mut self, old: NodeId, new_outputs: &[OutputRef]) -> RewriteResult<()> {
        let node = self.node(old).ok_or(RewriteError::UnknownNode(old))?;

        if node.kind() == OpKind::Result || self.results.contains(&old) {
            return Err(RewriteError::ResultReplacement(old));
        }
        if new_outputs.len() != node.outputs().len() {
            return Err(RewriteError::ArityMismatch {
                expected: node.outputs().len(),
                actual: new_outputs.len(),
            });
        }

        for (index, &replacement) in new_outputs.iter().enumerate() {
            let actual = self
                .output_desc(replacement)
                .ok_or(RewriteError::InvalidOutput(replacement))?;
            let expected = &node.outputs()[index].desc;
            if actual != expected {
                return Err(RewriteError::ShapeMismatch {
                    index,
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
            if replacement.node == old || self.depends_on(replacement.node, old) {
                return Err(StructuralError::Cycle { node: old }.into());
            }
        }

        for (index, &replacement) in new_outputs.iter().enumerate() {
            self.touch(old);
            let consumers = match self.slot_mut(old) {
                Some(node) => std::mem::take(&mut node.outputs[index].consumers),
                None => continue,
            };

            for slot in consumers {
                self.touch(slot.node);
                if let Some(consumer) = self.slot_mut(slot.node) {
                    consumer.inputs[slot.index] = replacement;
                }
                self.touch(replacement.node);
                if let Some(producer) = self.slot_mut(replacement.node) {
                    producer.outputs[replacement.index].consumers.push(slot);
                }
            }
        }

        let producers = self.detach(old);
        self.remove_orphans(producers);

        trace!(node = %old, "replaced node");

        if self.validate_on_replace {
            self.validate()?;
        }
        Ok(())
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove every non-result, non-parameter node without consumers
    ///
    /// Returns the number of nodes removed.
    pub fn remove_dead_nodes(&mut self) -> usize {
        let dead: Vec<NodeId> = self
            .nodes()
            .filter(|node| self.is_removable(node))
            .map(Node::id)
            .collect();

        let before = self.node_count();
        for &id in &dead {
            if self.contains(id) {
                let producers = self.detach(id);
                self.remove_orphans(producers);
            }
        }
        before - self.node_count()
    }

    /// Unlink `id` from its producers and drop it
    ///
    /// Returns the producers it read from, in input order.
    pub(crate) fn detach(&mut self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        self.touch(id);
        let node = match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => node,
            None => return SmallVec::new(),
        };

        let inputs: InputList = node.inputs;
        for (index, input) in inputs.iter().enumerate() {
            self.touch(input.node);
            if let Some(producer) = self.slot_mut(input.node) {
                if let Some(output) = producer.outputs.get_mut(input.index) {
                    output
                        .consumers
                        .retain(|slot| !(slot.node == id && slot.index == index));
                }
            }
        }
        self.results.retain(|&r| r != id);

        inputs.iter().map(|input| input.node).collect()
    }

    /// Remove `candidates` that have no consumers, then their producers
    pub(crate) fn remove_orphans(&mut self, candidates: impl IntoIterator<Item = NodeId>) {
        let mut worklist: Vec<NodeId> = candidates.into_iter().collect();
        while let Some(id) = worklist.pop() {
            let removable = self.node(id).map(|n| self.is_removable(n)).unwrap_or(false);
            if removable {
                trace!(node = %id, "removing orphaned node");
                worklist.extend(self.detach(id));
            }
        }
    }

    fn is_removable(&self, node: &Node) -> bool {
        node.has_no_consumers()
            && !matches!(node.kind(), OpKind::Result | OpKind::Parameter)
            && !self.results.contains(&node.id())
    }

    fn ensure_live(&self, id: NodeId) -> RewriteResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(RewriteError::UnknownNode(id))
        }
    }
}
