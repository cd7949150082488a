//! Common utilities for transformers
//!
//! Shared helper functions and types used across multiple transformers.

use crate::error::{RewriteError, RewriteResult};
use crate::graph::{Graph, MergePolicy, Node, NodeId, OutputRef};
use crate::pattern::Match;
use crate::tensor::TensorDesc;
use crate::transform::{rewrite_once, RewriteRule};

/// A ready-made rewrite
///
/// Implementors describe one rule; it can be applied directly or registered
/// on a [`PassManager`](crate::transform::PassManager).
pub trait Transformation {
    /// Name of the transformation
    fn name(&self) -> &'static str;

    /// Build the rule
    fn rule(&self) -> RewriteRule;

    /// Apply one sweep of the rule, returning the number of rewrites
    fn apply(&self, graph: &mut Graph) -> RewriteResult<usize> {
        rewrite_once(graph, &self.rule())
    }
}

/// Node bound to the pattern root
pub fn root_node<'g>(graph: &'g Graph, m: &Match) -> RewriteResult<&'g Node> {
    graph
        .node(m.root())
        .ok_or(RewriteError::UnknownNode(m.root()))
}

/// Descriptor of input `index` of `node`
pub fn input_desc(graph: &Graph, node: NodeId, index: usize) -> RewriteResult<TensorDesc> {
    let source = graph
        .producer_of(node, index)
        .ok_or_else(|| RewriteError::Internal(format!("node {} has no input {}", node, index)))?;
    graph
        .output_desc(source)
        .cloned()
        .ok_or(RewriteError::InvalidOutput(source))
}

/// Label for an auxiliary node derived from `base`
pub fn derive_label(base: &str, suffix: &str) -> String {
    format!("{}/{}", base, suffix)
}

/// Give `helpers` derived labels and the provenance of `old`
pub fn inherit_provenance(
    graph: &mut Graph,
    old: NodeId,
    helpers: &[(NodeId, &str)],
) -> RewriteResult<()> {
    let base = root_label(graph, old)?;
    for &(node, suffix) in helpers {
        graph.set_label(node, &derive_label(&base, suffix))?;
        graph.copy_metadata(old, node, MergePolicy::Provenance)?;
    }
    Ok(())
}

/// Hand `old`'s identity to `new` and swap it in
///
/// `new` takes `old`'s label and merged provenance, then `new_outputs`
/// replace `old`'s outputs.
pub fn finish_replacement(
    graph: &mut Graph,
    old: NodeId,
    new: NodeId,
    new_outputs: &[OutputRef],
) -> RewriteResult<()> {
    let label = root_label(graph, old)?;
    graph.set_label(new, &label)?;
    graph.copy_metadata(old, new, MergePolicy::Provenance)?;
    graph.replace_node(old, new_outputs)
}

fn root_label(graph: &Graph, id: NodeId) -> RewriteResult<String> {
    graph
        .node(id)
        .map(|n| n.label().to_string())
        .ok_or(RewriteError::UnknownNode(id))
}
