//! Elimination passes
//!
//! Whole-graph passes that remove unnecessary nodes.

use tracing::debug;

use crate::error::RewriteResult;
use crate::graph::Graph;
use crate::opset::OpKind;
use crate::traits::GraphPass;

/// Remove nodes whose outputs nobody reads
///
/// Results and parameters are kept; everything else without consumers is
/// removed, transitively.
#[derive(Debug, Default)]
pub struct EliminateDeadNodes;

impl EliminateDeadNodes {
    /// Create the pass
    pub fn new() -> Self {
        Self
    }
}

impl GraphPass for EliminateDeadNodes {
    fn name(&self) -> &str {
        "EliminateDeadNodes"
    }

    fn run(&self, graph: &mut Graph) -> RewriteResult<bool> {
        let removed = graph.remove_dead_nodes();
        if removed > 0 {
            debug!(removed, "eliminated dead nodes");
        }
        Ok(removed > 0)
    }

    fn is_applicable(&self, graph: &Graph) -> bool {
        graph.nodes().any(|n| {
            n.has_no_consumers() && !matches!(n.kind(), OpKind::Result | OpKind::Parameter)
        })
    }
}
