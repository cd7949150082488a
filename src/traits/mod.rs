//! Core traits for graph-rewrite
//!
//! Defines the interface for whole-graph passes that run alongside
//! pattern-driven rules.

use crate::error::RewriteResult;
use crate::graph::Graph;

/// Whole-graph pass
///
/// Unlike a rewrite rule, a pass sees the entire graph at once. It runs after
/// the rule sweep of each pass-manager iteration.
///
/// # Example
///
/// ```ignore
/// struct Prune;
///
/// impl GraphPass for Prune {
///     fn name(&self) -> &str {
///         "Prune"
///     }
///
///     fn run(&self, graph: &mut Graph) -> RewriteResult<bool> {
///         Ok(graph.remove_dead_nodes() > 0)
///     }
/// }
/// ```
pub trait GraphPass: Send + Sync {
    /// Pass name used in reports and logs
    fn name(&self) -> &str;

    /// Run the pass
    ///
    /// # Returns
    /// * `RewriteResult<bool>` - Whether the graph changed
    fn run(&self, graph: &mut Graph) -> RewriteResult<bool>;

    /// Check whether the pass has anything to do
    fn is_applicable(&self, _graph: &Graph) -> bool {
        true
    }
}

/// Chainable pass that applies multiple passes in sequence
#[derive(Default)]
pub struct PassChain {
    passes: Vec<Box<dyn GraphPass>>,
}

impl PassChain {
    /// Create a new empty pass chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pass to the chain
    #[allow(clippy::should_implement_trait)]
    pub fn add<P: GraphPass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Number of passes
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl GraphPass for PassChain {
    fn name(&self) -> &str {
        "PassChain"
    }

    fn run(&self, graph: &mut Graph) -> RewriteResult<bool> {
        let mut changed = false;
        for pass in &self.passes {
            if pass.is_applicable(graph) {
                changed |= pass.run(graph)?;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opset::{Attributes, OpKind};
    use crate::tensor::{ElementType, TensorDesc};

    struct IdentityPass;

    impl GraphPass for IdentityPass {
        fn name(&self) -> &str {
            "Identity"
        }

        fn run(&self, _graph: &mut Graph) -> RewriteResult<bool> {
            Ok(false)
        }
    }

    struct PrunePass;

    impl GraphPass for PrunePass {
        fn name(&self) -> &str {
            "Prune"
        }

        fn run(&self, graph: &mut Graph) -> RewriteResult<bool> {
            Ok(graph.remove_dead_nodes() > 0)
        }
    }

    #[test]
    fn test_identity_pass() {
        let mut graph = Graph::new();
        let before = graph.clone();
        assert_eq!(IdentityPass.run(&mut graph), Ok(false));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_pass_chain() {
        let mut graph = Graph::new();
        let x = graph
            .add_parameter("x", TensorDesc::new(ElementType::F32, &[2]))
            .unwrap();
        graph.add_node(OpKind::Exp, &[x.output(0)], Attributes::new()).unwrap();

        let chain = PassChain::new().add(IdentityPass).add(PrunePass);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.run(&mut graph), Ok(true));
        assert_eq!(chain.run(&mut graph), Ok(false));
        assert_eq!(graph.node_count(), 1);
    }
}
