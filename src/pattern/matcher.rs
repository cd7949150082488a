//! Pattern matching engine
//!
//! Binds a [`Pattern`] to graph nodes by walking from the root towards the
//! inputs. The walk is deterministic and fails fast: there is no
//! backtracking, so a pattern either binds on the first attempt or not at
//! all.

use std::fmt;

use tracing::trace;

use crate::graph::{Graph, NodeId, OutputRef};
use crate::opset::OpKind;

use super::ops::{InputSpec, Pattern, PatternId};

/// Result of a successful match
///
/// Holds ids only; valid until the graph is next mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    root: NodeId,
    nodes: Vec<Option<NodeId>>,
    outputs: Vec<Option<OutputRef>>,
}

impl Match {
    fn new(root: NodeId, size: usize) -> Self {
        Self {
            root,
            nodes: vec![None; size],
            outputs: vec![None; size],
        }
    }

    /// Graph node bound to the pattern root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Graph node bound to a pattern node
    pub fn node(&self, id: PatternId) -> Option<NodeId> {
        self.nodes.get(id.index()).copied().flatten()
    }

    /// Edge through which a pattern node was reached
    ///
    /// `None` for the root and for nodes not reached through an input.
    pub fn output(&self, id: PatternId) -> Option<OutputRef> {
        self.outputs.get(id.index()).copied().flatten()
    }

    /// All bound graph nodes, in pattern order
    pub fn bound_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter_map(|n| *n)
    }
}

/// Why a match attempt failed
#[derive(Debug, Clone, PartialEq)]
pub enum MatchFailure {
    /// Candidate node is not live
    MissingNode(NodeId),
    /// Kind not accepted by the pattern node
    Kind {
        /// Candidate node
        node: NodeId,
        /// Actual kind
        actual: OpKind,
    },
    /// A predicate rejected the node
    Predicate {
        /// Candidate node
        node: NodeId,
        /// Predicate name
        name: String,
    },
    /// Input count does not fit the input spec
    Arity {
        /// Candidate node
        node: NodeId,
        /// Required count
        expected: usize,
        /// Actual count
        actual: usize,
    },
    /// Input reads the wrong output of its producer
    OutputIndex {
        /// Edge that was followed
        edge: OutputRef,
        /// Required output index
        expected: usize,
    },
    /// Shared pattern node would bind to two different graph nodes
    Rebind {
        /// Pattern node
        pattern: PatternId,
        /// Previous binding
        bound: NodeId,
        /// Conflicting candidate
        candidate: NodeId,
    },
    /// Shared pattern node reached through two different outputs
    EdgeRebind {
        /// Pattern node
        pattern: PatternId,
        /// Edge of the first binding
        bound: OutputRef,
        /// Conflicting edge
        candidate: OutputRef,
    },
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchFailure::MissingNode(node) => write!(f, "node {} does not exist", node),
            MatchFailure::Kind { node, actual } => {
                write!(f, "node {} has unexpected kind {}", node, actual)
            }
            MatchFailure::Predicate { node, name } => {
                write!(f, "predicate '{}' rejected node {}", name, node)
            }
            MatchFailure::Arity {
                node,
                expected,
                actual,
            } => write!(
                f,
                "node {} has {} inputs, pattern needs {}",
                node, actual, expected
            ),
            MatchFailure::OutputIndex { edge, expected } => {
                write!(f, "edge {} does not read output {}", edge, expected)
            }
            MatchFailure::Rebind {
                pattern,
                bound,
                candidate,
            } => write!(
                f,
                "pattern node {} already bound to {}, got {}",
                pattern.index(),
                bound,
                candidate
            ),
            MatchFailure::EdgeRebind {
                pattern,
                bound,
                candidate,
            } => write!(
                f,
                "pattern node {} already reached through {}, got {}",
                pattern.index(),
                bound,
                candidate
            ),
        }
    }
}

/// Pattern matcher over one graph
pub struct Matcher<'a> {
    graph: &'a Graph,
}

impl<'a> Matcher<'a> {
    /// Create a new matcher
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// Try to bind `pattern` with its root at `root`
    pub fn match_at(&self, pattern: &Pattern, root: NodeId) -> Option<Match> {
        match self.try_match(pattern, root) {
            Ok(m) => Some(m),
            Err(failure) => {
                trace!(root = %root, reason = %failure, "no match");
                None
            }
        }
    }

    /// Like [`match_at`](Self::match_at), reporting why the match failed
    pub fn try_match(&self, pattern: &Pattern, root: NodeId) -> Result<Match, MatchFailure> {
        let mut state = Match::new(root, pattern.len());
        self.bind(pattern, pattern.root(), root, None, &mut state)?;
        Ok(state)
    }

    /// Find all matches, scanning live nodes in id order
    pub fn find_all(&self, pattern: &Pattern) -> Vec<Match> {
        self.graph
            .node_ids()
            .filter_map(|id| self.match_at(pattern, id))
            .collect()
    }

    fn bind(
        &self,
        pattern: &Pattern,
        pid: PatternId,
        candidate: NodeId,
        via: Option<OutputRef>,
        state: &mut Match,
    ) -> Result<(), MatchFailure> {
        if let Some(bound) = state.node(pid) {
            if bound != candidate {
                return Err(MatchFailure::Rebind {
                    pattern: pid,
                    bound,
                    candidate,
                });
            }
            // a shared node binds to one edge, not just one node
            return match (state.output(pid), via) {
                (Some(first), Some(edge)) if first != edge => Err(MatchFailure::EdgeRebind {
                    pattern: pid,
                    bound: first,
                    candidate: edge,
                }),
                _ => Ok(()),
            };
        }

        let node = self
            .graph
            .node(candidate)
            .ok_or(MatchFailure::MissingNode(candidate))?;
        let pnode = pattern.node(pid);

        if !pnode.matcher.accepts(node.kind()) {
            return Err(MatchFailure::Kind {
                node: candidate,
                actual: node.kind(),
            });
        }
        if let Some(rejected) = pnode
            .predicates
            .iter()
            .find(|p| !p.test(self.graph, candidate))
        {
            return Err(MatchFailure::Predicate {
                node: candidate,
                name: rejected.name().to_string(),
            });
        }

        state.nodes[pid.index()] = Some(candidate);
        state.outputs[pid.index()] = via;

        let expected = match &pnode.inputs {
            InputSpec::Unconstrained => return Ok(()),
            InputSpec::Exact(inputs) => {
                if node.inputs().len() != inputs.len() {
                    return Err(self.arity_failure(candidate, inputs.len()));
                }
                inputs
            }
            InputSpec::Prefix(inputs) => {
                if node.inputs().len() < inputs.len() {
                    return Err(self.arity_failure(candidate, inputs.len()));
                }
                inputs
            }
        };

        for (pin, &edge) in expected.iter().zip(node.inputs()) {
            if let Some(index) = pin.output {
                if edge.index != index {
                    return Err(MatchFailure::OutputIndex {
                        edge,
                        expected: index,
                    });
                }
            }
            self.bind(pattern, pin.node, edge.node, Some(edge), state)?;
        }

        Ok(())
    }

    fn arity_failure(&self, node: NodeId, expected: usize) -> MatchFailure {
        MatchFailure::Arity {
            node,
            expected,
            actual: self.graph.node(node).map(|n| n.inputs().len()).unwrap_or(0),
        }
    }
}

/// Convenience function to create a matcher
pub fn matcher(graph: &Graph) -> Matcher<'_> {
    Matcher::new(graph)
}
