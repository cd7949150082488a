//! Pattern definitions
//!
//! A [`Pattern`] is an arena of pattern nodes rooted at one of them. Each
//! pattern node constrains the graph node it binds to (operator kind,
//! predicates) and, optionally, which pattern nodes feed its inputs.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::graph::{Graph, NodeId};
use crate::opset::OpKind;

use super::predicates;

/// Index of a node inside a [`Pattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(usize);

impl PatternId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0
    }

    /// Reference to a specific output of the bound node
    pub fn output(self, index: usize) -> PatternInput {
        PatternInput {
            node: self,
            output: Some(index),
        }
    }
}

/// Predicate over a candidate node; cannot mutate the graph
pub type PredicateFn = Arc<dyn Fn(&Graph, NodeId) -> bool + Send + Sync>;

/// Predicate with a name used in match-failure logs
#[derive(Clone)]
pub struct NamedPredicate {
    name: Cow<'static, str>,
    check: PredicateFn,
}

impl NamedPredicate {
    /// Wrap a predicate
    pub fn new<F>(name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        F: Fn(&Graph, NodeId) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Predicate name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate on `node`
    pub fn test(&self, graph: &Graph, node: NodeId) -> bool {
        (self.check)(graph, node)
    }
}

impl fmt::Debug for NamedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedPredicate").field(&self.name).finish()
    }
}

/// What kind of node a pattern node accepts
#[derive(Debug, Clone, PartialEq)]
pub enum NodeMatcher {
    /// Any of the listed kinds
    Kinds(SmallVec<[OpKind; 2]>),
    /// Wildcard
    Any,
}

impl NodeMatcher {
    /// Check a kind against the matcher
    pub fn accepts(&self, kind: OpKind) -> bool {
        match self {
            NodeMatcher::Kinds(kinds) => kinds.contains(&kind),
            NodeMatcher::Any => true,
        }
    }
}

/// Reference from a pattern input to the pattern node feeding it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternInput {
    /// Feeding pattern node
    pub node: PatternId,
    /// Required output index on the feeding node, any when `None`
    pub output: Option<usize>,
}

impl From<PatternId> for PatternInput {
    fn from(node: PatternId) -> Self {
        Self { node, output: None }
    }
}

/// Constraint on a pattern node's inputs
#[derive(Debug, Clone, PartialEq)]
pub enum InputSpec {
    /// Inputs are not inspected
    Unconstrained,
    /// Input count must equal the list length, each input must match
    Exact(Vec<PatternInput>),
    /// The first inputs must match, more are allowed
    Prefix(Vec<PatternInput>),
}

/// One node of a pattern
#[derive(Debug, Clone)]
pub struct PatternNode {
    /// Kind constraint
    pub matcher: NodeMatcher,
    /// Input constraint
    pub inputs: InputSpec,
    /// Extra predicates, all must hold
    pub predicates: Vec<NamedPredicate>,
}

/// Declarative sub-graph template
#[derive(Debug, Clone)]
pub struct Pattern {
    nodes: Vec<PatternNode>,
    root: PatternId,
}

impl Pattern {
    /// Root pattern node
    pub fn root(&self) -> PatternId {
        self.root
    }

    /// Number of pattern nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a pattern node
    pub fn node(&self, id: PatternId) -> &PatternNode {
        &self.nodes[id.0]
    }

    /// Kinds the root accepts, `None` for a wildcard root
    pub fn root_kinds(&self) -> Option<&[OpKind]> {
        match &self.node(self.root).matcher {
            NodeMatcher::Kinds(kinds) => Some(kinds),
            NodeMatcher::Any => None,
        }
    }
}

/// Builder for patterns
///
/// Nodes are created leaf-first; each constructor returns the new node's id
/// for use as an input of later nodes.
///
/// ```ignore
/// let mut p = PatternBuilder::new();
/// let x = p.any();
/// let mish = p.op(OpKind::Mish, [x]);
/// let pattern = p.build(mish);
/// ```
#[derive(Debug, Default)]
pub struct PatternBuilder {
    nodes: Vec<PatternNode>,
}

impl PatternBuilder {
    /// Create a new pattern builder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, matcher: NodeMatcher, inputs: InputSpec) -> PatternId {
        self.nodes.push(PatternNode {
            matcher,
            inputs,
            predicates: Vec::new(),
        });
        PatternId(self.nodes.len() - 1)
    }

    /// Wildcard accepting any node
    pub fn any(&mut self) -> PatternId {
        self.push(NodeMatcher::Any, InputSpec::Unconstrained)
    }

    /// Node of `kind`, inputs unconstrained
    pub fn wrap_type(&mut self, kind: OpKind) -> PatternId {
        self.wrap_any_of(&[kind])
    }

    /// Node of any listed kind, inputs unconstrained
    pub fn wrap_any_of(&mut self, kinds: &[OpKind]) -> PatternId {
        self.push(
            NodeMatcher::Kinds(kinds.iter().copied().collect()),
            InputSpec::Unconstrained,
        )
    }

    /// Node of `kind` with exactly the given inputs
    pub fn op<I>(&mut self, kind: OpKind, inputs: impl IntoIterator<Item = I>) -> PatternId
    where
        I: Into<PatternInput>,
    {
        let inputs = inputs.into_iter().map(Into::into).collect();
        self.push(NodeMatcher::Kinds([kind].into_iter().collect()), InputSpec::Exact(inputs))
    }

    /// Node of `kind` whose leading inputs are the given ones
    pub fn op_prefix<I>(&mut self, kind: OpKind, inputs: impl IntoIterator<Item = I>) -> PatternId
    where
        I: Into<PatternInput>,
    {
        let inputs = inputs.into_iter().map(Into::into).collect();
        self.push(NodeMatcher::Kinds([kind].into_iter().collect()), InputSpec::Prefix(inputs))
    }

    /// Wildcard constrained by a predicate
    pub fn predicate<F>(&mut self, name: impl Into<Cow<'static, str>>, check: F) -> PatternId
    where
        F: Fn(&Graph, NodeId) -> bool + Send + Sync + 'static,
    {
        let id = self.any();
        self.with_predicate(id, name, check);
        id
    }

    /// Wildcard accepting compile-time constants only
    pub fn constant(&mut self) -> PatternId {
        self.predicate("is_constant", predicates::is_constant)
    }

    /// Attach an extra predicate to an existing node
    pub fn with_predicate<F>(
        &mut self,
        id: PatternId,
        name: impl Into<Cow<'static, str>>,
        check: F,
    ) -> &mut Self
    where
        F: Fn(&Graph, NodeId) -> bool + Send + Sync + 'static,
    {
        self.nodes[id.0]
            .predicates
            .push(NamedPredicate::new(name, check));
        self
    }

    /// Output-indexed reference to `id`
    pub fn output(&self, id: PatternId, index: usize) -> PatternInput {
        id.output(index)
    }

    /// Finish the pattern, rooted at `root`
    pub fn build(self, root: PatternId) -> Pattern {
        Pattern {
            nodes: self.nodes,
            root,
        }
    }
}
