//! Rewrite rules
//!
//! A [`RewriteRule`] pairs a [`Pattern`] with a callback. The callback runs
//! only after the pattern has bound, inside a graph transaction: returning
//! `Ok(false)` or an error leaves the graph exactly as it was.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::RewriteResult;
use crate::graph::{Graph, NodeId};
use crate::pattern::{Match, Matcher, Pattern};

/// Rule callback: builds the replacement and reports whether it applied
pub type RewriteCallback = Arc<dyn Fn(&mut Graph, &Match) -> RewriteResult<bool> + Send + Sync>;

/// Outcome of applying a rule at one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The pattern did not bind
    NoMatch,
    /// The pattern bound but the callback declined
    Declined,
    /// The graph was rewritten
    Applied,
}

/// Pattern plus callback
#[derive(Clone)]
pub struct RewriteRule {
    name: Cow<'static, str>,
    pattern: Pattern,
    callback: RewriteCallback,
}

impl RewriteRule {
    /// Create a rule
    pub fn new<F>(name: impl Into<Cow<'static, str>>, pattern: Pattern, callback: F) -> Self
    where
        F: Fn(&mut Graph, &Match) -> RewriteResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pattern,
            callback: Arc::new(callback),
        }
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rule pattern
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Cheap pre-filter on the root kind
    pub fn may_match(&self, graph: &Graph, node: NodeId) -> bool {
        match (graph.node(node), self.pattern.root_kinds()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(n), Some(kinds)) => kinds.contains(&n.kind()),
        }
    }

    /// Match at `root` and, on success, run the callback transactionally
    pub fn apply(&self, graph: &mut Graph, root: NodeId) -> RewriteResult<RuleOutcome> {
        if !self.may_match(graph, root) {
            return Ok(RuleOutcome::NoMatch);
        }
        let Some(m) = Matcher::new(graph).match_at(&self.pattern, root) else {
            return Ok(RuleOutcome::NoMatch);
        };

        let applied = graph.transaction(|g| (self.callback)(g, &m))?;
        Ok(if applied {
            RuleOutcome::Applied
        } else {
            RuleOutcome::Declined
        })
    }
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}
