//! Transactional rewrites
//!
//! A transaction records the prior state of every node touched by a
//! mutation. Rolling back restores those snapshots, truncates nodes created
//! inside the transaction and restores the result sinks, which yields a graph
//! equal to the one before the transaction started.

use indexmap::IndexMap;

use crate::error::{RewriteError, RewriteResult};
use crate::opset::OpKind;

use super::context::Graph;
use super::maps::{Node, NodeId};

/// Undo log of one open transaction
#[derive(Debug, Clone)]
pub(crate) struct Journal {
    /// Arena length when the transaction began
    base_len: usize,
    /// First-touch snapshots of pre-existing slots
    touched: IndexMap<NodeId, Option<Node>>,
    /// Result sinks when the transaction began
    results: Vec<NodeId>,
}

impl Journal {
    fn begin(graph: &Graph) -> Self {
        Self {
            base_len: graph.slots.len(),
            touched: IndexMap::new(),
            results: graph.results.clone(),
        }
    }

    /// Snapshot `id` unless it was created inside the transaction or is
    /// already recorded
    pub(crate) fn record(&mut self, id: NodeId, slots: &[Option<Node>]) {
        if id.index() >= self.base_len || self.touched.contains_key(&id) {
            return;
        }
        let prior = slots.get(id.index()).cloned().flatten();
        self.touched.insert(id, prior);
    }

    fn rollback(self, graph: &mut Graph) {
        graph.slots.truncate(self.base_len);
        for (id, prior) in self.touched {
            graph.slots[id.index()] = prior;
        }
        graph.results = self.results;
    }
}

impl Graph {
    /// Run `f` as an all-or-nothing rewrite
    ///
    /// `Ok(true)` commits. `Ok(false)` and `Err` restore the graph exactly as
    /// it was before `f` ran. On commit, nodes created inside the
    /// transaction that ended up without consumers are dropped.
    ///
    /// Transactions do not nest.
    pub fn transaction<F>(&mut self, f: F) -> RewriteResult<bool>
    where
        F: FnOnce(&mut Graph) -> RewriteResult<bool>,
    {
        if self.journal.is_some() {
            return Err(RewriteError::Internal(
                "transactions cannot be nested".to_string(),
            ));
        }

        self.journal = Some(Journal::begin(self));
        let outcome = f(self);
        let journal = self
            .journal
            .take()
            .ok_or_else(|| RewriteError::Internal("transaction journal lost".to_string()))?;

        match outcome {
            Ok(true) => {
                self.prune_created_orphans(journal.base_len);
                Ok(true)
            }
            Ok(false) => {
                journal.rollback(self);
                Ok(false)
            }
            Err(err) => {
                journal.rollback(self);
                Err(err)
            }
        }
    }

    /// Drop nodes with id >= `base_len` that have no consumers
    ///
    /// Walks in reverse id order so that chains of unused new nodes are
    /// removed completely. Pre-existing producers left without consumers by
    /// the removal are removed transitively.
    fn prune_created_orphans(&mut self, base_len: usize) {
        let mut producers = Vec::new();
        for index in (base_len..self.slots.len()).rev() {
            let id = NodeId::new(index as u32);
            let prunable = match self.node(id) {
                Some(node) => {
                    node.has_no_consumers()
                        && !matches!(node.kind(), OpKind::Result | OpKind::Parameter)
                }
                None => false,
            };
            if prunable {
                producers.extend(self.detach(id));
            }
        }
        self.remove_orphans(producers);
    }
}
