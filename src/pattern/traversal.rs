//! Graph traversal utilities
//!
//! Provides BFS and DFS traversal over graph nodes.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::{Graph, Node, NodeId};

/// Direction of traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward: follow consumer edges (input → output)
    Forward,
    /// Backward: follow producer edges (output → input)
    Backward,
}

fn neighbors(node: &Node, direction: Direction) -> Vec<NodeId> {
    match direction {
        Direction::Forward => node
            .outputs()
            .iter()
            .flat_map(|o| o.consumers.iter().map(|slot| slot.node))
            .collect(),
        Direction::Backward => node.inputs().iter().map(|i| i.node).collect(),
    }
}

/// BFS traversal iterator
pub struct BfsIterator<'a> {
    graph: &'a Graph,
    queue: VecDeque<NodeId>,
    visited: FxHashSet<NodeId>,
    direction: Direction,
}

impl<'a> BfsIterator<'a> {
    /// Create a new BFS iterator starting from the given node
    pub fn new(graph: &'a Graph, start: NodeId, direction: Direction) -> Self {
        let mut queue = VecDeque::new();
        let mut visited = FxHashSet::default();

        if graph.contains(start) {
            queue.push_back(start);
            visited.insert(start);
        }

        Self {
            graph,
            queue,
            visited,
            direction,
        }
    }

    /// Create forward BFS (follows consumers)
    pub fn forward(graph: &'a Graph, start: NodeId) -> Self {
        Self::new(graph, start, Direction::Forward)
    }

    /// Create backward BFS (follows producers)
    pub fn backward(graph: &'a Graph, start: NodeId) -> Self {
        Self::new(graph, start, Direction::Backward)
    }
}

impl<'a> Iterator for BfsIterator<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        let node = self.graph.node(id)?;

        for next in neighbors(node, self.direction) {
            if self.visited.insert(next) {
                self.queue.push_back(next);
            }
        }

        Some(node)
    }
}

/// DFS traversal iterator
pub struct DfsIterator<'a> {
    graph: &'a Graph,
    stack: Vec<NodeId>,
    visited: FxHashSet<NodeId>,
    direction: Direction,
}

impl<'a> DfsIterator<'a> {
    /// Create a new DFS iterator starting from the given node
    pub fn new(graph: &'a Graph, start: NodeId, direction: Direction) -> Self {
        let mut stack = Vec::new();
        let mut visited = FxHashSet::default();

        if graph.contains(start) {
            stack.push(start);
            visited.insert(start);
        }

        Self {
            graph,
            stack,
            visited,
            direction,
        }
    }

    /// Create forward DFS
    pub fn forward(graph: &'a Graph, start: NodeId) -> Self {
        Self::new(graph, start, Direction::Forward)
    }

    /// Create backward DFS
    pub fn backward(graph: &'a Graph, start: NodeId) -> Self {
        Self::new(graph, start, Direction::Backward)
    }
}

impl<'a> Iterator for DfsIterator<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.graph.node(id)?;

        for next in neighbors(node, self.direction) {
            if self.visited.insert(next) {
                self.stack.push(next);
            }
        }

        Some(node)
    }
}

/// Collect all nodes reachable from start in the given direction
pub fn reachable_nodes(graph: &Graph, start: NodeId, direction: Direction) -> Vec<NodeId> {
    BfsIterator::new(graph, start, direction)
        .map(Node::id)
        .collect()
}

/// Collect all predecessor nodes (backward reachable)
pub fn predecessors(graph: &Graph, start: NodeId) -> Vec<NodeId> {
    BfsIterator::backward(graph, start)
        .skip(1) // skip start node
        .map(Node::id)
        .collect()
}

/// Collect all successor nodes (forward reachable)
pub fn successors(graph: &Graph, start: NodeId) -> Vec<NodeId> {
    BfsIterator::forward(graph, start)
        .skip(1) // skip start node
        .map(Node::id)
        .collect()
}

/// Find a forward path between two nodes
pub fn find_path(graph: &Graph, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    if from == to {
        return graph.contains(from).then(|| vec![from]);
    }

    let mut queue = VecDeque::new();
    let mut parent: FxHashMap<NodeId, NodeId> = FxHashMap::default();

    queue.push_back(from);
    parent.insert(from, from);

    while let Some(current) = queue.pop_front() {
        let node = graph.node(current)?;

        for next in neighbors(node, Direction::Forward) {
            if parent.contains_key(&next) {
                continue;
            }
            parent.insert(next, current);
            if next == to {
                // Reconstruct path
                let mut path = vec![to];
                let mut curr = to;
                while curr != from {
                    curr = *parent.get(&curr)?;
                    path.push(curr);
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }

    None
}

/// Check if there's a forward path between two nodes
pub fn has_path(graph: &Graph, from: NodeId, to: NodeId) -> bool {
    from == to || graph.depends_on(to, from)
}
