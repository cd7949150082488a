//! Built-in node predicates
//!
//! Plain functions usable directly with
//! [`PatternBuilder::predicate`](super::PatternBuilder::predicate), and
//! constructors returning closures for parameterized checks.

use crate::graph::{Graph, NodeId};
use crate::tensor::ElementType;

/// Node is a compile-time constant
pub fn is_constant(graph: &Graph, node: NodeId) -> bool {
    graph.is_constant(node)
}

/// Node is not a compile-time constant
pub fn is_not_constant(graph: &Graph, node: NodeId) -> bool {
    graph.contains(node) && !graph.is_constant(node)
}

/// Node has exactly one consumer over all outputs
pub fn has_single_consumer(graph: &Graph, node: NodeId) -> bool {
    graph
        .node(node)
        .map(|n| n.consumer_count() == 1)
        .unwrap_or(false)
}

/// Output 0 has the given rank
pub fn has_rank(rank: usize) -> impl Fn(&Graph, NodeId) -> bool + Send + Sync + 'static {
    move |graph: &Graph, node: NodeId| {
        graph
            .output_desc(node.output(0))
            .map(|d| d.rank() == rank)
            .unwrap_or(false)
    }
}

/// Node has exactly `count` consumers over all outputs
pub fn has_consumers(count: usize) -> impl Fn(&Graph, NodeId) -> bool + Send + Sync + 'static {
    move |graph: &Graph, node: NodeId| {
        graph
            .node(node)
            .map(|n| n.consumer_count() == count)
            .unwrap_or(false)
    }
}

/// Output 0 has the given element type
pub fn element_type(
    expected: ElementType,
) -> impl Fn(&Graph, NodeId) -> bool + Send + Sync + 'static {
    move |graph: &Graph, node: NodeId| {
        graph
            .output_desc(node.output(0))
            .map(|d| d.element_type == expected)
            .unwrap_or(false)
    }
}
