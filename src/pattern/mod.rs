//! Pattern matching module
//!
//! This module provides tools for describing sub-graphs and locating them in
//! a [`Graph`](crate::graph::Graph).
//!
//! # Overview
//!
//! The pattern matching system works by:
//! 1. Declaring a pattern leaf-first with [`PatternBuilder`]
//! 2. Binding it at a candidate root, walking towards the inputs
//! 3. Checking kinds, predicates, input counts and output indices on the way
//!
//! # Example
//!
//! ```ignore
//! use graph_rewrite::pattern::{Matcher, PatternBuilder};
//! use graph_rewrite::opset::OpKind;
//!
//! let mut p = PatternBuilder::new();
//! let x = p.any();
//! let exp = p.op(OpKind::Exp, [x]);
//! let pattern = p.build(exp);
//!
//! for m in Matcher::new(&graph).find_all(&pattern) {
//!     println!("exp at {} reads {:?}", m.root(), m.node(x));
//! }
//! ```
//!
//! # Traversal
//!
//! The module also provides graph traversal utilities:
//!
//! ```ignore
//! use graph_rewrite::pattern::traversal::{BfsIterator, Direction};
//!
//! for node in BfsIterator::forward(&graph, start) {
//!     println!("Visiting: {}", node.label());
//! }
//! ```

pub mod matcher;
pub mod ops;
pub mod predicates;
pub mod traversal;

// Re-export main types
pub use matcher::{matcher, Match, MatchFailure, Matcher};
pub use ops::{
    InputSpec, NamedPredicate, NodeMatcher, Pattern, PatternBuilder, PatternId, PatternInput,
    PatternNode, PredicateFn,
};
pub use traversal::{
    find_path, has_path, predecessors, reachable_nodes, successors, BfsIterator, DfsIterator,
    Direction,
};
