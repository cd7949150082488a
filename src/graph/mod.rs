//! Graph model
//!
//! This module provides the mutable computation graph the rewrite engine
//! operates on:
//!
//! - [`Graph`]: node arena with forward and backward edges
//! - [`maps`]: ids, edge references and node records
//! - [`metadata`]: per-node metadata and provenance merging
//!
//! # Example
//!
//! ```ignore
//! use graph_rewrite::graph::Graph;
//! use graph_rewrite::opset::{Attributes, OpKind};
//!
//! let mut graph = Graph::new();
//! let x = graph.add_parameter("x", desc)?;
//! let exp = graph.add_node(OpKind::Exp, &[x.output(0)], Attributes::new())?;
//! graph.add_result("out", exp.output(0))?;
//!
//! // Swap exp for something else, atomically
//! graph.transaction(|g| {
//!     let tanh = g.add_node(OpKind::Tanh, &[x.output(0)], Attributes::new())?;
//!     g.replace_node(exp, &[tanh.output(0)])?;
//!     Ok(true)
//! })?;
//! ```
//!
//! # Mutation primitives
//!
//! | Method | Effect |
//! |--------|--------|
//! | `add_node` | create a node, infer its outputs, attach back-edges |
//! | `replace_node` | redirect consumers, remove the old node and orphans |
//! | `copy_metadata` | merge metadata under a [`MergePolicy`] |
//! | `transaction` | all-or-nothing grouping of the above |

pub mod accessors;
pub mod context;
pub(crate) mod journal;
pub mod maps;
pub mod metadata;
pub mod mutators;
pub mod validation;

// Re-export main types
pub use context::Graph;
pub use maps::{ConsumerList, InputList, InputSlot, Node, NodeId, Output, OutputRef};
pub use metadata::{
    merge_metadata, merge_provenance, MergePolicy, MetaValue, Metadata, ORIGINAL_NAMES,
};
