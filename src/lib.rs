//! # Graph Rewrite
//!
//! Pattern-matching rewrite engine for dataflow computation graphs.
//!
//! This crate provides a mutable graph of typed operators, a declarative
//! pattern language, and a pass manager that applies rewrite rules until
//! the graph stops changing.
//!
//! ## Features
//!
//! - **Graph Model**: Typed nodes with explicit producer/consumer edges
//! - **Pattern Matching**: Bind subgraph shapes with kind and predicate constraints
//! - **Rewrite Rules**: Transactional callbacks that replace matched subgraphs
//! - **Provenance**: Original layer names survive every fusion and decomposition
//!
//! ## Example
//!
//! ```ignore
//! use graph_rewrite::prelude::*;
//!
//! let mut graph = Graph::new();
//! let x = graph.add_parameter("x", TensorDesc::new(ElementType::F32, &[1, 8]))?;
//! let mish = graph.add_node(OpKind::Mish, &[x.output(0)], Attributes::new())?;
//! graph.add_result("out", mish.output(0))?;
//!
//! let report = RewritePipeline::default().run(&mut graph)?;
//! let exported = finalize(graph)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod builder;
pub mod error;
pub mod graph;
pub mod opset;
pub mod pattern;
pub mod tensor;
pub mod traits;
pub mod transform;
pub mod transformers;

#[cfg(test)]
mod test;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use graph_rewrite::prelude::*`
pub mod prelude {
    pub use crate::builder::{finalize, FinalizedGraph, Finalizer, Provenance};
    pub use crate::error::{RewriteError, RewriteResult, StructuralError};
    pub use crate::graph::{Graph, MergePolicy, MetaValue, NodeId, OutputRef, ORIGINAL_NAMES};
    pub use crate::opset::{Attributes, OpKind, OpRegistry};
    pub use crate::pattern::{matcher, Match, Pattern, PatternBuilder};
    pub use crate::tensor::{ConstantData, ElementType, TensorDesc};
    pub use crate::traits::{GraphPass, PassChain};
    pub use crate::transform::{PassConfig, PassManager, PassReport, PassState, RewriteRule};
    pub use crate::transformers::{RewritePipeline, Transformation};
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{RewriteError, RewriteResult};
pub use graph::Graph;
pub use traits::GraphPass;
pub use transform::PassManager;

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
