//! Graph finalization module
//!
//! This module provides the provenance sink of a rewrite session:
//!
//! - [`Finalizer`]: Fluent builder for exporting a graph
//! - [`finalize`]: Validate and export with default settings
//!
//! # Overview
//!
//! After rewrites are applied to a `Graph`, the builder module validates it
//! and exports an immutable [`FinalizedGraph`] together with the provenance
//! of every node (label and original layer names), unchanged.
//!
//! # Example
//!
//! ```ignore
//! use graph_rewrite::builder::{finalize, Finalizer};
//!
//! // Using Finalizer (fluent API)
//! let exported = Finalizer::new(graph)
//!     .prune(true)
//!     .require_coverage(true)
//!     .build()?;
//!
//! // Or using the simple function
//! let exported = finalize(graph)?;
//! for (id, entry) in &exported.provenance {
//!     println!("{} {} <- {}", id, entry.label, entry.names.join(","));
//! }
//! ```

pub mod finalize;

// Re-export main types and functions
pub use finalize::{finalize, FinalizedGraph, Finalizer, Provenance};
