//! Graph transformation module
//!
//! This module provides the rewrite infrastructure:
//!
//! - [`RewriteRule`]: a pattern plus a transactional callback
//! - [`PassManager`]: fixed-point driver over rules and whole-graph passes
//!
//! # Overview
//!
//! Rewrites work on a [`Graph`](crate::graph::Graph) and modify it in-place.
//! The typical workflow is:
//!
//! 1. Declare a pattern and wrap it in a `RewriteRule`
//! 2. Register rules (and passes) on a `PassManager`
//! 3. Run the manager and inspect the `PassReport`
//!
//! # Example
//!
//! ```ignore
//! use graph_rewrite::transform::{PassManager, RewriteRule};
//!
//! let rule = RewriteRule::new("ExpToTanh", pattern, |graph, m| {
//!     let input = graph.producer_of(m.root(), 0).unwrap();
//!     let tanh = graph.add_node(OpKind::Tanh, &[input], Attributes::new())?;
//!     graph.replace_node(m.root(), &[tanh.output(0)])?;
//!     Ok(true)
//! });
//!
//! let report = PassManager::new().add_rule(rule).run(&mut graph)?;
//! assert!(report.converged());
//! ```

pub mod core;
pub mod rule;

// Re-export main types and functions
pub use self::core::{
    rewrite_once, rewrite_until_fixed_point, PassConfig, PassManager, PassReport, PassState,
    RuleFailure,
};
pub use rule::{RewriteCallback, RewriteRule, RuleOutcome};
