//! Bundled transformations
//!
//! This module provides ready-to-use rewrites built on the engine:
//!
//! - **Fusion**: Concat → ConcatOptimized when chunks are contiguous
//! - **Decomposition**: Mish → Exp/Add/Log/Tanh/Multiply
//! - **Lowering**: ShuffleChannels → Reshape/Transpose/Reshape
//! - **Elimination**: remove nodes nobody reads
//!
//! # Overview
//!
//! Each rule-based transformation implements [`Transformation`] and can be
//! applied on its own or registered on a
//! [`PassManager`](crate::transform::PassManager).
//!
//! # Example
//!
//! ```ignore
//! use graph_rewrite::transformers::{ConcatTransformation, Transformation};
//!
//! let fused = ConcatTransformation::new().apply(&mut graph)?;
//! println!("Fused {} concats", fused);
//! ```
//!
//! # Using RewritePipeline
//!
//! For convenience, use [`RewritePipeline`] to run everything to a fixed
//! point:
//!
//! ```ignore
//! use graph_rewrite::transformers::RewritePipeline;
//!
//! let report = RewritePipeline::default().run(&mut graph)?;
//! ```

/// Common utilities and types
pub mod common;
/// Concat to ConcatOptimized
pub mod concat_optimized;
/// ShuffleChannels lowering
pub mod convert_shuffle_channels;
/// Mish decomposition
pub mod decompose_mish;
/// Elimination passes
pub mod eliminate;

// Re-export common types
pub use common::{
    derive_label, finish_replacement, inherit_provenance, input_desc, root_node, Transformation,
};

pub use concat_optimized::{is_fusible_concat, ConcatTransformation};
pub use convert_shuffle_channels::ConvertShuffleChannels;
pub use decompose_mish::DecomposeMish;
pub use eliminate::EliminateDeadNodes;

use crate::error::RewriteResult;
use crate::graph::Graph;
use crate::transform::{PassConfig, PassManager, PassReport, RewriteRule};

/// Rules of every bundled transformation, in registration order
pub fn standard_rules() -> Vec<RewriteRule> {
    vec![
        ConcatTransformation::new().rule(),
        DecomposeMish::new().rule(),
        ConvertShuffleChannels::new().rule(),
    ]
}

/// Pass manager with every bundled rule and pass
pub fn standard_pipeline() -> PassManager {
    RewritePipeline::default().build()
}

/// Selection of bundled rewrites, run to a fixed point
#[derive(Debug, Clone)]
pub struct RewritePipeline {
    /// Enable Concat → ConcatOptimized
    pub fuse_concat: bool,
    /// Enable Mish decomposition
    pub decompose_mish: bool,
    /// Enable ShuffleChannels lowering
    pub lower_shuffle_channels: bool,
    /// Enable dead-node elimination
    pub eliminate: bool,
    /// Pass manager settings
    pub config: PassConfig,
}

impl Default for RewritePipeline {
    fn default() -> Self {
        Self {
            fuse_concat: true,
            decompose_mish: true,
            lower_shuffle_channels: true,
            eliminate: true,
            config: PassConfig::default(),
        }
    }
}

impl RewritePipeline {
    /// Create a new pipeline with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable only the fusion rule
    pub fn fuse_only() -> Self {
        Self {
            fuse_concat: true,
            decompose_mish: false,
            lower_shuffle_channels: false,
            eliminate: false,
            config: PassConfig::default(),
        }
    }

    /// Enable only the decomposition and lowering rules
    pub fn decompose_only() -> Self {
        Self {
            fuse_concat: false,
            decompose_mish: true,
            lower_shuffle_channels: true,
            eliminate: false,
            config: PassConfig::default(),
        }
    }

    /// Replace the pass manager settings
    pub fn with_config(mut self, config: PassConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pass manager
    pub fn build(&self) -> PassManager {
        let mut manager = PassManager::new().with_config(self.config.clone());

        if self.fuse_concat {
            manager.register_rule(ConcatTransformation::new().rule());
        }
        if self.decompose_mish {
            manager.register_rule(DecomposeMish::new().rule());
        }
        if self.lower_shuffle_channels {
            manager.register_rule(ConvertShuffleChannels::new().rule());
        }
        if self.eliminate {
            manager.register_pass(EliminateDeadNodes::new());
        }

        manager
    }

    /// Run the pipeline on one graph
    pub fn run(&self, graph: &mut Graph) -> RewriteResult<PassReport> {
        self.build().run(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opset::{Attributes, OpKind};
    use crate::tensor::{ElementType, TensorDesc};

    // x ─ Mish ─┐
    // y ────────┴ Concat(axis 1) ─ ShuffleChannels(group 2) ─ out
    fn make_test_graph() -> Graph {
        let mut graph = Graph::new();
        let x = graph
            .add_parameter("x", TensorDesc::new(ElementType::F32, &[1, 2, 4]))
            .unwrap();
        let y = graph
            .add_parameter("y", TensorDesc::new(ElementType::F32, &[1, 2, 4]))
            .unwrap();
        let mish = graph.add_node(OpKind::Mish, &[x.output(0)], Attributes::new()).unwrap();
        let concat = graph
            .add_node(
                OpKind::Concat,
                &[mish.output(0), y.output(0)],
                Attributes::new().with("axis", 1i64),
            )
            .unwrap();
        let shuffle = graph
            .add_node(
                OpKind::ShuffleChannels,
                &[concat.output(0)],
                Attributes::new().with("axis", 1i64).with("group", 2i64),
            )
            .unwrap();
        graph.add_result("out", shuffle.output(0)).unwrap();
        graph
    }

    #[test]
    fn test_rewrite_pipeline() {
        let mut graph = make_test_graph();
        let report = RewritePipeline::default().run(&mut graph).unwrap();

        assert!(report.converged());
        assert_eq!(report.applied("ConcatTransformation"), 1);
        assert_eq!(report.applied("DecomposeMish"), 1);
        assert_eq!(report.applied("ConvertShuffleChannels"), 1);
        assert!(graph.find_nodes_by_kind(OpKind::Mish).is_empty());
        assert!(graph.find_nodes_by_kind(OpKind::Concat).is_empty());
        assert!(graph.find_nodes_by_kind(OpKind::ShuffleChannels).is_empty());
        assert!(graph.validate().is_ok());
        assert!(graph.validate_coverage().is_ok());
    }

    #[test]
    fn test_fuse_only_pipeline() {
        let mut graph = make_test_graph();
        let report = RewritePipeline::fuse_only().run(&mut graph).unwrap();

        assert_eq!(report.rewrites_applied, 1);
        assert_eq!(graph.find_nodes_by_kind(OpKind::Mish).len(), 1);
        assert_eq!(graph.find_nodes_by_kind(OpKind::ConcatOptimized).len(), 1);
    }

    #[test]
    fn test_standard_pipeline_contents() {
        let manager = standard_pipeline();
        let names: Vec<&str> = manager.rules().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec!["ConcatTransformation", "DecomposeMish", "ConvertShuffleChannels"]
        );
        assert_eq!(manager.pass_names(), vec!["EliminateDeadNodes"]);
        assert_eq!(standard_rules().len(), 3);
    }
}
