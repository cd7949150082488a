//! Property tests for rule application and provenance merging.

use proptest::prelude::*;

use crate::graph::{merge_provenance, Graph};
use crate::opset::OpKind;
use crate::pattern::{Match, PatternBuilder};
use crate::tensor::{ElementType, TensorDesc};
use crate::transform::{PassManager, PassState, RewriteRule};
use crate::transformers::RewritePipeline;

use super::generators::*;

/// Rule that scribbles on the graph and then declines
fn scribbling_rule() -> RewriteRule {
    let mut p = PatternBuilder::new();
    let root = p.wrap_any_of(&[OpKind::Exp, OpKind::Log, OpKind::Tanh]);
    RewriteRule::new("Scribble", p.build(root), |graph: &mut Graph, m: &Match| {
        let desc = graph
            .output_desc(m.root().output(0))
            .cloned()
            .unwrap_or_else(|| TensorDesc::scalar(ElementType::F32));
        graph.set_label(m.root(), "scribbled")?;
        graph.add_parameter("stray", desc)?;
        Ok(false)
    })
}

// ============================================================================
// No-op Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A graph with nothing to rewrite is left untouched
    #[test]
    fn inert_graph_unchanged(recipe in arb_inert_recipe()) {
        let (mut graph, _) = build_graph(&recipe);
        let before = graph.clone();

        let report = RewritePipeline::default().run(&mut graph).unwrap();

        prop_assert!(!report.changed());
        prop_assert_eq!(report.state, PassState::Converged);
        prop_assert_eq!(graph, before);
    }

    /// Declining after mutating rolls every mutation back
    #[test]
    fn declined_rewrite_is_noop(recipe in arb_recipe()) {
        let (mut graph, _) = build_graph(&recipe);
        let before = graph.clone();

        let manager = PassManager::new().add_rule(scribbling_rule());
        let report = manager.run(&mut graph).unwrap();

        prop_assert_eq!(report.rewrites_applied, 0);
        prop_assert_eq!(graph, before);
    }
}

// ============================================================================
// Pipeline Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Rewrites keep the graph well formed and every result's descriptor
    #[test]
    fn pipeline_preserves_results(recipe in arb_recipe()) {
        let (mut graph, out) = build_graph(&recipe);
        let expected = result_descs(&graph);

        let report = RewritePipeline::default().run(&mut graph).unwrap();

        prop_assert!(report.converged());
        prop_assert_eq!(report.changed(), recipe.has_rewritable_step());
        prop_assert!(graph.contains(out));
        prop_assert_eq!(result_descs(&graph), expected);
        prop_assert!(graph.validate().is_ok());
        prop_assert!(graph.validate_coverage().is_ok());
    }

    /// No rewritable pattern survives a converged run
    #[test]
    fn pipeline_eliminates_targets(recipe in arb_recipe()) {
        let (mut graph, _) = build_graph(&recipe);
        RewritePipeline::default().run(&mut graph).unwrap();

        prop_assert!(graph.find_nodes_by_kind(OpKind::Mish).is_empty());
        prop_assert!(graph.find_nodes_by_kind(OpKind::ShuffleChannels).is_empty());
        if recipe.batch == 1 {
            prop_assert!(graph.find_nodes_by_kind(OpKind::Concat).is_empty());
        } else {
            prop_assert!(graph.find_nodes_by_kind(OpKind::ConcatOptimized).is_empty());
        }
    }

    /// A second run over a converged graph changes nothing
    #[test]
    fn pipeline_is_idempotent(recipe in arb_recipe()) {
        let (mut graph, _) = build_graph(&recipe);
        RewritePipeline::default().run(&mut graph).unwrap();
        let converged = graph.clone();

        let report = RewritePipeline::default().run(&mut graph).unwrap();

        prop_assert_eq!(report.rewrites_applied, 0);
        prop_assert_eq!(report.iterations, 1);
        prop_assert!(!report.changed());
        prop_assert_eq!(graph, converged);
    }
}

// ============================================================================
// Provenance Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The label leads, followed by existing names then incoming ones
    #[test]
    fn provenance_keeps_order(existing in arb_names(), incoming in arb_names()) {
        let merged = merge_provenance("fused", &existing, &incoming);

        prop_assert_eq!(merged[0].as_str(), "fused");
        let tail: Vec<String> = existing.iter().chain(incoming.iter()).cloned().collect();
        prop_assert_eq!(&merged[1..], &tail[..]);
    }

    /// Merging twice equals merging the concatenated inputs once
    #[test]
    fn provenance_merge_associates(
        existing in arb_names(),
        first in arb_names(),
        second in arb_names(),
    ) {
        let stepwise = merge_provenance(
            "fused",
            &merge_provenance("fused", &existing, &first),
            &second,
        );
        let both: Vec<String> = first.iter().chain(second.iter()).cloned().collect();
        let at_once = merge_provenance("fused", &existing, &both);

        prop_assert_eq!(stepwise, at_once);
    }
}
