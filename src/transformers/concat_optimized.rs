//! Concat to ConcatOptimized
//!
//! A concatenation whose dimensions before the axis multiply to 1 reduces to
//! copying each input as one contiguous chunk. Such concats are swapped for
//! `ConcatOptimized` with the same inputs and axis.

use tracing::trace;

use crate::error::RewriteResult;
use crate::graph::{Graph, Node};
use crate::opset::{Attributes, OpKind};
use crate::pattern::{Match, PatternBuilder};
use crate::tensor::outer_size;
use crate::transform::RewriteRule;

use super::common::{finish_replacement, root_node, Transformation};

/// Fuse contiguous concatenations
#[derive(Debug, Default)]
pub struct ConcatTransformation;

impl ConcatTransformation {
    /// Create the transformation
    pub fn new() -> Self {
        Self
    }
}

impl Transformation for ConcatTransformation {
    fn name(&self) -> &'static str {
        "ConcatTransformation"
    }

    fn rule(&self) -> RewriteRule {
        let mut p = PatternBuilder::new();
        let concat = p.wrap_type(OpKind::Concat);
        RewriteRule::new(self.name(), p.build(concat), change_concat_to_concat_optimized)
    }
}

/// Check whether `concat` can be copied chunk by chunk
///
/// Requires no constant input, a non-negative in-range axis and a product
/// of 1 over the output dimensions before the axis.
pub fn is_fusible_concat(graph: &Graph, concat: &Node) -> bool {
    if concat
        .inputs()
        .iter()
        .any(|input| graph.is_constant(input.node))
    {
        trace!(node = %concat.id(), "concat has a constant input");
        return false;
    }

    let Some(output) = concat.output_desc(0) else {
        return false;
    };
    let axis = match concat.attributes().get_int("axis") {
        Some(axis) if axis >= 0 && (axis as usize) < output.rank() => axis as usize,
        _ => return false,
    };

    outer_size(&output.shape, axis) == 1
}

fn change_concat_to_concat_optimized(graph: &mut Graph, m: &Match) -> RewriteResult<bool> {
    let concat = root_node(graph, m)?;
    if !is_fusible_concat(graph, concat) {
        return Ok(false);
    }

    let old = concat.id();
    let inputs = concat.inputs().to_vec();
    let axis = concat.attributes().get_int("axis").unwrap_or(0);

    let optimized = graph.add_node(
        OpKind::ConcatOptimized,
        &inputs,
        Attributes::new().with("axis", axis),
    )?;
    finish_replacement(graph, old, optimized, &[optimized.output(0)])?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MetaValue, NodeId, ORIGINAL_NAMES};
    use crate::tensor::{vec_to_f32, ElementType, TensorDesc};

    fn concat_graph(dims: &[&[usize]], axis: i64) -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let inputs: Vec<_> = dims
            .iter()
            .enumerate()
            .map(|(i, d)| {
                graph
                    .add_parameter(&format!("in{}", i), TensorDesc::new(ElementType::F32, d))
                    .unwrap()
                    .output(0)
            })
            .collect();
        let concat = graph
            .add_node(OpKind::Concat, &inputs, Attributes::new().with("axis", axis))
            .unwrap();
        graph.set_label(concat, "Concat").unwrap();
        graph
            .set_metadata(
                concat,
                ORIGINAL_NAMES,
                MetaValue::Names(vec!["concat_original".into()]),
            )
            .unwrap();
        let out = graph.add_result("out", concat.output(0)).unwrap();
        (graph, concat, out)
    }

    #[test]
    fn test_fuses_contiguous_concat() {
        let (mut graph, concat, out) = concat_graph(&[&[1, 2, 4], &[1, 3, 4], &[1, 1, 4]], 1);
        let expected = graph.output_desc(concat.output(0)).cloned();

        let applied = ConcatTransformation::new().apply(&mut graph).unwrap();
        assert_eq!(applied, 1);

        let fused = graph.producer_of(out, 0).unwrap().node;
        let node = graph.node(fused).unwrap();
        assert_eq!(node.kind(), OpKind::ConcatOptimized);
        assert_eq!(node.label(), "Concat");
        assert_eq!(node.attributes().get_int("axis"), Some(1));
        assert_eq!(node.inputs().len(), 3);
        assert_eq!(graph.output_desc(fused.output(0)).cloned(), expected);
        assert_eq!(
            node.metadata()[ORIGINAL_NAMES].to_string(),
            "Concat,concat_original"
        );
        assert!(!graph.contains(concat));
    }

    #[test]
    fn test_declines_constant_input() {
        let mut graph = Graph::new();
        let a = graph
            .add_parameter("a", TensorDesc::new(ElementType::F32, &[1, 2]))
            .unwrap();
        let c = graph
            .add_constant("c", vec_to_f32(vec![0.0; 2], &[1, 2]).unwrap())
            .unwrap();
        let concat = graph
            .add_node(
                OpKind::Concat,
                &[a.output(0), c.output(0)],
                Attributes::new().with("axis", 1i64),
            )
            .unwrap();
        graph.add_result("out", concat.output(0)).unwrap();
        let before = graph.clone();

        assert_eq!(ConcatTransformation::new().apply(&mut graph).unwrap(), 0);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_declines_outer_product_above_one() {
        let (mut graph, _, _) = concat_graph(&[&[2, 2, 4], &[2, 3, 4]], 1);
        let before = graph.clone();

        assert_eq!(ConcatTransformation::new().apply(&mut graph).unwrap(), 0);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_declines_negative_axis() {
        let (mut graph, _, _) = concat_graph(&[&[1, 2], &[1, 3]], -1);
        let before = graph.clone();

        assert_eq!(ConcatTransformation::new().apply(&mut graph).unwrap(), 0);
        assert_eq!(graph, before);
    }

    #[test]
    fn test_axis_zero_always_fuses() {
        let (mut graph, _, _) = concat_graph(&[&[2, 4], &[3, 4]], 0);
        assert_eq!(ConcatTransformation::new().apply(&mut graph).unwrap(), 1);
        assert_eq!(graph.find_nodes_by_kind(OpKind::ConcatOptimized).len(), 1);
    }
}
