//! ShuffleChannels lowering
//!
//! `ShuffleChannels(x, axis, group)` over a static shape becomes
//!
//! ```text
//! Reshape [outer, group, C / group, inner]
//!   → Transpose [0, 2, 1, 3]
//!   → Reshape (original shape)
//! ```
//!
//! where `C` is the channel dimension and `outer` / `inner` are the products
//! of the dimensions before and after it.

use crate::error::RewriteResult;
use crate::graph::Graph;
use crate::opset::{Attributes, OpKind};
use crate::pattern::{Match, PatternBuilder};
use crate::tensor::{inner_size, normalize_axis, outer_size};
use crate::transform::RewriteRule;

use super::common::{finish_replacement, inherit_provenance, input_desc, root_node, Transformation};

/// Lower ShuffleChannels into Reshape, Transpose and Reshape
#[derive(Debug, Default)]
pub struct ConvertShuffleChannels;

impl ConvertShuffleChannels {
    /// Create the transformation
    pub fn new() -> Self {
        Self
    }
}

impl Transformation for ConvertShuffleChannels {
    fn name(&self) -> &'static str {
        "ConvertShuffleChannels"
    }

    fn rule(&self) -> RewriteRule {
        let mut p = PatternBuilder::new();
        let input = p.any();
        let shuffle = p.op(OpKind::ShuffleChannels, [input]);
        RewriteRule::new(self.name(), p.build(shuffle), lower_shuffle_channels)
    }
}

fn lower_shuffle_channels(graph: &mut Graph, m: &Match) -> RewriteResult<bool> {
    let node = root_node(graph, m)?;
    let shuffle = node.id();
    let axis = node.attributes().get_int("axis").unwrap_or(1);
    let group = node.attributes().get_int("group").unwrap_or(1);
    let Some(x) = node.input(0) else {
        return Ok(false);
    };

    let desc = input_desc(graph, shuffle, 0)?;
    let Some(axis) = normalize_axis(axis, desc.rank()) else {
        return Ok(false);
    };
    let channels = desc.shape[axis];
    if group < 1 || channels % group as usize != 0 {
        return Ok(false);
    }

    let split = vec![
        outer_size(&desc.shape, axis) as i64,
        group,
        (channels / group as usize) as i64,
        inner_size(&desc.shape, axis) as i64,
    ];
    let original: Vec<i64> = desc.shape.iter().map(|&d| d as i64).collect();

    let reshape = graph.add_node(
        OpKind::Reshape,
        &[x],
        Attributes::new().with("shape", split),
    )?;
    let transpose = graph.add_node(
        OpKind::Transpose,
        &[reshape.output(0)],
        Attributes::new().with("perm", vec![0i64, 2, 1, 3]),
    )?;
    let restore = graph.add_node(
        OpKind::Reshape,
        &[transpose.output(0)],
        Attributes::new().with("shape", original),
    )?;

    inherit_provenance(
        graph,
        shuffle,
        &[(reshape, "reshape"), (transpose, "transpose")],
    )?;
    finish_replacement(graph, shuffle, restore, &[restore.output(0)])?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use crate::tensor::{ElementType, TensorDesc};

    fn shuffle_graph(dims: &[usize], axis: i64, group: i64) -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let x = graph
            .add_parameter("x", TensorDesc::new(ElementType::F32, dims))
            .unwrap();
        let shuffle = graph
            .add_node(
                OpKind::ShuffleChannels,
                &[x.output(0)],
                Attributes::new().with("axis", axis).with("group", group),
            )
            .unwrap();
        let out = graph.add_result("out", shuffle.output(0)).unwrap();
        (graph, shuffle, out)
    }

    #[test]
    fn test_lowers_shuffle_channels() {
        let (mut graph, shuffle, out) = shuffle_graph(&[2, 6, 4, 4], 1, 3);
        let expected = graph.output_desc(shuffle.output(0)).cloned();
        let label = graph.node(shuffle).unwrap().label().to_string();

        assert_eq!(ConvertShuffleChannels::new().apply(&mut graph).unwrap(), 1);
        assert!(graph.validate().is_ok());

        let restore = graph.producer_of(out, 0).unwrap().node;
        let transpose = graph.producer_of(restore, 0).unwrap().node;
        let reshape = graph.producer_of(transpose, 0).unwrap().node;

        assert_eq!(graph.node(restore).unwrap().kind(), OpKind::Reshape);
        assert_eq!(graph.node(restore).unwrap().label(), label);
        assert_eq!(graph.output_desc(restore.output(0)).cloned(), expected);
        assert_eq!(
            graph.node(transpose).unwrap().attributes().get_ints("perm"),
            Some(&[0i64, 2, 1, 3][..])
        );
        assert_eq!(
            graph.output_desc(reshape.output(0)),
            Some(&TensorDesc::new(ElementType::F32, &[2, 3, 2, 16]))
        );
        assert_eq!(
            graph.output_desc(transpose.output(0)),
            Some(&TensorDesc::new(ElementType::F32, &[2, 2, 3, 16]))
        );
    }

    #[test]
    fn test_negative_axis() {
        let (mut graph, _, out) = shuffle_graph(&[4, 6], -1, 2);
        assert_eq!(ConvertShuffleChannels::new().apply(&mut graph).unwrap(), 1);

        let restore = graph.producer_of(out, 0).unwrap().node;
        let transpose = graph.producer_of(restore, 0).unwrap().node;
        let reshape = graph.producer_of(transpose, 0).unwrap().node;
        assert_eq!(
            graph.output_desc(reshape.output(0)),
            Some(&TensorDesc::new(ElementType::F32, &[4, 2, 3, 1]))
        );
    }
}
