//! Mish decomposition
//!
//! `Mish(x) = x * tanh(softplus(x))` is lowered to primitive element-wise
//! operators for backends without a fused Mish kernel:
//!
//! ```text
//! x ─┬─ Exp ─ Add(1) ─ Log ─ Tanh ─┐
//!    └─────────────────────────── Multiply ─→
//! ```

use crate::error::RewriteResult;
use crate::graph::Graph;
use crate::opset::{Attributes, OpKind};
use crate::pattern::{predicates, Match, PatternBuilder, PatternId};
use crate::tensor::{scalar_f32, ElementType};
use crate::transform::RewriteRule;

use super::common::{finish_replacement, inherit_provenance, Transformation};

/// Lower f32 Mish into Exp, Add, Log, Tanh and Multiply
#[derive(Debug, Default)]
pub struct DecomposeMish;

impl DecomposeMish {
    /// Create the transformation
    pub fn new() -> Self {
        Self
    }
}

impl Transformation for DecomposeMish {
    fn name(&self) -> &'static str {
        "DecomposeMish"
    }

    fn rule(&self) -> RewriteRule {
        let mut p = PatternBuilder::new();
        let input = p.any();
        let mish = p.op(OpKind::Mish, [input]);
        p.with_predicate(mish, "f32", predicates::element_type(ElementType::F32));

        RewriteRule::new(self.name(), p.build(mish), move |graph, m| {
            decompose(graph, m, input)
        })
    }
}

fn decompose(graph: &mut Graph, m: &Match, input: PatternId) -> RewriteResult<bool> {
    let Some(x) = m.output(input) else {
        return Ok(false);
    };
    let mish = m.root();

    let exp = graph.add_node(OpKind::Exp, &[x], Attributes::new())?;
    let one = graph.add_constant("one", scalar_f32(1.0))?;
    let add = graph.add_node(
        OpKind::Add,
        &[exp.output(0), one.output(0)],
        Attributes::new(),
    )?;
    let log = graph.add_node(OpKind::Log, &[add.output(0)], Attributes::new())?;
    let tanh = graph.add_node(OpKind::Tanh, &[log.output(0)], Attributes::new())?;
    let mul = graph.add_node(
        OpKind::Multiply,
        &[x, tanh.output(0)],
        Attributes::new(),
    )?;

    inherit_provenance(
        graph,
        mish,
        &[
            (exp, "exp"),
            (one, "one"),
            (add, "add"),
            (log, "log"),
            (tanh, "tanh"),
        ],
    )?;
    finish_replacement(graph, mish, mul, &[mul.output(0)])?;
    Ok(true)
}
