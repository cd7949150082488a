//! Generators for property-based testing.
//!
//! Graphs are generated as recipes (a base shape plus a chain of steps) and
//! then materialized, so that shrinking works on the recipe rather than on
//! the arena.

use proptest::prelude::*;

use crate::graph::{Graph, NodeId, OutputRef};
use crate::opset::{Attributes, OpKind};
use crate::tensor::{ElementType, TensorDesc};

// ============================================================================
// Recipes
// ============================================================================

/// One node appended to the chain
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Shape-preserving unary op
    Unary(OpKind),
    /// Mish activation
    Mish,
    /// Concat with a fresh parameter along axis 1
    Concat,
    /// ShuffleChannels along axis 1
    Shuffle {
        /// Group count, divides the channel count
        group: i64,
    },
}

/// A chain graph: `x → step → step → … → out`
#[derive(Debug, Clone)]
pub struct GraphRecipe {
    /// Leading dimension, 1 makes Concat fusible
    pub batch: usize,
    /// Channel dimension, always even
    pub channels: usize,
    /// Trailing dimension
    pub width: usize,
    /// Chain steps
    pub steps: Vec<Step>,
}

impl GraphRecipe {
    /// Whether any step is touched by a bundled rule
    pub fn has_rewritable_step(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, Step::Mish | Step::Shuffle { .. }) || (*s == Step::Concat && self.batch == 1))
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Generate a step that no bundled rule rewrites
pub fn arb_inert_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Unary(OpKind::Exp)),
        Just(Step::Unary(OpKind::Log)),
        Just(Step::Unary(OpKind::Tanh)),
    ]
}

/// Generate any step
pub fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => arb_inert_step(),
        2 => Just(Step::Mish),
        1 => Just(Step::Concat),
        1 => prop_oneof![Just(1i64), Just(2i64)].prop_map(|group| Step::Shuffle { group }),
    ]
}

fn arb_recipe_with(step: BoxedStrategy<Step>, max_steps: usize) -> impl Strategy<Value = GraphRecipe> {
    (
        1usize..=2,
        prop_oneof![Just(2usize), Just(4usize)],
        1usize..=3,
        prop::collection::vec(step, 1..=max_steps),
    )
        .prop_map(|(batch, channels, width, steps)| GraphRecipe {
            batch,
            channels,
            width,
            steps,
        })
}

/// Generate an arbitrary chain recipe
pub fn arb_recipe() -> impl Strategy<Value = GraphRecipe> {
    arb_recipe_with(arb_step().boxed(), 6)
}

/// Generate a recipe that no bundled rule can rewrite
pub fn arb_inert_recipe() -> impl Strategy<Value = GraphRecipe> {
    arb_recipe_with(arb_inert_step().boxed(), 6)
}

/// Generate a short list of layer names from a small alphabet
pub fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![Just("a"), Just("b"), Just("conv"), Just("mish")].prop_map(String::from),
        0..4,
    )
}

// ============================================================================
// Materialization
// ============================================================================

/// Build the graph described by `recipe`, returning it with its result node
pub fn build_graph(recipe: &GraphRecipe) -> (Graph, NodeId) {
    let mut graph = Graph::new();
    let mut channels = recipe.channels;
    let desc = |channels: usize| {
        TensorDesc::new(ElementType::F32, &[recipe.batch, channels, recipe.width])
    };

    let x = graph.add_parameter("x", desc(channels)).unwrap();
    let mut current: OutputRef = x.output(0);

    for (i, step) in recipe.steps.iter().enumerate() {
        let node = match step {
            Step::Unary(kind) => graph.add_node(*kind, &[current], Attributes::new()),
            Step::Mish => graph.add_node(OpKind::Mish, &[current], Attributes::new()),
            Step::Concat => {
                let y = graph
                    .add_parameter(&format!("y{}", i), desc(channels))
                    .unwrap();
                channels *= 2;
                graph.add_node(
                    OpKind::Concat,
                    &[current, y.output(0)],
                    Attributes::new().with("axis", 1i64),
                )
            }
            Step::Shuffle { group } => graph.add_node(
                OpKind::ShuffleChannels,
                &[current],
                Attributes::new().with("axis", 1i64).with("group", *group),
            ),
        }
        .unwrap();
        current = node.output(0);
    }

    let out = graph.add_result("out", current).unwrap();
    (graph, out)
}

/// Descriptor observed by each result sink
pub fn result_descs(graph: &Graph) -> Vec<Option<TensorDesc>> {
    graph
        .results()
        .iter()
        .map(|&r| {
            graph
                .producer_of(r, 0)
                .and_then(|o| graph.output_desc(o))
                .cloned()
        })
        .collect()
}
