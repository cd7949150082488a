//! Benchmark for rewrite sessions
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use graph_rewrite::prelude::*;

/// `width` parallel Mish → Concat(axis 1) → ShuffleChannels branches over one input
fn branchy_graph(width: usize) -> Graph {
    let mut graph = Graph::new();
    let desc = TensorDesc::new(ElementType::F32, &[1, 8, 16, 16]);
    let x = graph.add_parameter("x", desc.clone()).unwrap();

    for i in 0..width {
        let mish = graph
            .add_node(OpKind::Mish, &[x.output(0)], Attributes::new())
            .unwrap();
        let skip = graph
            .add_parameter(&format!("skip{}", i), desc.clone())
            .unwrap();
        let concat = graph
            .add_node(
                OpKind::Concat,
                &[mish.output(0), skip.output(0)],
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
        graph
            .add_result(&format!("out{}", i), shuffle.output(0))
            .unwrap();
    }

    graph
}

fn transform_benchmark(c: &mut Criterion) {
    let pipeline = RewritePipeline::default();

    for width in [4usize, 16, 64] {
        c.bench_function(&format!("pipeline_width_{}", width), |b| {
            b.iter_batched(
                || branchy_graph(width),
                |mut graph| black_box(pipeline.run(&mut graph).unwrap()),
                BatchSize::SmallInput,
            )
        });
    }

    c.bench_function("finalize_width_16", |b| {
        b.iter_batched(
            || {
                let mut graph = branchy_graph(16);
                pipeline.run(&mut graph).unwrap();
                graph
            },
            |graph| black_box(finalize(graph).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, transform_benchmark);
criterion_main!(benches);
