use criterion::{black_box, criterion_group, criterion_main, Criterion};
use workgraph_core::{ExecutionContext, GraphBuilder, Run, RunOptions, END};

async fn increment(_ctx: ExecutionContext, state: i32) -> Result<i32, workgraph_core::StepError> {
    Ok(state + 1)
}

fn straight_line_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", increment)
        .unwrap()
        .add_node("b", increment)
        .unwrap()
        .add_node("c", increment)
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", "c")
        .unwrap()
        .add_edge("c", END)
        .unwrap()
        .set_entry("a")
        .unwrap()
        .compile()
        .unwrap();
    let run = Run::new(graph);

    c.bench_function("three node straight line run", |b| {
        b.to_async(&runtime).iter(|| async {
            let outcome = run
                .execute(ExecutionContext::new(), black_box(0), RunOptions::default())
                .await;
            black_box(outcome);
        });
    });
}

fn conditional_loop_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", increment)
        .unwrap()
        .add_conditional_edge("a", |_ctx, s: i32| async move {
            if s >= 50 {
                END.to_string()
            } else {
                "a".to_string()
            }
        })
        .unwrap()
        .set_entry("a")
        .unwrap()
        .compile()
        .unwrap();
    let run = Run::new(graph);

    c.bench_function("fifty iteration conditional loop", |b| {
        b.to_async(&runtime).iter(|| async {
            let outcome = run
                .execute(ExecutionContext::new(), black_box(0), RunOptions::default())
                .await;
            black_box(outcome);
        });
    });
}

criterion_group!(benches, straight_line_benchmark, conditional_loop_benchmark);
criterion_main!(benches);
