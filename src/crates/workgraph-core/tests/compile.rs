//! Compile-time validation: entry points, dangling edges, and cycle-exit
//! checking against real graph shapes.

use workgraph_core::{CompileFinding, ExecutionContext, GraphBuilder, END};

async fn passthrough(_ctx: ExecutionContext, state: i32) -> Result<i32, workgraph_core::StepError> {
    Ok(state)
}

#[test]
fn three_node_pipeline_compiles() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("fetch", passthrough)
        .unwrap()
        .add_node("process", passthrough)
        .unwrap()
        .add_node("store", passthrough)
        .unwrap()
        .add_edge("fetch", "process")
        .unwrap()
        .add_edge("process", "store")
        .unwrap()
        .add_edge("store", END)
        .unwrap()
        .set_entry("fetch")
        .unwrap();

    assert!(graph.compile().is_ok());
}

#[test]
fn diamond_with_conditional_join_compiles() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("start", passthrough)
        .unwrap()
        .add_node("left", passthrough)
        .unwrap()
        .add_node("right", passthrough)
        .unwrap()
        .add_node("join", passthrough)
        .unwrap()
        .add_conditional_edge("start", |_ctx, s: i32| async move {
            if s % 2 == 0 { "left".to_string() } else { "right".to_string() }
        })
        .unwrap()
        .add_edge("left", "join")
        .unwrap()
        .add_edge("right", "join")
        .unwrap()
        .add_edge("join", END)
        .unwrap()
        .set_entry("start")
        .unwrap();

    assert!(graph.compile().is_ok());
}

#[test]
fn compile_reports_every_independent_finding_at_once() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", passthrough)
        .unwrap()
        .add_edge("a", "ghost")
        .unwrap();
    // No set_entry at all: expect both EntryPointMissing and EdgeTargetNotFound.
    let err = graph.compile().unwrap_err();
    assert!(err.findings.contains(&CompileFinding::EntryPointMissing));
    assert!(err.findings.iter().any(|f| matches!(
        f,
        CompileFinding::EdgeTargetNotFound { from, to } if from == "a" && to == "ghost"
    )));
}

#[test]
fn three_node_cycle_with_no_exit_fails_to_compile() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", passthrough)
        .unwrap()
        .add_node("b", passthrough)
        .unwrap()
        .add_node("c", passthrough)
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", "c")
        .unwrap()
        .add_edge("c", "a")
        .unwrap()
        .set_entry("a")
        .unwrap();

    let err = graph.compile().unwrap_err();
    assert_eq!(err.findings.len(), 3);
    assert!(err
        .findings
        .iter()
        .all(|f| matches!(f, CompileFinding::NoPathToEnd(_))));
}

#[test]
fn same_cycle_compiles_once_a_conditional_exit_is_added() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", passthrough)
        .unwrap()
        .add_node("b", passthrough)
        .unwrap()
        .add_node("c", passthrough)
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", "c")
        .unwrap()
        .add_conditional_edge("c", |_ctx, s: i32| async move {
            if s > 10 { END.to_string() } else { "a".to_string() }
        })
        .unwrap()
        .set_entry("a")
        .unwrap();

    assert!(graph.compile().is_ok());
}

#[test]
fn recompiling_after_further_mutation_does_not_consume_the_builder() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", passthrough)
        .unwrap()
        .add_edge("a", END)
        .unwrap()
        .set_entry("a")
        .unwrap();

    assert!(graph.compile().is_ok());
    let graph = graph.add_node("b", passthrough).unwrap().add_edge("b", END).unwrap();
    assert!(graph.compile().is_ok());
}
