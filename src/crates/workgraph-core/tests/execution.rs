//! End-to-end execution: linear pipelines, conditional loops, cancellation,
//! and checkpoint emission against real backends.

use std::sync::Arc;
use std::time::{Duration, Instant};

use workgraph_checkpoint::{CheckpointStore, InMemoryCheckpointStore};
use workgraph_core::{ExecutionContext, GraphBuilder, Run, RunError, RunOptions, END};

async fn double(_ctx: ExecutionContext, state: i32) -> Result<i32, workgraph_core::StepError> {
    Ok(state * 2)
}

async fn slow_then_double(ctx: ExecutionContext, state: i32) -> Result<i32, workgraph_core::StepError> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if ctx.cancelled().is_some() {
        return Ok(state);
    }
    Ok(state * 2)
}

#[tokio::test]
async fn linear_pipeline_transforms_state_end_to_end() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", double)
        .unwrap()
        .add_node("b", double)
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", END)
        .unwrap()
        .set_entry("a")
        .unwrap()
        .compile()
        .unwrap();

    let run = Run::new(graph);
    let outcome = run.execute(ExecutionContext::new(), 3, RunOptions::default()).await;
    assert!(outcome.is_ok());
    assert_eq!(outcome.state, 12);
}

#[tokio::test]
async fn conditional_loop_runs_until_router_sends_end() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("step", |_ctx, state: i32| async move { Ok(state + 1) })
        .unwrap()
        .add_conditional_edge("step", |_ctx, state: i32| async move {
            if state >= 5 {
                END.to_string()
            } else {
                "step".to_string()
            }
        })
        .unwrap()
        .set_entry("step")
        .unwrap()
        .compile()
        .unwrap();

    let run = Run::new(graph);
    let outcome = run.execute(ExecutionContext::new(), 0, RunOptions::default()).await;
    assert!(outcome.is_ok());
    assert_eq!(outcome.state, 5);
}

#[tokio::test]
async fn deadline_cancels_a_run_mid_flight() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", slow_then_double)
        .unwrap()
        .add_node("b", slow_then_double)
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", END)
        .unwrap()
        .set_entry("a")
        .unwrap()
        .compile()
        .unwrap();

    let run = Run::new(graph);
    let ctx = ExecutionContext::new().with_deadline(Instant::now() + Duration::from_millis(10));
    let outcome = run.execute(ctx, 1, RunOptions::default()).await;
    assert!(matches!(outcome.error, Some(RunError::Cancellation { .. })));
}

#[tokio::test]
async fn every_node_transition_is_checkpointed_in_order() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", double)
        .unwrap()
        .add_node("b", double)
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", END)
        .unwrap()
        .set_entry("a")
        .unwrap()
        .compile()
        .unwrap();

    let store: Arc<dyn CheckpointStore> = Arc::new(InMemoryCheckpointStore::new());
    let ctx = ExecutionContext::new().with_run_id("run-42").with_store(store.clone());
    let run = Run::new(graph);
    let options = RunOptions {
        checkpoint: true,
        ..Default::default()
    };
    let outcome = run.execute(ctx, 2, options).await;
    assert!(outcome.is_ok());

    let history = store.list("run-42").await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].sequence < history[1].sequence);
}

#[tokio::test]
async fn a_failing_node_stops_the_run_and_preserves_the_prior_state() {
    let graph = GraphBuilder::<i32>::new()
        .add_node("a", double)
        .unwrap()
        .add_node("b", |_ctx, _state: i32| async move { Err("downstream failure".into()) })
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", END)
        .unwrap()
        .set_entry("a")
        .unwrap()
        .compile()
        .unwrap();

    let run = Run::new(graph);
    let outcome = run.execute(ExecutionContext::new(), 5, RunOptions::default()).await;
    assert!(matches!(outcome.error, Some(RunError::NodeFault { .. })));
}
