//! The execution engine: the driver loop that walks a [`CompiledGraph`] node
//! by node, isolates panics, observes cancellation, and emits checkpoints.

use std::any::Any;
use std::sync::Arc;

use crate::codec::{JsonCodec, StateCodec};
use crate::compiled::CompiledGraph;
use crate::context::ExecutionContext;
use crate::error::{CancelCause, RunError};
use crate::graph::NodeId;
use crate::observability::{Hooks, TracingHooks};
use serde::de::DeserializeOwned;
use serde::Serialize;
use workgraph_checkpoint::CheckpointDraft;

/// Tunables for a single [`Run::execute`] call.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on node transitions before the run fails with
    /// [`RunError::IterationCap`]. Guards against an unbounded conditional
    /// loop.
    pub max_iterations: u64,
    /// Whether to persist a checkpoint after every node. Requires
    /// `ctx.run_id()` and `ctx.store()` to both be set; if either is
    /// missing and this is `true`, the run fails with
    /// [`RunError::RunIdRequired`] or is simply skipped; see
    /// [`Self::fatal_checkpoint_errors`] for how store failures are handled.
    pub checkpoint: bool,
    /// If `true`, a [`workgraph_checkpoint::CheckpointError`] while saving
    /// aborts the run with [`RunError::Checkpoint`]. If `false` (the
    /// default), the error is logged via `tracing` and the run continues
    /// without a durable checkpoint for that node.
    pub fatal_checkpoint_errors: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            checkpoint: false,
            fatal_checkpoint_errors: false,
        }
    }
}

/// The result of a run: the last state the graph produced, paired with the
/// fault that ended it early, if any. `error.is_none()` means the graph
/// reached `END`.
#[derive(Debug)]
pub struct Outcome<S> {
    pub state: S,
    pub error: Option<RunError>,
}

impl<S> Outcome<S> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// An executable, compiled graph paired with the codec and hooks used while
/// driving it.
pub struct Run<S> {
    graph: CompiledGraph<S>,
    codec: Arc<dyn StateCodec<S>>,
    hooks: Arc<dyn Hooks>,
}

impl<S> Run<S>
where
    S: Clone + Send + Sync + 'static + Serialize + DeserializeOwned,
{
    pub fn new(graph: CompiledGraph<S>) -> Self {
        Self {
            graph,
            codec: Arc::new(JsonCodec::new()),
            hooks: Arc::new(TracingHooks),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn StateCodec<S>>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn graph(&self) -> &CompiledGraph<S> {
        &self.graph
    }

    /// Drives the graph from `graph.entry()` with `initial_state` until it
    /// reaches `END` or a fault ends it.
    pub async fn execute(&self, ctx: ExecutionContext, initial_state: S, options: RunOptions) -> Outcome<S> {
        self.drive(ctx, self.graph.entry().clone(), initial_state, 1, None, 0, options)
            .await
    }

    /// Shared by [`Self::execute`] and [`crate::resume::resume`]: runs the
    /// loop starting at an arbitrary node with an arbitrary attempt count,
    /// so a resumed run continues rather than restarting.
    pub(crate) async fn drive(
        &self,
        ctx: ExecutionContext,
        mut current: NodeId,
        mut state: S,
        mut attempt: u32,
        mut prev_node: Option<NodeId>,
        mut iterations: u64,
        options: RunOptions,
    ) -> Outcome<S> {
        self.hooks.on_run_start(ctx.run_id());

        loop {
            if iterations >= options.max_iterations {
                let err = RunError::IterationCap {
                    limit: options.max_iterations,
                    next_node: current.clone(),
                };
                self.hooks.on_run_end(ctx.run_id(), Some(&err));
                return Outcome {
                    state,
                    error: Some(err),
                };
            }

            if let Some(cause) = ctx.cancelled() {
                let err = RunError::Cancellation {
                    node: Some(current.clone()),
                    was_executing: false,
                    cause,
                };
                self.hooks.on_run_end(ctx.run_id(), Some(&err));
                return Outcome {
                    state,
                    error: Some(err),
                };
            }

            let node_ctx = ctx.for_node(&current, attempt);
            self.hooks.on_node_start(ctx.run_id(), &current, attempt);

            let step = self
                .graph
                .step(&current)
                .expect("current node id is always drawn from the compiled graph")
                .clone();
            let fut = step(node_ctx, state.clone());
            let joined = tokio::spawn(fut).await;

            state = match joined {
                Ok(Ok(next_state)) => next_state,
                Ok(Err(step_err)) => {
                    let err = RunError::NodeFault {
                        node: current.clone(),
                        source: step_err,
                    };
                    self.hooks.on_node_end(ctx.run_id(), &current, attempt, Some(&err));
                    self.hooks.on_run_end(ctx.run_id(), Some(&err));
                    return Outcome {
                        state,
                        error: Some(err),
                    };
                }
                Err(join_err) => {
                    let err = if join_err.is_cancelled() {
                        RunError::Cancellation {
                            node: Some(current.clone()),
                            was_executing: true,
                            cause: ctx.cancelled().unwrap_or(CancelCause::Explicit),
                        }
                    } else {
                        let message = panic_message(join_err.into_panic());
                        RunError::Panic {
                            node: current.clone(),
                            message,
                            backtrace: std::backtrace::Backtrace::capture().to_string(),
                        }
                    };
                    self.hooks.on_node_end(ctx.run_id(), &current, attempt, Some(&err));
                    self.hooks.on_run_end(ctx.run_id(), Some(&err));
                    return Outcome {
                        state,
                        error: Some(err),
                    };
                }
            };
            self.hooks.on_node_end(ctx.run_id(), &current, attempt, None);

            if let Some(cause) = ctx.cancelled() {
                let err = RunError::Cancellation {
                    node: Some(current.clone()),
                    was_executing: true,
                    cause,
                };
                self.hooks.on_run_end(ctx.run_id(), Some(&err));
                return Outcome {
                    state,
                    error: Some(err),
                };
            }

            let next = match self.resolve_next(&ctx, &current, &state).await {
                Ok(next) => next,
                Err(err) => {
                    self.hooks.on_run_end(ctx.run_id(), Some(&err));
                    return Outcome {
                        state,
                        error: Some(err),
                    };
                }
            };

            if options.checkpoint {
                if let Err(err) = self
                    .emit_checkpoint(&ctx, &current, &state, &next, attempt, prev_node.as_deref())
                    .await
                {
                    if options.fatal_checkpoint_errors {
                        self.hooks.on_run_end(ctx.run_id(), Some(&err));
                        return Outcome {
                            state,
                            error: Some(err),
                        };
                    }
                    tracing::warn!(error = %err, node = %current, "checkpoint save failed, continuing without it");
                }
            }

            if next == crate::graph::END {
                self.hooks.on_run_end(ctx.run_id(), None);
                return Outcome { state, error: None };
            }

            prev_node = Some(current.clone());
            current = next;
            attempt = 1;
            iterations += 1;
        }
    }

    async fn resolve_next(&self, ctx: &ExecutionContext, current: &str, state: &S) -> Result<NodeId, RunError> {
        if let Some(router) = self.graph.router(current) {
            let node_ctx = ctx.for_node(current, 1);
            let fut = router(node_ctx, state.clone());
            let raw = match tokio::spawn(fut).await {
                Ok(raw) => raw,
                Err(join_err) => {
                    return Err(if join_err.is_cancelled() {
                        RunError::Cancellation {
                            node: Some(current.to_string()),
                            was_executing: true,
                            cause: ctx.cancelled().unwrap_or(CancelCause::Explicit),
                        }
                    } else {
                        let message = panic_message(join_err.into_panic());
                        RunError::Panic {
                            node: current.to_string(),
                            message,
                            backtrace: std::backtrace::Backtrace::capture().to_string(),
                        }
                    });
                }
            };
            if raw.is_empty() {
                return Err(RunError::RouterResult {
                    node: current.to_string(),
                });
            }
            if raw == crate::graph::END {
                return Ok(raw);
            }
            if self.graph.contains_node(&raw) {
                return Ok(raw);
            }
            return Err(RunError::RouterTarget {
                node: current.to_string(),
                target: raw,
            });
        }
        if let Some(target) = self.graph.simple_successor(current) {
            return Ok(target.clone());
        }
        unreachable!("compile() guarantees every node has a simple or conditional out-edge")
    }

    async fn emit_checkpoint(
        &self,
        ctx: &ExecutionContext,
        node: &str,
        state: &S,
        next_node: &str,
        attempt: u32,
        prev_node_id: Option<&str>,
    ) -> Result<(), RunError> {
        let run_id = ctx.run_id().ok_or(RunError::RunIdRequired)?;
        let store = ctx.store().ok_or(RunError::RunIdRequired)?;
        let bytes = self
            .codec
            .encode(state)
            .map_err(|source| RunError::Serialize { source })?;
        let draft = CheckpointDraft {
            run_id: run_id.to_string(),
            node_id: node.to_string(),
            state: bytes,
            next_node: next_node.to_string(),
            attempt,
            prev_node_id: prev_node_id.map(str::to_string),
        };
        let saved = store.save(draft).await?;
        self.hooks.on_checkpoint(ctx.run_id(), &node.to_string(), saved.sequence);
        Ok(())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic payload was not a string".to_string()
    }
}
