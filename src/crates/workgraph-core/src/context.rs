//! [`ExecutionContext`]: the per-run, per-node handle passed to every step
//! and router function.
//!
//! Its visible fields never change once a node invocation has started; the
//! executor builds a fresh, derived context for each node (`node_id` set to
//! the node about to run, `attempt` set appropriately, and a `tracing` span
//! enriched with `run_id`/`node_id`/`attempt` fields).

use crate::error::CancelCause;
use crate::graph::NodeId;
use crate::llm::LlmClient;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use workgraph_checkpoint::CheckpointStore;

/// Per-run, per-node handle. Cheap to clone (everything is `Arc`/`Copy`).
#[derive(Clone)]
pub struct ExecutionContext {
    run_id: Option<String>,
    node_id: Option<NodeId>,
    attempt: u32,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    store: Option<Arc<dyn CheckpointStore>>,
    llm: Option<Arc<dyn LlmClient>>,
    span: tracing::Span,
}

impl ExecutionContext {
    /// A context with no run id, no deadline, no store, no LLM client, and a
    /// fresh (never cancelled) token: the starting point for a `Run`.
    pub fn new() -> Self {
        Self {
            run_id: None,
            node_id: None,
            attempt: 1,
            cancel: CancellationToken::new(),
            deadline: None,
            store: None,
            llm: None,
            span: tracing::Span::none(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn store(&self) -> Option<&Arc<dyn CheckpointStore>> {
        self.store.as_ref()
    }

    pub fn llm(&self) -> Option<&Arc<dyn LlmClient>> {
        self.llm.as_ref()
    }

    /// The span a node should `.enter()` (or instrument a future with) to
    /// pick up run-id/node-id/attempt as structured fields.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// `Some(cause)` if the caller cancelled explicitly or the deadline has
    /// elapsed; `None` otherwise. Nodes doing long work should poll this
    /// periodically and return promptly when it is `Some`.
    pub fn cancelled(&self) -> Option<CancelCause> {
        if self.cancel.is_cancelled() {
            Some(CancelCause::Explicit)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelCause::DeadlineExceeded)
        } else {
            None
        }
    }

    /// The token the driver and nodes share; callers cancel a run by calling
    /// `.cancel()` on the token returned from the context they passed to `Run`.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Derive the context the executor passes into a specific node
    /// invocation: same run id/store/llm/cancel/deadline, but `node_id` and
    /// `attempt` set, and a span enriched with those fields.
    pub(crate) fn for_node(&self, node_id: &str, attempt: u32) -> Self {
        let span = tracing::info_span!(
            "node",
            run_id = self.run_id.as_deref().unwrap_or(""),
            node_id,
            attempt
        );
        Self {
            run_id: self.run_id.clone(),
            node_id: Some(node_id.to_string()),
            attempt,
            cancel: self.cancel.clone(),
            deadline: self.deadline,
            store: self.store.clone(),
            llm: self.llm.clone(),
            span,
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
