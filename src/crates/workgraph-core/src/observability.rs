//! Observability seam. This crate's own Non-goals exclude a metrics/tracing
//! *integration* layer, but it still ships structured logging the way the
//! corpus does: a [`Hooks`] trait with no-op defaults, plus [`TracingHooks`],
//! a ready implementation that emits `tracing` events a host can subscribe
//! to without writing its own hook.

use crate::error::RunError;
use crate::graph::NodeId;

/// Lifecycle callbacks the executor invokes around a run and each node.
/// Every method has a no-op default so implementors only override what they
/// care about.
pub trait Hooks: Send + Sync {
    fn on_run_start(&self, run_id: Option<&str>) {
        let _ = run_id;
    }

    fn on_run_end(&self, run_id: Option<&str>, error: Option<&RunError>) {
        let _ = (run_id, error);
    }

    fn on_node_start(&self, run_id: Option<&str>, node: &NodeId, attempt: u32) {
        let _ = (run_id, node, attempt);
    }

    fn on_node_end(&self, run_id: Option<&str>, node: &NodeId, attempt: u32, error: Option<&RunError>) {
        let _ = (run_id, node, attempt, error);
    }

    fn on_checkpoint(&self, run_id: Option<&str>, node: &NodeId, sequence: u64) {
        let _ = (run_id, node, sequence);
    }
}

/// A [`Hooks`] impl that logs every callback via `tracing`. The default
/// hooks passed to a [`Run`](crate::executor::Run) when the caller doesn't
/// supply their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl Hooks for TracingHooks {
    fn on_run_start(&self, run_id: Option<&str>) {
        tracing::info!(run_id, "run started");
    }

    fn on_run_end(&self, run_id: Option<&str>, error: Option<&RunError>) {
        match error {
            Some(e) => tracing::warn!(run_id, error = %e, "run ended with error"),
            None => tracing::info!(run_id, "run ended"),
        }
    }

    fn on_node_start(&self, run_id: Option<&str>, node: &NodeId, attempt: u32) {
        tracing::debug!(run_id, node, attempt, "node started");
    }

    fn on_node_end(&self, run_id: Option<&str>, node: &NodeId, attempt: u32, error: Option<&RunError>) {
        match error {
            Some(e) => tracing::warn!(run_id, node, attempt, error = %e, "node ended with error"),
            None => tracing::debug!(run_id, node, attempt, "node ended"),
        }
    }

    fn on_checkpoint(&self, run_id: Option<&str>, node: &NodeId, sequence: u64) {
        tracing::debug!(run_id, node, sequence, "checkpoint saved");
    }
}
