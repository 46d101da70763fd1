//! Node identifiers, the reserved `END` sentinel, and the step/router
//! function types threaded through the builder and executor.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::StepError;

/// Node identifier. Must be non-empty, contain no whitespace, and must not
/// equal [`END`].
pub type NodeId = String;

/// Reserved terminal node id. A router returning `END` ends the run
/// successfully; a simple edge may target `END`. Its wire-level value is an
/// implementation detail; callers compare against this constant, never the
/// literal string.
pub const END: &str = "__end__";

/// Returns `Ok(())` if `id` is a legal node id, or the specific [`BuildError`](crate::error::BuildError)
/// otherwise.
pub(crate) fn validate_node_id(id: &str) -> Result<(), crate::error::BuildError> {
    use crate::error::BuildError;
    if id.is_empty() {
        return Err(BuildError::EmptyId);
    }
    if id.chars().any(char::is_whitespace) {
        return Err(BuildError::WhitespaceId(id.to_string()));
    }
    if id == END {
        return Err(BuildError::ReservedId(id.to_string()));
    }
    Ok(())
}

/// A node's future: `(ExecutionContext, S) -> Result<S, StepError>`.
pub type StepFuture<S> = Pin<Box<dyn Future<Output = Result<S, StepError>> + Send>>;

/// A node's step function, shared across concurrent `Run`s of the same
/// [`CompiledGraph`](crate::compiled::CompiledGraph).
pub type StepFn<S> = Arc<dyn Fn(ExecutionContext, S) -> StepFuture<S> + Send + Sync>;

/// A router's future: resolves to the raw routed-to id, before the
/// executor validates it against §4.4's rules.
pub type RouterFuture = Pin<Box<dyn Future<Output = String> + Send>>;

/// A conditional edge's routing function: `(ExecutionContext, S) -> id`.
/// Sees the state *after* the source node produced it.
pub type RouterFn<S> = Arc<dyn Fn(ExecutionContext, S) -> RouterFuture + Send + Sync>;
