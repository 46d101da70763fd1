//! Plug point for the LLM client subsystem. This crate never calls into a
//! `LlmClient`; it only threads `Option<Arc<dyn LlmClient>>` through
//! [`ExecutionContext`](crate::context::ExecutionContext) so that step and
//! router functions written by a host crate can reach one.

use std::fmt::Debug;

/// Marker trait a host's LLM client implements to ride along in an
/// [`ExecutionContext`](crate::context::ExecutionContext). Deliberately
/// empty: the shape of "call a model" belongs to the host, not to the graph
/// engine.
pub trait LlmClient: Send + Sync + Debug {}
