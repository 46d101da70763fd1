//! # workgraph-core: graph builder, compiler, and execution engine
//!
//! A node is an async function `(ExecutionContext, S) -> Result<S, StepError>`
//! over a host-defined state type `S`. Nodes are wired together with
//! [`GraphBuilder`] into simple edges and conditional edges (routers); a
//! builder is validated as a whole by [`GraphBuilder::compile`], which
//! returns an immutable [`CompiledGraph`] a [`Run`] can drive to completion,
//! checkpointing along the way and resuming from where it left off.
//!
//! This crate does not talk to a model provider (see [`LlmClient`] for the
//! plug point a host implements) and does not ship a CLI; it is the
//! orchestration core a host application embeds.

pub mod builder;
pub mod codec;
pub mod compiled;
pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod llm;
pub mod observability;
pub mod resume;

pub use builder::GraphBuilder;
pub use codec::{JsonCodec, StateCodec};
pub use compiled::CompiledGraph;
pub use context::ExecutionContext;
pub use error::{BuildError, CancelCause, CompileError, CompileFinding, RunError, StepError};
pub use executor::{Outcome, Run, RunOptions};
pub use graph::{NodeId, RouterFn, StepFn, END};
pub use llm::LlmClient;
pub use observability::{Hooks, TracingHooks};
pub use resume::{resume, resume_from, ResumeOptions};
