//! The fault taxonomy: programmer-error faults raised at the builder, an
//! aggregated compile-time fault, and the run-time fault kinds a [`Run`] can
//! terminate with.
//!
//! # Error Hierarchy
//!
//! ```text
//! BuildError      : raised immediately by GraphBuilder methods, non-recoverable
//! CompileError    : returned aggregated from GraphBuilder::compile
//! RunError        : returned from Run/Resume, always paired with the last state
//! ```
//!
//! User errors (from step and router functions) are wrapped, never replaced:
//! [`RunError::NodeFault`] holds the original `Box<dyn Error + Send + Sync>`
//! so callers can `.source()` / downcast back to the cause they threw.

use crate::graph::NodeId;
use std::fmt;
use thiserror::Error;

/// Opaque error channel for user step/router code, matching the corpus's own
/// convention of boxing application errors rather than inventing a generic
/// error trait bound on every node.
pub type StepError = Box<dyn std::error::Error + Send + Sync>;

/// Misuse detected while building a graph: empty/whitespace/reserved/duplicate
/// ids, mixing edge kinds on one node, or a second distinct simple edge from
/// a node that already has one. Raised at the call site immediately; there is
/// no recovery path other than fixing the calling code.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("node id must not be empty")]
    EmptyId,

    #[error("node id {0:?} must not contain whitespace")]
    WhitespaceId(String),

    #[error("node id {0:?} is the reserved END sentinel")]
    ReservedId(String),

    #[error("node {0:?} was already added")]
    DuplicateNode(NodeId),

    #[error("node {0:?} already has a simple out-edge; it cannot have a second one to a different target")]
    DuplicateEdge(NodeId),

    #[error("node {0:?} already has a conditional edge; a node may have simple edges or a conditional edge, never both")]
    ConflictingEdgeKind(NodeId),

    #[error("node {0:?} already has a router installed")]
    DuplicateRouter(NodeId),
}

/// A single independent finding from [`GraphBuilder::compile`](crate::builder::GraphBuilder::compile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileFinding {
    EntryPointMissing,
    EntryNotFound(NodeId),
    EdgeSourceNotFound(NodeId),
    EdgeTargetNotFound { from: NodeId, to: NodeId },
    NoPathToEnd(NodeId),
}

impl fmt::Display for CompileFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryPointMissing => write!(f, "no entry point was set"),
            Self::EntryNotFound(id) => write!(f, "entry point {id:?} refers to no known node"),
            Self::EdgeSourceNotFound(id) => write!(f, "edge source {id:?} refers to no known node"),
            Self::EdgeTargetNotFound { from, to } => {
                write!(f, "edge from {from:?} targets {to:?}, which refers to no known node")
            }
            Self::NoPathToEnd(id) => write!(
                f,
                "node {id:?} has no path to END through simple edges or conditional sources"
            ),
        }
    }
}

/// Aggregated compile-time fault: every independent finding from a single
/// `compile()` call, joined so a tool can show them all at once rather than
/// forcing a fix-one-recompile-repeat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub findings: Vec<CompileFinding>,
}

impl CompileError {
    pub(crate) fn new(findings: Vec<CompileFinding>) -> Self {
        Self { findings }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph failed to compile with {} finding(s):", self.findings.len())?;
        for finding in &self.findings {
            write!(f, "\n  - {finding}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Why a run observed cancellation: the caller's own call, or a deadline
/// that elapsed. Preserved through [`RunError::Cancellation`] so callers can
/// distinguish the two without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    Explicit,
    DeadlineExceeded,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit cancel"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Fault a [`Run`](crate::executor::Run) or [`Resume`](crate::resume::resume)
/// can terminate with. Always returned alongside the last state the run
/// produced (see [`crate::executor::Outcome`]).
#[derive(Error, Debug)]
pub enum RunError {
    /// A step function returned an error. Wraps the cause; `.source()` on
    /// this error returns it unchanged.
    #[error("node {node:?} execution failed: {source}")]
    NodeFault {
        node: NodeId,
        #[source]
        source: StepError,
    },

    /// A step or router function panicked. Recovered at the isolating
    /// boundary around every user-code call.
    #[error("node {node:?} panicked: {message}")]
    Panic {
        node: NodeId,
        message: String,
        backtrace: String,
    },

    /// Cancellation observed either before a node started or because the
    /// node itself returned upon observing it.
    #[error("run cancelled ({cause}) at node {node:?} (was_executing={was_executing})")]
    Cancellation {
        node: Option<NodeId>,
        was_executing: bool,
        cause: CancelCause,
    },

    /// The iteration cap was reached before the graph reached END.
    #[error("iteration cap of {limit} reached; next node would have been {next_node:?}")]
    IterationCap { limit: u64, next_node: NodeId },

    /// A router returned the empty string.
    #[error("router at node {node:?} returned an empty result")]
    RouterResult { node: NodeId },

    /// A router returned a node id that is neither END nor a known node.
    #[error("router at node {node:?} returned unknown target {target:?}")]
    RouterTarget { node: NodeId, target: String },

    /// The host's `encode(S) -> bytes` function failed.
    #[error("state serialization failed: {source}")]
    Serialize {
        #[source]
        source: StepError,
    },

    /// The host's `decode(bytes) -> S` function failed.
    #[error("state deserialization failed: {source}")]
    Deserialize {
        #[source]
        source: StepError,
    },

    /// Checkpointing was requested without a run id.
    #[error("checkpointing requires a run id")]
    RunIdRequired,

    /// A checkpoint store operation failed and the caller opted into fatal
    /// checkpoint errors (the default is to log and continue).
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] workgraph_checkpoint::CheckpointError),

    /// `ResumeFrom` was asked for a node id absent from the compiled graph.
    #[error("resume target {0:?} is not present in the compiled graph")]
    InvalidResumeNode(NodeId),

    /// `Resume` found no stored checkpoints for the run.
    #[error("no checkpoint found for run {0:?}")]
    NoCheckpointFound(String),

    /// The caller-supplied revalidate predicate rejected the loaded state.
    #[error("resume revalidation failed: {0}")]
    RevalidationFailed(String),
}
