//! The mutable graph builder. `GraphBuilder<S>` accumulates nodes and edges,
//! validating each addition immediately (see [`BuildError`]); [`Self::compile`]
//! runs the aggregated, whole-graph validation and hands back an immutable
//! [`CompiledGraph`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::compiled::CompiledGraph;
use crate::error::{BuildError, CompileError};
use crate::graph::{validate_node_id, NodeId, RouterFn, RouterFuture, StepFn, StepFuture, END};

/// The graph under construction. Kept separate from `GraphBuilder` so that
/// `compile` can clone just this part cheaply (everything inside is `Arc`).
#[derive(Clone)]
pub(crate) struct Graph<S> {
    pub(crate) nodes: HashMap<NodeId, StepFn<S>>,
    pub(crate) simple_edges: HashMap<NodeId, NodeId>,
    pub(crate) conditional_edges: HashMap<NodeId, RouterFn<S>>,
    pub(crate) entry: Option<NodeId>,
}

impl<S> Default for Graph<S> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            simple_edges: HashMap::new(),
            conditional_edges: HashMap::new(),
            entry: None,
        }
    }
}

/// Mutable graph under construction. Generic over the state type `S` that
/// flows through every node.
///
/// ```ignore
/// let graph = GraphBuilder::<MyState>::new()
///     .add_node("fetch", fetch_step)?
///     .add_node("process", process_step)?
///     .add_edge("fetch", "process")?
///     .add_edge("process", END)?
///     .set_entry("fetch")?;
/// let compiled = graph.compile()?;
/// ```
pub struct GraphBuilder<S> {
    graph: Graph<S>,
}

impl<S> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            graph: Graph::default(),
        }
    }

    /// Registers a node under `id` with the step function `step`. `id` must
    /// be non-empty, whitespace-free, not [`END`], and not already used by
    /// another node.
    pub fn add_node<F, Fut>(mut self, id: impl Into<String>, step: F) -> Result<Self, BuildError>
    where
        F: Fn(crate::context::ExecutionContext, S) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<S, crate::error::StepError>> + Send + 'static,
    {
        let id = id.into();
        validate_node_id(&id)?;
        if self.graph.nodes.contains_key(&id) {
            return Err(BuildError::DuplicateNode(id));
        }
        let boxed: StepFn<S> = Arc::new(move |ctx, state| {
            Box::pin(step(ctx, state)) as StepFuture<S>
        });
        self.graph.nodes.insert(id, boxed);
        Ok(self)
    }

    /// Adds a simple (unconditional) edge `from -> to`. `to` may be [`END`].
    /// A second call for the same `from` targeting the *same* `to` is a
    /// no-op (idempotent); targeting a *different* `to` is
    /// [`BuildError::DuplicateEdge`]. A node may not carry both a simple
    /// edge and a conditional edge.
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Result<Self, BuildError> {
        let from = from.into();
        let to = to.into();
        validate_node_id(&from)?;
        if to != END {
            validate_node_id(&to)?;
        }
        if self.graph.conditional_edges.contains_key(&from) {
            return Err(BuildError::ConflictingEdgeKind(from));
        }
        match self.graph.simple_edges.get(&from) {
            Some(existing) if existing == &to => {}
            Some(_) => return Err(BuildError::DuplicateEdge(from)),
            None => {
                self.graph.simple_edges.insert(from, to);
            }
        }
        Ok(self)
    }

    /// Installs a router at `from`. A node may carry at most one router, and
    /// not both a router and a simple edge.
    pub fn add_conditional_edge<F, Fut>(mut self, from: impl Into<String>, router: F) -> Result<Self, BuildError>
    where
        F: Fn(crate::context::ExecutionContext, S) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = String> + Send + 'static,
    {
        let from = from.into();
        validate_node_id(&from)?;
        if self.graph.simple_edges.contains_key(&from) {
            return Err(BuildError::ConflictingEdgeKind(from));
        }
        if self.graph.conditional_edges.contains_key(&from) {
            return Err(BuildError::DuplicateRouter(from));
        }
        let boxed: RouterFn<S> = Arc::new(move |ctx, state| {
            Box::pin(router(ctx, state)) as RouterFuture
        });
        self.graph.conditional_edges.insert(from, boxed);
        Ok(self)
    }

    /// Sets the node execution starts at. Callable more than once; the last
    /// call wins. Validity (the id refers to a known node) is checked at
    /// `compile`, not here, since a builder may set the entry before adding
    /// the node it names.
    pub fn set_entry(mut self, id: impl Into<String>) -> Result<Self, BuildError> {
        let id = id.into();
        validate_node_id(&id)?;
        self.graph.entry = Some(id);
        Ok(self)
    }

    /// Runs whole-graph validation and returns an immutable, executable
    /// graph. Does not consume `self`: the same builder may be extended
    /// further and recompiled independently.
    pub fn compile(&self) -> Result<CompiledGraph<S>, CompileError>
    where
        S: Clone + Send + Sync + 'static,
    {
        CompiledGraph::from_graph(self.graph.clone())
    }
}
