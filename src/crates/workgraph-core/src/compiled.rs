//! The immutable, validated graph the executor drives. Built once by
//! [`GraphBuilder::compile`](crate::builder::GraphBuilder::compile); cheap to
//! clone and share across concurrent runs.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::builder::Graph;
use crate::error::{CompileError, CompileFinding};
use crate::graph::{NodeId, RouterFn, StepFn, END};

/// A validated graph ready to execute. Holds the step functions, the simple
/// edge successor map, the conditional-edge router map, and the entry node.
pub struct CompiledGraph<S> {
    nodes: HashMap<NodeId, StepFn<S>>,
    simple_edges: HashMap<NodeId, NodeId>,
    conditional_edges: HashMap<NodeId, RouterFn<S>>,
    entry: NodeId,
}

impl<S> Clone for CompiledGraph<S> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            simple_edges: self.simple_edges.clone(),
            conditional_edges: self.conditional_edges.clone(),
            entry: self.entry.clone(),
        }
    }
}

impl<S> CompiledGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn from_graph(graph: Graph<S>) -> Result<Self, CompileError> {
        let mut findings = Vec::new();

        let entry = match &graph.entry {
            None => {
                findings.push(CompileFinding::EntryPointMissing);
                None
            }
            Some(id) => {
                if !graph.nodes.contains_key(id) {
                    findings.push(CompileFinding::EntryNotFound(id.clone()));
                }
                Some(id.clone())
            }
        };

        for from in graph.simple_edges.keys() {
            if !graph.nodes.contains_key(from) {
                findings.push(CompileFinding::EdgeSourceNotFound(from.clone()));
            }
        }
        for from in graph.conditional_edges.keys() {
            if !graph.nodes.contains_key(from) {
                findings.push(CompileFinding::EdgeSourceNotFound(from.clone()));
            }
        }
        for (from, to) in &graph.simple_edges {
            if to != END && !graph.nodes.contains_key(to) {
                findings.push(CompileFinding::EdgeTargetNotFound {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        // Cycle-exit validation: a node reaches END if it has a simple edge
        // to a node that reaches END, or it carries a conditional edge (the
        // router may send execution anywhere at runtime, including straight
        // to END, so it is treated as reaching END unconditionally).
        let mut predecessors: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for (from, to) in &graph.simple_edges {
            predecessors.entry(to).or_default().push(from);
        }

        let mut reaches_end: HashSet<&NodeId> = HashSet::new();
        let mut queue: VecDeque<&NodeId> = VecDeque::new();
        let end_id = END.to_string();
        queue.push_back(&end_id);
        for from in graph.conditional_edges.keys() {
            if reaches_end.insert(from) {
                queue.push_back(from);
            }
        }
        while let Some(node) = queue.pop_front() {
            if let Some(preds) = predecessors.get(node) {
                for pred in preds {
                    if reaches_end.insert(pred) {
                        queue.push_back(pred);
                    }
                }
            }
        }

        for id in graph.nodes.keys() {
            if !reaches_end.contains(id) {
                findings.push(CompileFinding::NoPathToEnd(id.clone()));
            }
        }

        if !findings.is_empty() {
            return Err(CompileError::new(findings));
        }

        let entry = entry.expect("no EntryPointMissing finding implies entry is Some");

        // Non-fatal: nodes unreachable forward from entry. Conditional edges
        // make everything downstream of them potentially reachable, so once
        // the forward walk touches a conditional-edge node the rest of the
        // graph is assumed reachable through it.
        let mut forward_reachable: HashSet<&NodeId> = HashSet::new();
        let mut fwd_queue: VecDeque<&NodeId> = VecDeque::new();
        fwd_queue.push_back(&entry);
        forward_reachable.insert(&entry);
        let mut touched_conditional = false;
        while let Some(node) = fwd_queue.pop_front() {
            if graph.conditional_edges.contains_key(node) {
                touched_conditional = true;
            }
            if let Some(to) = graph.simple_edges.get(node) {
                if to != END && forward_reachable.insert(to) {
                    fwd_queue.push_back(to);
                }
            }
        }
        if touched_conditional {
            for id in graph.nodes.keys() {
                forward_reachable.insert(id);
            }
        }
        for id in graph.nodes.keys() {
            if !forward_reachable.contains(id) {
                tracing::warn!(node = %id, "node is unreachable from the entry point");
            }
        }

        Ok(Self {
            nodes: graph.nodes,
            simple_edges: graph.simple_edges,
            conditional_edges: graph.conditional_edges,
            entry,
        })
    }

    pub fn entry(&self) -> &NodeId {
        &self.entry
    }

    pub(crate) fn step(&self, id: &str) -> Option<&StepFn<S>> {
        self.nodes.get(id)
    }

    pub(crate) fn simple_successor(&self, id: &str) -> Option<&NodeId> {
        self.simple_edges.get(id)
    }

    pub(crate) fn router(&self, id: &str) -> Option<&RouterFn<S>> {
        self.conditional_edges.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }
}
