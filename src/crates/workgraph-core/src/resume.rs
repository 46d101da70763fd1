//! Resuming a run from a stored checkpoint.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::ExecutionContext;
use crate::error::RunError;
use crate::executor::{Outcome, Run, RunOptions};

/// Optional hooks applied to the state loaded from a checkpoint before the
/// driver loop continues.
pub struct ResumeOptions<S> {
    pub run: RunOptions,
    /// Applied to the decoded state before execution resumes, e.g. to merge
    /// in fresher external data. Runs before `revalidate`.
    pub transform: Option<Arc<dyn Fn(S) -> S + Send + Sync>>,
    /// Checked against the (possibly transformed) state; `Err(reason)`
    /// fails the resume with [`RunError::RevalidationFailed`] before any
    /// node runs.
    pub revalidate: Option<Arc<dyn Fn(&S) -> Result<(), String> + Send + Sync>>,
}

// Manual impls: neither Clone nor Default should require `S: Clone`/`S:
// Default` just because it appears under an `Option<Arc<dyn Fn(S) -> ...>>`.
impl<S> Clone for ResumeOptions<S> {
    fn clone(&self) -> Self {
        Self {
            run: self.run.clone(),
            transform: self.transform.clone(),
            revalidate: self.revalidate.clone(),
        }
    }
}

impl<S> Default for ResumeOptions<S> {
    fn default() -> Self {
        Self {
            run: RunOptions::default(),
            transform: None,
            revalidate: None,
        }
    }
}

impl<S> std::fmt::Debug for ResumeOptions<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeOptions")
            .field("run", &self.run)
            .field("transform", &self.transform.is_some())
            .field("revalidate", &self.revalidate.is_some())
            .finish()
    }
}

/// Resumes `run_id` from its most recently saved checkpoint. Does not
/// re-execute the checkpointed node; continues at the checkpoint's stored
/// `next_node`, with `attempt` carried over unchanged.
///
/// Returns `Err` for faults detected before any node runs (no store
/// attached, no checkpoint found, a corrupt checkpoint, or a rejected
/// `revalidate`); once the driver loop starts, faults are reported the same
/// way [`Run::execute`] reports them, inside `Ok(Outcome { error: Some(_), .. })`.
pub async fn resume<S>(
    run: &Run<S>,
    ctx: ExecutionContext,
    run_id: impl Into<String>,
    opts: ResumeOptions<S>,
) -> Result<Outcome<S>, RunError>
where
    S: Clone + Send + Sync + 'static + Serialize + DeserializeOwned,
{
    let run_id = run_id.into();
    let store = ctx.store().ok_or(RunError::RunIdRequired)?.clone();
    let checkpoint = match store.latest(&run_id).await {
        Ok(cp) => cp,
        Err(workgraph_checkpoint::CheckpointError::NotFound(_)) => {
            return Err(RunError::NoCheckpointFound(run_id));
        }
        Err(e) => return Err(RunError::Checkpoint(e)),
    };
    resume_from_checkpoint(run, ctx, checkpoint, opts).await
}

/// Resumes `run_id` from the checkpoint stored for exactly `node_id`, rather
/// than whichever is most recent.
pub async fn resume_from<S>(
    run: &Run<S>,
    ctx: ExecutionContext,
    run_id: impl Into<String>,
    node_id: impl Into<String>,
    opts: ResumeOptions<S>,
) -> Result<Outcome<S>, RunError>
where
    S: Clone + Send + Sync + 'static + Serialize + DeserializeOwned,
{
    let run_id = run_id.into();
    let node_id = node_id.into();
    let store = ctx.store().ok_or(RunError::RunIdRequired)?.clone();
    let checkpoint = match store.load(&run_id, &node_id).await {
        Ok(cp) => cp,
        Err(workgraph_checkpoint::CheckpointError::NotFound(_)) => {
            return Err(RunError::NoCheckpointFound(run_id));
        }
        Err(e) => return Err(RunError::Checkpoint(e)),
    };
    resume_from_checkpoint(run, ctx, checkpoint, opts).await
}

async fn resume_from_checkpoint<S>(
    run: &Run<S>,
    ctx: ExecutionContext,
    checkpoint: workgraph_checkpoint::Checkpoint,
    opts: ResumeOptions<S>,
) -> Result<Outcome<S>, RunError>
where
    S: Clone + Send + Sync + 'static + Serialize + DeserializeOwned,
{
    if checkpoint.next_node != crate::graph::END && !run.graph().contains_node(&checkpoint.next_node) {
        return Err(RunError::InvalidResumeNode(checkpoint.next_node));
    }

    let codec = crate::codec::JsonCodec::<S>::new();
    let mut state = codec
        .decode(&checkpoint.state)
        .map_err(|source| RunError::Deserialize { source })?;

    if let Some(transform) = &opts.transform {
        state = transform(state);
    }
    if let Some(revalidate) = &opts.revalidate {
        revalidate(&state).map_err(RunError::RevalidationFailed)?;
    }

    if checkpoint.next_node == crate::graph::END {
        return Ok(Outcome { state, error: None });
    }

    // The resumed-at node hasn't run yet in this process, so it starts at
    // attempt 1 like any fresh node execution; only `prev_node_id` carries
    // the resume boundary forward for debugging.
    Ok(run
        .drive(
            ctx,
            checkpoint.next_node,
            state,
            1,
            Some(checkpoint.node_id),
            0,
            opts.run,
        )
        .await)
}
