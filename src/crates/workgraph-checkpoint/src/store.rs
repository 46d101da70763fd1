//! The [`CheckpointStore`] trait: the extension point for checkpoint backends.
//!
//! Implement this trait to back workgraph with any storage system (Postgres,
//! Redis, S3, ...). Two backends ship in this crate: [`InMemoryCheckpointStore`](crate::memory::InMemoryCheckpointStore)
//! for development and tests, and, behind the `sqlite` feature,
//! [`SqliteCheckpointStore`](crate::sqlite::SqliteCheckpointStore) for single-process
//! durability.
//!
//! # Contract
//!
//! - `save` upserts; on update it assigns a fresh `sequence` strictly greater
//!   than any other checkpoint for that run, and returns only after
//!   durability at the level the backend advertises.
//! - `load` returns a copy of the bytes; implementations must not hand out
//!   references that alias internal state.
//! - `list` returns metadata ordered by `sequence` ascending; an unknown
//!   `run_id` yields an empty list, not an error.
//! - `delete` / `delete_run` are idempotent.
//! - Every method after `close()` returns [`CheckpointError::ClosedStore`].
//! - Implementations must be safe for concurrent calls from many runs; a
//!   single run's calls are serialized by the caller (the execution engine).

use crate::error::Result;
use crate::format::{Checkpoint, CheckpointDraft, CheckpointInfo};
use async_trait::async_trait;

/// Pluggable durable or in-memory checkpoint backend.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist `draft`, assigning it a fresh monotonic sequence number for
    /// `draft.run_id`. Last write for a given (run_id, node_id) wins.
    async fn save(&self, draft: CheckpointDraft) -> Result<Checkpoint>;

    /// Load the checkpoint for an exact (run_id, node_id) key.
    async fn load(&self, run_id: &str, node_id: &str) -> Result<Checkpoint>;

    /// List all checkpoints for a run, ordered by sequence ascending. Unknown
    /// run ids yield an empty `Vec`, never an error.
    async fn list(&self, run_id: &str) -> Result<Vec<CheckpointInfo>>;

    /// Remove one entry. Idempotent: deleting an absent key is not an error.
    async fn delete(&self, run_id: &str, node_id: &str) -> Result<()>;

    /// Remove every entry for a run. Idempotent.
    async fn delete_run(&self, run_id: &str) -> Result<()>;

    /// Release backend resources. Further calls return `ClosedStore`.
    async fn close(&self) -> Result<()>;

    /// Load the checkpoint with the greatest sequence number for `run_id`.
    ///
    /// The default implementation is backend-agnostic: list, find the max
    /// sequence, then load that node's checkpoint. Backends with a cheaper
    /// "latest" query (an indexed `ORDER BY sequence DESC LIMIT 1`, say) may
    /// override this.
    async fn latest(&self, run_id: &str) -> Result<Checkpoint> {
        let infos = self.list(run_id).await?;
        let newest = infos
            .into_iter()
            .max_by_key(|info| info.sequence)
            .ok_or_else(|| crate::error::CheckpointError::NotFound(run_id.to_string()))?;
        self.load(run_id, &newest.node_id).await
    }
}
