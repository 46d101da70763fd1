//! In-memory checkpoint storage for development and testing.
//!
//! [`InMemoryCheckpointStore`] keeps every checkpoint in a
//! `Arc<RwLock<HashMap<..>>>` keyed by run id. It never persists across
//! process restarts; use the `sqlite` feature's
//! [`SqliteCheckpointStore`](crate::sqlite::SqliteCheckpointStore) when a run
//! must survive a crash.

use crate::error::{CheckpointError, Result};
use crate::format::{Checkpoint, CheckpointDraft, CheckpointInfo};
use crate::store::CheckpointStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

type RunEntries = HashMap<String, Checkpoint>;

/// Thread-safe, process-local checkpoint backend.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    runs: Arc<RwLock<HashMap<String, RunEntries>>>,
    sequences: Arc<RwLock<HashMap<String, u64>>>,
    closed: AtomicBool,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!("checkpoint operation rejected: store is closed");
            Err(CheckpointError::ClosedStore)
        } else {
            Ok(())
        }
    }

    /// Number of distinct runs currently tracked. Mainly useful in tests.
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, draft: CheckpointDraft) -> Result<Checkpoint> {
        self.check_open()?;
        let mut sequences = self.sequences.write().await;
        let sequence = sequences.entry(draft.run_id.clone()).or_insert(0);
        *sequence += 1;
        let checkpoint = Checkpoint::from_draft(draft, *sequence, Utc::now());

        let mut runs = self.runs.write().await;
        runs.entry(checkpoint.run_id.clone())
            .or_default()
            .insert(checkpoint.node_id.clone(), checkpoint.clone());
        Ok(checkpoint)
    }

    async fn load(&self, run_id: &str, node_id: &str) -> Result<Checkpoint> {
        self.check_open()?;
        let runs = self.runs.read().await;
        runs.get(run_id)
            .and_then(|entries| entries.get(node_id))
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(format!("{run_id}/{node_id}")))
    }

    async fn list(&self, run_id: &str) -> Result<Vec<CheckpointInfo>> {
        self.check_open()?;
        let runs = self.runs.read().await;
        let mut infos: Vec<CheckpointInfo> = runs
            .get(run_id)
            .map(|entries| entries.values().map(CheckpointInfo::from).collect())
            .unwrap_or_default();
        infos.sort_by_key(|info| info.sequence);
        Ok(infos)
    }

    async fn delete(&self, run_id: &str, node_id: &str) -> Result<()> {
        self.check_open()?;
        if let Some(entries) = self.runs.write().await.get_mut(run_id) {
            entries.remove(node_id);
        }
        Ok(())
    }

    async fn delete_run(&self, run_id: &str) -> Result<()> {
        self.check_open()?;
        self.runs.write().await.remove(run_id);
        self.sequences.write().await.remove(run_id);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
