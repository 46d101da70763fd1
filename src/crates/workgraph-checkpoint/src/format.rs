//! The version-1 checkpoint wire format.
//!
//! A [`Checkpoint`] is the durable record produced after a node completes: it
//! carries enough information for `resume` to pick up a run at the next node
//! without re-executing the node that just finished. Field names and meaning
//! are part of this crate's stable surface; callers may inspect and migrate
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version. Bump on breaking changes to the fields below.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything the caller supplies when asking a store to persist a checkpoint;
/// the store fills in `version`, `sequence`, and `timestamp` on [`Save`](crate::store::CheckpointStore::save).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointDraft {
    pub run_id: String,
    pub node_id: String,
    /// Opaque bytes produced by the engine's state codec.
    pub state: Vec<u8>,
    /// Node id at which Resume should continue.
    pub next_node: String,
    /// Attempt count of the node that just completed. Defaults to 1.
    pub attempt: u32,
    /// Debugging hint: the node that ran immediately before this one.
    pub prev_node_id: Option<String>,
}

/// A durable snapshot of a completed node, as stored and returned by a
/// [`CheckpointStore`](crate::store::CheckpointStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub run_id: String,
    pub node_id: String,
    /// Monotonically increasing within `run_id`, assigned by the store.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub state: Vec<u8>,
    pub next_node: String,
    pub attempt: u32,
    pub prev_node_id: Option<String>,
}

impl Checkpoint {
    pub(crate) fn from_draft(draft: CheckpointDraft, sequence: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            run_id: draft.run_id,
            node_id: draft.node_id,
            sequence,
            timestamp,
            state: draft.state,
            next_node: draft.next_node,
            attempt: draft.attempt,
            prev_node_id: draft.prev_node_id,
        }
    }
}

/// Metadata-only view of a checkpoint, as returned by
/// [`CheckpointStore::list`](crate::store::CheckpointStore::list). Does not
/// carry the state bytes, so listing a run's history never pays for copying
/// potentially large snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointInfo {
    pub run_id: String,
    pub node_id: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub size: usize,
}

impl From<&Checkpoint> for CheckpointInfo {
    fn from(cp: &Checkpoint) -> Self {
        Self {
            run_id: cp.run_id.clone(),
            node_id: cp.node_id.clone(),
            sequence: cp.sequence,
            timestamp: cp.timestamp,
            size: cp.state.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_to_checkpoint_fills_version_and_sequence() {
        let draft = CheckpointDraft {
            run_id: "r1".into(),
            node_id: "a".into(),
            state: vec![1, 2, 3],
            next_node: "b".into(),
            attempt: 1,
            prev_node_id: None,
        };
        let now = Utc::now();
        let cp = Checkpoint::from_draft(draft, 1, now);
        assert_eq!(cp.version, SCHEMA_VERSION);
        assert_eq!(cp.sequence, 1);
        assert_eq!(cp.state, vec![1, 2, 3]);
    }

    #[test]
    fn checkpoint_info_reports_byte_size_not_contents() {
        let cp = Checkpoint {
            version: SCHEMA_VERSION,
            run_id: "r1".into(),
            node_id: "a".into(),
            sequence: 1,
            timestamp: Utc::now(),
            state: vec![0u8; 16],
            next_node: "b".into(),
            attempt: 1,
            prev_node_id: None,
        };
        let info = CheckpointInfo::from(&cp);
        assert_eq!(info.size, 16);
    }
}
