//! Single-process durable checkpoint backend backed by SQLite.
//!
//! [`SqliteCheckpointStore`] opens (or creates) a database file, sets
//! restrictive file permissions on Unix, and enables `PRAGMA journal_mode=WAL`
//! so readers never block behind an in-flight writer. `rusqlite` is
//! synchronous, so every call is dispatched to `tokio::task::spawn_blocking`
//! against a `Mutex<Connection>` shared by `Arc`.

use crate::error::{CheckpointError, Result};
use crate::format::{Checkpoint, CheckpointDraft, CheckpointInfo};
use crate::store::CheckpointStore;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Durable checkpoint store backed by a single SQLite file.
pub struct SqliteCheckpointStore {
    conn: Arc<Mutex<Connection>>,
    closed: Arc<AtomicBool>,
}

impl SqliteCheckpointStore {
    /// Open (creating if absent) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to open sqlite checkpoint database");
            CheckpointError::Storage(format!("opening {}: {e}", path.display()))
        })?;
        Self::restrict_permissions(path)?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// In-process-only SQLite store, handy for tests that want the SQL code
    /// path without a temp file.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CheckpointError::Storage(format!("opening in-memory db: {e}")))?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    #[cfg(unix)]
    fn restrict_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn restrict_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CheckpointError::Storage(format!("enabling WAL: {e}")))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS checkpoints (
                run_id        TEXT NOT NULL,
                node_id       TEXT NOT NULL,
                sequence      INTEGER NOT NULL,
                timestamp     TEXT NOT NULL,
                state         BLOB NOT NULL,
                next_node     TEXT NOT NULL,
                attempt       INTEGER NOT NULL,
                prev_node_id  TEXT,
                PRIMARY KEY (run_id, node_id)
            );
            CREATE INDEX IF NOT EXISTS idx_checkpoints_run_seq
                ON checkpoints (run_id, sequence);",
        )
        .map_err(|e| CheckpointError::Storage(format!("creating schema: {e}")))?;
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!("checkpoint operation rejected: store is closed");
            Err(CheckpointError::ClosedStore)
        } else {
            Ok(())
        }
    }

    fn row_to_checkpoint(row: &rusqlite::Row<'_>) -> rusqlite::Result<Checkpoint> {
        let ts_raw: String = row.get(3)?;
        let timestamp = parse_timestamp(&ts_raw);
        Ok(Checkpoint {
            version: crate::format::SCHEMA_VERSION,
            run_id: row.get(0)?,
            node_id: row.get(1)?,
            sequence: row.get::<_, i64>(2)? as u64,
            timestamp,
            state: row.get(4)?,
            next_node: row.get(5)?,
            attempt: row.get::<_, i64>(6)? as u32,
            prev_node_id: row.get(7)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).unwrap())
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn save(&self, draft: CheckpointDraft) -> Result<Checkpoint> {
        self.check_open()?;
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Checkpoint> {
            let conn = conn.lock().expect("sqlite connection mutex poisoned");
            let next_sequence: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(sequence), 0) + 1 FROM checkpoints WHERE run_id = ?1",
                    params![draft.run_id],
                    |row| row.get(0),
                )
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let timestamp = Utc::now();
            conn.execute(
                "INSERT INTO checkpoints
                    (run_id, node_id, sequence, timestamp, state, next_node, attempt, prev_node_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(run_id, node_id) DO UPDATE SET
                    sequence = excluded.sequence,
                    timestamp = excluded.timestamp,
                    state = excluded.state,
                    next_node = excluded.next_node,
                    attempt = excluded.attempt,
                    prev_node_id = excluded.prev_node_id",
                params![
                    draft.run_id,
                    draft.node_id,
                    next_sequence,
                    timestamp.to_rfc3339(),
                    draft.state,
                    draft.next_node,
                    draft.attempt,
                    draft.prev_node_id,
                ],
            )
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok(Checkpoint::from_draft(draft, next_sequence as u64, timestamp))
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sqlite checkpoint task panicked");
            CheckpointError::Storage(format!("blocking task panicked: {e}"))
        })?
    }

    async fn load(&self, run_id: &str, node_id: &str) -> Result<Checkpoint> {
        self.check_open()?;
        let conn = self.conn.clone();
        let run_id = run_id.to_string();
        let node_id = node_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Checkpoint> {
            let conn = conn.lock().expect("sqlite connection mutex poisoned");
            conn.query_row(
                "SELECT run_id, node_id, sequence, timestamp, state, next_node, attempt, prev_node_id
                 FROM checkpoints WHERE run_id = ?1 AND node_id = ?2",
                params![run_id, node_id],
                Self::row_to_checkpoint,
            )
            .optional()
            .map_err(|e| CheckpointError::Storage(e.to_string()))?
            .ok_or_else(|| CheckpointError::NotFound(format!("{run_id}/{node_id}")))
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sqlite checkpoint task panicked");
            CheckpointError::Storage(format!("blocking task panicked: {e}"))
        })?
    }

    async fn list(&self, run_id: &str) -> Result<Vec<CheckpointInfo>> {
        self.check_open()?;
        let conn = self.conn.clone();
        let run_id = run_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<CheckpointInfo>> {
            let conn = conn.lock().expect("sqlite connection mutex poisoned");
            let mut stmt = conn
                .prepare(
                    "SELECT run_id, node_id, sequence, timestamp, length(state)
                     FROM checkpoints WHERE run_id = ?1 ORDER BY sequence ASC",
                )
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params![run_id], |row| {
                    Ok(CheckpointInfo {
                        run_id: row.get(0)?,
                        node_id: row.get(1)?,
                        sequence: row.get::<_, i64>(2)? as u64,
                        timestamp: parse_timestamp(&row.get::<_, String>(3)?),
                        size: row.get::<_, i64>(4)? as usize,
                    })
                })
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| CheckpointError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sqlite checkpoint task panicked");
            CheckpointError::Storage(format!("blocking task panicked: {e}"))
        })?
    }

    async fn delete(&self, run_id: &str, node_id: &str) -> Result<()> {
        self.check_open()?;
        let conn = self.conn.clone();
        let run_id = run_id.to_string();
        let node_id = node_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = conn.lock().expect("sqlite connection mutex poisoned");
            conn.execute(
                "DELETE FROM checkpoints WHERE run_id = ?1 AND node_id = ?2",
                params![run_id, node_id],
            )
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sqlite checkpoint task panicked");
            CheckpointError::Storage(format!("blocking task panicked: {e}"))
        })?
    }

    async fn delete_run(&self, run_id: &str) -> Result<()> {
        self.check_open()?;
        let conn = self.conn.clone();
        let run_id = run_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = conn.lock().expect("sqlite connection mutex poisoned");
            conn.execute("DELETE FROM checkpoints WHERE run_id = ?1", params![run_id])
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "sqlite checkpoint task panicked");
            CheckpointError::Storage(format!("blocking task panicked: {e}"))
        })?
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
