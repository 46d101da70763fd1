//! # workgraph-checkpoint: durable snapshots for graph execution
//!
//! This crate defines the [`CheckpointStore`] trait, the extension point a
//! host application implements to persist checkpoints in Postgres, Redis,
//! S3, or anything else, plus two ready-to-use backends:
//!
//! - [`InMemoryCheckpointStore`]: process-local, ephemeral, zero setup.
//! - [`SqliteCheckpointStore`] (feature `sqlite`, default-on): a single file,
//!   WAL-mode SQLite database suitable for single-process durability.
//!
//! A [`Checkpoint`] is the version-1 wire format: schema version, run id,
//! node id, a store-assigned monotonic sequence, a UTC timestamp, opaque
//! state bytes, the next node to resume at, an attempt count, and an
//! optional debugging hint naming the previous node. The engine crate
//! (`workgraph-core`) is responsible for encoding/decoding the `state` bytes
//! for its generic state type; this crate never looks inside them.

pub mod error;
pub mod format;
pub mod memory;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{CheckpointError, Result};
pub use format::{Checkpoint, CheckpointDraft, CheckpointInfo, SCHEMA_VERSION};
pub use memory::InMemoryCheckpointStore;
pub use store::CheckpointStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCheckpointStore;
