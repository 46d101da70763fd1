//! State (de)serialization for checkpointing. The engine carries state as an
//! opaque `S: Clone + Send + Sync + 'static`; a [`StateCodec`] is the bridge
//! to the bytes a [`CheckpointStore`](workgraph_checkpoint::CheckpointStore)
//! can persist.

use crate::error::StepError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Encodes/decodes a run's state to/from the bytes stored in a checkpoint.
/// Mirrors the corpus's serializer-protocol split between wire format and
/// storage: this crate ships [`JsonCodec`], a host may supply its own (e.g.
/// bincode) for smaller checkpoints or schema evolution it controls.
pub trait StateCodec<S>: Send + Sync {
    fn encode(&self, state: &S) -> Result<Vec<u8>, StepError>;
    fn decode(&self, bytes: &[u8]) -> Result<S, StepError>;
}

/// Default codec: `serde_json`. Human-readable checkpoints, no schema
/// registration, works for any `S: Serialize + DeserializeOwned`.
pub struct JsonCodec<S> {
    _marker: PhantomData<fn() -> S>,
}

impl<S> JsonCodec<S> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<S> Default for JsonCodec<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for JsonCodec<S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S: Serialize + DeserializeOwned + Send + Sync> StateCodec<S> for JsonCodec<S> {
    fn encode(&self, state: &S) -> Result<Vec<u8>, StepError> {
        serde_json::to_vec(state).map_err(|e| Box::new(e) as StepError)
    }

    fn decode(&self, bytes: &[u8]) -> Result<S, StepError> {
        serde_json::from_slice(bytes).map_err(|e| Box::new(e) as StepError)
    }
}
