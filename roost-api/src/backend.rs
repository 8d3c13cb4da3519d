//! # Backend Accessor
//!
//! The backend owns durable scheduling and persistent storage. The runtime
//! only relies on the operations below; transport, retry policy and the
//! storage engine live behind the implementation.
//!
//! ## Contract
//!
//! - Every call is scoped by actor type and actor id.
//! - Timer and reminder payloads are opaque encoded records (JSON bytes); the
//!   backend stores and returns them as given.
//! - `save_state` applies a batch as last-write-wins assignments, so sending
//!   the same batch twice leaves the same stored state.
//! - Missing timers, reminders and keys may be reported either as `Ok(None)`
//!   or as [`BackendError::NotFound`]; callers accept both.

use crate::address::ActorId;
use crate::errors::BackendError;
use async_trait::async_trait;

/// One entry of a state commit batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub key: String,
    pub operation: StateOperation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateOperation {
    /// Store the serialized value under the key
    Upsert(Vec<u8>),
    /// Delete the key
    Delete,
}

impl StateChange {
    pub fn upsert(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            operation: StateOperation::Upsert(value),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operation: StateOperation::Delete,
        }
    }
}

/// Operations the runtime requires from the remote backend.
#[async_trait]
pub trait ActorBackend: Send + Sync + 'static {
    async fn register_timer(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<(), BackendError>;

    async fn unregister_timer(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Result<(), BackendError>;

    async fn register_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<(), BackendError>;

    async fn unregister_reminder(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Result<(), BackendError>;

    async fn get_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
    ) -> Result<Option<Vec<u8>>, BackendError>;

    async fn get_state(&self, actor_type: &str, actor_id: &ActorId, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Applies a batch of changes atomically.
    async fn save_state(&self, actor_type: &str, actor_id: &ActorId, changes: Vec<StateChange>) -> Result<(), BackendError>;
}
