//! # In-Memory Backend
//!
//! An [`ActorBackend`] that keeps timers, reminders and state in process
//! memory. Saves are applied as last-write-wins assignments, so replaying a
//! batch leaves the same state.
//!
//! Besides the backend contract it exposes inspection helpers (stored
//! records, save counts, the last batch) and one-shot fault injection, which
//! is what the runtime's own tests drive it with.

use async_trait::async_trait;
use roost_api::address::ActorId;
use roost_api::backend::{ActorBackend, StateChange, StateOperation};
use roost_api::errors::BackendError;
use roost_api::payload::{ReminderPayload, TimerPayload};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

type Key = (String, ActorId, String);

fn key(actor_type: &str, actor_id: &ActorId, name: &str) -> Key {
    (actor_type.to_string(), actor_id.clone(), name.to_string())
}

#[derive(Default)]
struct Inner {
    timers: HashMap<Key, Vec<u8>>,
    reminders: HashMap<Key, Vec<u8>>,
    state: HashMap<Key, Vec<u8>>,
    last_batch: Option<Vec<StateChange>>,
    save_count: usize,
    state_reads: usize,
    fail_next_save: Option<String>,
    fail_next_timer_op: Option<String>,
}

impl Inner {
    fn take_timer_fault(&mut self) -> Result<(), BackendError> {
        match self.fail_next_timer_op.take() {
            Some(reason) => Err(BackendError::Unavailable(reason)),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryBackend {
    inner: Mutex<Inner>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `save_state` fail with [`BackendError::Unavailable`].
    pub fn fail_next_save(&self, reason: impl Into<String>) {
        self.inner().fail_next_save = Some(reason.into());
    }

    /// Makes the next timer or reminder register/unregister call fail.
    pub fn fail_next_timer_op(&self, reason: impl Into<String>) {
        self.inner().fail_next_timer_op = Some(reason.into());
    }

    pub fn timer_payload(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Option<Vec<u8>> {
        self.inner().timers.get(&key(actor_type, actor_id, name)).cloned()
    }

    /// The stored timer record, decoded.
    pub fn timer_record(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Option<TimerPayload> {
        self.timer_payload(actor_type, actor_id, name)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    /// Names of the timers stored for one actor, sorted.
    pub fn timer_names(&self, actor_type: &str, actor_id: &ActorId) -> Vec<String> {
        names(&self.inner().timers, actor_type, actor_id)
    }

    pub fn timer_count(&self) -> usize {
        self.inner().timers.len()
    }

    pub fn reminder_payload(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Option<Vec<u8>> {
        self.inner().reminders.get(&key(actor_type, actor_id, name)).cloned()
    }

    pub fn reminder_record(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Option<ReminderPayload> {
        self.reminder_payload(actor_type, actor_id, name)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    pub fn reminder_names(&self, actor_type: &str, actor_id: &ActorId) -> Vec<String> {
        names(&self.inner().reminders, actor_type, actor_id)
    }

    pub fn stored_state(&self, actor_type: &str, actor_id: &ActorId, key_name: &str) -> Option<Vec<u8>> {
        self.inner().state.get(&key(actor_type, actor_id, key_name)).cloned()
    }

    /// Seeds a state value as if an earlier activation had saved it.
    pub fn put_state(&self, actor_type: &str, actor_id: &ActorId, key_name: &str, value: Vec<u8>) {
        self.inner().state.insert(key(actor_type, actor_id, key_name), value);
    }

    /// Number of `save_state` calls that reached the store.
    pub fn save_count(&self) -> usize {
        self.inner().save_count
    }

    pub fn last_batch(&self) -> Option<Vec<StateChange>> {
        self.inner().last_batch.clone()
    }

    /// Number of `get_state` calls served.
    pub fn state_reads(&self) -> usize {
        self.inner().state_reads
    }
}

fn names(map: &HashMap<Key, Vec<u8>>, actor_type: &str, actor_id: &ActorId) -> Vec<String> {
    let mut names: Vec<String> = map
        .keys()
        .filter(|(t, id, _)| t == actor_type && id == actor_id)
        .map(|(_, _, name)| name.clone())
        .collect();
    names.sort();
    names
}

#[async_trait]
impl ActorBackend for InMemoryBackend {
    async fn register_timer(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner();
        inner.take_timer_fault()?;
        inner.timers.insert(key(actor_type, actor_id, name), payload);
        Ok(())
    }

    async fn unregister_timer(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Result<(), BackendError> {
        let mut inner = self.inner();
        inner.take_timer_fault()?;
        inner.timers.remove(&key(actor_type, actor_id, name));
        Ok(())
    }

    async fn register_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner();
        inner.take_timer_fault()?;
        inner.reminders.insert(key(actor_type, actor_id, name), payload);
        Ok(())
    }

    async fn unregister_reminder(&self, actor_type: &str, actor_id: &ActorId, name: &str) -> Result<(), BackendError> {
        let mut inner = self.inner();
        inner.take_timer_fault()?;
        inner.reminders.remove(&key(actor_type, actor_id, name));
        Ok(())
    }

    async fn get_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
    ) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.reminder_payload(actor_type, actor_id, name))
    }

    async fn get_state(&self, actor_type: &str, actor_id: &ActorId, key_name: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let mut inner = self.inner();
        inner.state_reads += 1;
        Ok(inner.state.get(&key(actor_type, actor_id, key_name)).cloned())
    }

    async fn save_state(&self, actor_type: &str, actor_id: &ActorId, changes: Vec<StateChange>) -> Result<(), BackendError> {
        let mut inner = self.inner();
        if let Some(reason) = inner.fail_next_save.take() {
            return Err(BackendError::Unavailable(reason));
        }
        for change in &changes {
            let entry = key(actor_type, actor_id, &change.key);
            match &change.operation {
                StateOperation::Upsert(value) => {
                    inner.state.insert(entry, value.clone());
                }
                StateOperation::Delete => {
                    inner.state.remove(&entry);
                }
            }
        }
        trace!(actor_type, actor_id = %actor_id, changes = changes.len(), "State batch applied");
        inner.save_count += 1;
        inner.last_batch = Some(changes);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner();
        f.debug_struct("InMemoryBackend")
            .field("timers", &inner.timers.len())
            .field("reminders", &inner.reminders.len())
            .field("state", &inner.state.len())
            .finish()
    }
}
