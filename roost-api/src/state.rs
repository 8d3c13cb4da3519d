//! # Actor State Manager
//!
//! Per-activation cache of named state values with a batched commit to the
//! backend.
//!
//! ## Key Concepts
//!
//! - Reads of an uncached key fetch from the backend once and cache the result.
//! - Writes and removals only touch the cache and mark the entry with a
//!   [`StateChangeKind`].
//! - [`ActorStateManager::save_state`] sends every tracked change in one
//!   batch, sorted by key. An empty batch is never sent.
//! - A failed save leaves every tracked change in place so a retried save
//!   sends the same batch again.
//! - [`ActorStateManager::clear_cache`] drops everything without touching
//!   the backend.
//!
//! Values are stored as JSON. Only the turn that currently owns the actor
//! holds the manager, so no locking is needed.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let count: i64 = ctx.state().get_or_add_state("count", 0).await?;
//! ctx.state().set_state("count", &(count + 1))?;
//! ctx.state().save_state().await?;
//! ```

use crate::address::ActorAddress;
use crate::backend::{ActorBackend, StateChange};
use crate::errors::{ActorError, BackendError};
use crate::types::{cancellable, ActorResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a cached entry differs from what the backend holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeKind {
    /// In sync with the backend
    None,
    /// Not yet in the backend
    Add,
    /// Present in the backend with an older value
    Update,
    /// Present in the backend, pending deletion
    Remove,
}

#[derive(Debug, Clone)]
struct StateEntry {
    value: Vec<u8>,
    kind: StateChangeKind,
}

impl StateEntry {
    fn new(value: Vec<u8>, kind: StateChangeKind) -> Self {
        Self { value, kind }
    }
}

/// Cached view of one actor's state.
pub struct ActorStateManager {
    address: ActorAddress,
    backend: Arc<dyn ActorBackend>,
    cache: HashMap<String, StateEntry>,
    cancel: CancellationToken,
}

impl ActorStateManager {
    pub fn new(address: ActorAddress, backend: Arc<dyn ActorBackend>) -> Self {
        Self {
            address,
            backend,
            cache: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    /// Token honoured by every backend call made from here on.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    /// Reads `key`, failing with [`ActorError::KeyNotFound`] when absent.
    pub async fn get_state<T: DeserializeOwned>(&mut self, key: &str) -> ActorResult<T> {
        self.try_get_state(key)
            .await?
            .ok_or_else(|| ActorError::KeyNotFound(key.to_string()))
    }

    pub async fn try_get_state<T: DeserializeOwned>(&mut self, key: &str) -> ActorResult<Option<T>> {
        if let Some(entry) = self.cache.get(key) {
            if entry.kind == StateChangeKind::Remove {
                return Ok(None);
            }
            return Ok(Some(serde_json::from_slice(&entry.value)?));
        }

        match self.fetch(key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)?;
                self.cache
                    .insert(key.to_string(), StateEntry::new(bytes, StateChangeKind::None));
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Stores `value` under `key` in the cache.
    pub fn set_state<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> ActorResult<()> {
        let bytes = serde_json::to_vec(value)?;
        match self.cache.get_mut(key) {
            Some(entry) => {
                entry.value = bytes;
                if matches!(entry.kind, StateChangeKind::None | StateChangeKind::Remove) {
                    entry.kind = StateChangeKind::Update;
                }
            }
            None => {
                self.cache
                    .insert(key.to_string(), StateEntry::new(bytes, StateChangeKind::Update));
            }
        }
        Ok(())
    }

    /// Adds `key`, failing with [`ActorError::StateAlreadyExists`] if present.
    pub async fn add_state<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> ActorResult<()> {
        if self.try_add_state(key, value).await? {
            Ok(())
        } else {
            Err(ActorError::StateAlreadyExists(key.to_string()))
        }
    }

    pub async fn try_add_state<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> ActorResult<bool> {
        let bytes = serde_json::to_vec(value)?;
        if let Some(entry) = self.cache.get_mut(key) {
            if entry.kind != StateChangeKind::Remove {
                return Ok(false);
            }
            *entry = StateEntry::new(bytes, StateChangeKind::Update);
            return Ok(true);
        }

        if self.fetch(key).await?.is_some() {
            return Ok(false);
        }
        self.cache
            .insert(key.to_string(), StateEntry::new(bytes, StateChangeKind::Add));
        Ok(true)
    }

    /// Removes `key`, failing with [`ActorError::KeyNotFound`] when absent.
    pub async fn remove_state(&mut self, key: &str) -> ActorResult<()> {
        if self.try_remove_state(key).await? {
            Ok(())
        } else {
            Err(ActorError::KeyNotFound(key.to_string()))
        }
    }

    pub async fn try_remove_state(&mut self, key: &str) -> ActorResult<bool> {
        if let Some(entry) = self.cache.get_mut(key) {
            let kind = entry.kind;
            return Ok(match kind {
                StateChangeKind::Remove => false,
                StateChangeKind::Add => {
                    // never reached the backend
                    self.cache.remove(key);
                    true
                }
                StateChangeKind::None | StateChangeKind::Update => {
                    entry.kind = StateChangeKind::Remove;
                    true
                }
            });
        }

        if self.fetch(key).await?.is_some() {
            self.cache
                .insert(key.to_string(), StateEntry::new(Vec::new(), StateChangeKind::Remove));
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn contains_state(&mut self, key: &str) -> ActorResult<bool> {
        if let Some(entry) = self.cache.get(key) {
            return Ok(entry.kind != StateChangeKind::Remove);
        }
        Ok(self.fetch(key).await?.is_some())
    }

    /// Returns the stored value, adding `value` first when absent.
    pub async fn get_or_add_state<T>(&mut self, key: &str, value: T) -> ActorResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(existing) = self.try_get_state(key).await? {
            return Ok(existing);
        }
        let kind = match self.cache.get(key) {
            Some(entry) if entry.kind == StateChangeKind::Remove => StateChangeKind::Update,
            _ => StateChangeKind::Add,
        };
        self.cache
            .insert(key.to_string(), StateEntry::new(serde_json::to_vec(&value)?, kind));
        Ok(value)
    }

    /// Adds `add_value` when `key` is absent, otherwise stores
    /// `update(key, current)`. Returns the value now cached.
    pub async fn add_or_update_state<T, F>(&mut self, key: &str, add_value: T, update: F) -> ActorResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&str, T) -> T,
    {
        let (value, kind) = match self.try_get_state::<T>(key).await? {
            Some(current) => (update(key, current), StateChangeKind::Update),
            None => match self.cache.get(key) {
                Some(entry) if entry.kind == StateChangeKind::Remove => (add_value, StateChangeKind::Update),
                _ => (add_value, StateChangeKind::Add),
            },
        };

        let bytes = serde_json::to_vec(&value)?;
        let kind = match self.cache.get(key) {
            Some(entry) if entry.kind == StateChangeKind::Add => StateChangeKind::Add,
            _ => kind,
        };
        self.cache.insert(key.to_string(), StateEntry::new(bytes, kind));
        Ok(value)
    }

    /// Cached keys that are not pending removal, sorted.
    pub fn state_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .cache
            .iter()
            .filter(|(_, entry)| entry.kind != StateChangeKind::Remove)
            .map(|(key, _)| key.clone())
            .collect();
        names.sort();
        names
    }

    pub fn change_kind(&self, key: &str) -> Option<StateChangeKind> {
        self.cache.get(key).map(|entry| entry.kind)
    }

    pub fn has_pending_changes(&self) -> bool {
        self.cache
            .values()
            .any(|entry| entry.kind != StateChangeKind::None)
    }

    /// Commits every tracked change in one batch.
    ///
    /// On failure nothing is marked clean, so calling again resends the batch.
    pub async fn save_state(&mut self) -> ActorResult<()> {
        let mut changes: Vec<StateChange> = self
            .cache
            .iter()
            .filter_map(|(key, entry)| match entry.kind {
                StateChangeKind::None => None,
                StateChangeKind::Add | StateChangeKind::Update => {
                    Some(StateChange::upsert(key.clone(), entry.value.clone()))
                }
                StateChangeKind::Remove => Some(StateChange::delete(key.clone())),
            })
            .collect();
        if changes.is_empty() {
            return Ok(());
        }
        changes.sort_by(|a, b| a.key.cmp(&b.key));

        let count = changes.len();
        cancellable(
            &self.cancel,
            self.backend
                .save_state(&self.address.actor_type, &self.address.actor_id, changes),
        )
        .await?;

        self.cache
            .retain(|_, entry| entry.kind != StateChangeKind::Remove);
        for entry in self.cache.values_mut() {
            entry.kind = StateChangeKind::None;
        }
        debug!(actor = %self.address, changes = count, "State saved");
        Ok(())
    }

    /// Drops the whole cache, including unsaved changes.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    async fn fetch(&self, key: &str) -> ActorResult<Option<Vec<u8>>> {
        let result = cancellable(
            &self.cancel,
            self.backend
                .get_state(&self.address.actor_type, &self.address.actor_id, key),
        )
        .await;
        match result {
            Err(ActorError::Backend(BackendError::NotFound(_))) => Ok(None),
            other => other,
        }
    }
}

impl std::fmt::Debug for ActorStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorStateManager")
            .field("address", &self.address)
            .field("cached", &self.cache.len())
            .finish()
    }
}
