//! Default [`ActorTimerManager`]: encodes registrations into their wire
//! records and forwards them to the backend.

use async_trait::async_trait;
use roost_api::backend::ActorBackend;
use roost_api::errors::{ActorError, BackendError};
use roost_api::payload::ReminderPayload;
use roost_api::reminder::{ActorReminder, ActorReminderToken};
use roost_api::timer::{ActorTimer, ActorTimerToken};
use roost_api::timer_manager::ActorTimerManager;
use roost_api::types::ActorResult;
use std::sync::Arc;
use tracing::debug;

pub struct DefaultActorTimerManager {
    backend: Arc<dyn ActorBackend>,
}

impl DefaultActorTimerManager {
    pub fn new(backend: Arc<dyn ActorBackend>) -> Self {
        Self { backend }
    }
}

// Unregistering something already gone counts as done.
fn ignore_not_found(result: Result<(), BackendError>) -> ActorResult<()> {
    match result {
        Ok(()) | Err(BackendError::NotFound(_)) => Ok(()),
        Err(err) => Err(ActorError::Backend(err)),
    }
}

#[async_trait]
impl ActorTimerManager for DefaultActorTimerManager {
    async fn register_timer(&self, timer: &ActorTimer) -> ActorResult<()> {
        let payload = serde_json::to_vec(&timer.to_payload())?;
        self.backend
            .register_timer(&timer.actor_type, &timer.actor_id, &timer.name, payload)
            .await?;
        debug!(actor_type = %timer.actor_type, actor_id = %timer.actor_id, timer = %timer.name, "Timer stored");
        Ok(())
    }

    async fn unregister_timer(&self, token: &ActorTimerToken) -> ActorResult<()> {
        ignore_not_found(
            self.backend
                .unregister_timer(&token.actor_type, &token.actor_id, &token.name)
                .await,
        )
    }

    async fn register_reminder(&self, reminder: &ActorReminder) -> ActorResult<()> {
        let payload = serde_json::to_vec(&reminder.to_payload())?;
        self.backend
            .register_reminder(&reminder.actor_type, &reminder.actor_id, &reminder.name, payload)
            .await?;
        debug!(
            actor_type = %reminder.actor_type,
            actor_id = %reminder.actor_id,
            reminder = %reminder.name,
            "Reminder stored"
        );
        Ok(())
    }

    async fn unregister_reminder(&self, token: &ActorReminderToken) -> ActorResult<()> {
        ignore_not_found(
            self.backend
                .unregister_reminder(&token.actor_type, &token.actor_id, &token.name)
                .await,
        )
    }

    async fn get_reminder(&self, token: &ActorReminderToken) -> ActorResult<Option<ActorReminder>> {
        let stored = match self
            .backend
            .get_reminder(&token.actor_type, &token.actor_id, &token.name)
            .await
        {
            Ok(Some(stored)) => stored,
            Ok(None) | Err(BackendError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let payload: ReminderPayload = serde_json::from_slice(&stored)?;
        Ok(Some(ActorReminder::from_payload(token.clone(), payload)?))
    }
}

impl std::fmt::Debug for DefaultActorTimerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultActorTimerManager").finish_non_exhaustive()
    }
}
