use crate::reminder::{ActorReminder, ActorReminderToken};
use crate::timer::{ActorTimer, ActorTimerToken};
use crate::types::ActorResult;
use async_trait::async_trait;

/// Registers, unregisters and queries timers and reminders.
///
/// Implementations encode durations with [`crate::duration`] and forward the
/// records to the backend keyed by `(actor_type, actor_id, name)`.
/// Callback validation happens before a timer reaches this trait.
#[async_trait]
pub trait ActorTimerManager: Send + Sync {
    async fn register_timer(&self, timer: &ActorTimer) -> ActorResult<()>;

    /// Unregistering an unknown timer succeeds.
    async fn unregister_timer(&self, token: &ActorTimerToken) -> ActorResult<()>;

    async fn register_reminder(&self, reminder: &ActorReminder) -> ActorResult<()>;

    /// Unregistering an unknown reminder succeeds.
    async fn unregister_reminder(&self, token: &ActorReminderToken) -> ActorResult<()>;

    /// Returns `None` when no reminder is registered under the token's name.
    async fn get_reminder(&self, token: &ActorReminderToken) -> ActorResult<Option<ActorReminder>>;
}
