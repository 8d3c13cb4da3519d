//! # Actor Context
//!
//! Everything a turn needs besides the actor itself: its address, the state
//! manager, the timer manager and the cancellation token of the running turn.
//!
//! ## Timers Per Activation
//!
//! The context remembers which timers were registered during the current
//! activation. Ticks for any other name are rejected by the runtime, and the
//! set is drained on deactivation so the timers can be dropped.
//!
//! ## Cancellation
//!
//! Every backend call made through the context, the state manager included,
//! races the turn's [`CancellationToken`]. Cancelling does not interrupt code
//! that is already running; it only cuts short the next suspension point.

use crate::address::{ActorAddress, ActorId};
use crate::backend::ActorBackend;
use crate::method::CallbackValidator;
use crate::reminder::{ActorReminder, ActorReminderToken};
use crate::state::ActorStateManager;
use crate::timer::{ActorTimer, ActorTimerToken};
use crate::timer_manager::ActorTimerManager;
use crate::types::{cancellable, ActorResult};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ActorContext {
    address: ActorAddress,
    state: ActorStateManager,
    timers: Arc<dyn ActorTimerManager>,
    validator: Arc<dyn CallbackValidator>,
    live_timers: HashSet<String>,
    cancel: CancellationToken,
}

impl ActorContext {
    pub fn new(
        address: ActorAddress,
        backend: Arc<dyn ActorBackend>,
        timers: Arc<dyn ActorTimerManager>,
        validator: Arc<dyn CallbackValidator>,
    ) -> Self {
        Self {
            state: ActorStateManager::new(address.clone(), backend),
            address,
            timers,
            validator,
            live_timers: HashSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.address.actor_id
    }

    pub fn actor_type(&self) -> &str {
        &self.address.actor_type
    }

    pub fn state(&mut self) -> &mut ActorStateManager {
        &mut self.state
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Installs the cancellation token of the turn about to run.
    pub fn begin_turn(&mut self, token: CancellationToken) {
        self.state.set_cancellation_token(token.clone());
        self.cancel = token;
    }

    /// Registers a timer that invokes `callback` on every tick.
    ///
    /// The callback is validated first; an invalid callback never reaches the
    /// backend. Re-registering a name replaces the earlier timer.
    pub async fn register_timer(
        &mut self,
        name: &str,
        callback: &str,
        state: Vec<u8>,
        due_time: Duration,
        period: Duration,
    ) -> ActorResult<ActorTimer> {
        let timer = ActorTimer::new(&self.address, name, callback, state, due_time, period);
        self.register_actor_timer(&timer).await?;
        Ok(timer)
    }

    pub async fn register_actor_timer(&mut self, timer: &ActorTimer) -> ActorResult<()> {
        self.validator
            .validate_timer_callback(&self.address.actor_type, &timer.callback)?;
        cancellable(&self.cancel, self.timers.register_timer(timer)).await?;
        self.live_timers.insert(timer.name.clone());
        debug!(actor = %self.address, timer = %timer.name, callback = %timer.callback, "Timer registered");
        Ok(())
    }

    pub async fn unregister_timer(&mut self, name: &str) -> ActorResult<()> {
        let token = ActorTimerToken::new(&self.address, name);
        cancellable(&self.cancel, self.timers.unregister_timer(&token)).await?;
        self.live_timers.remove(name);
        Ok(())
    }

    pub async fn register_reminder(
        &mut self,
        name: &str,
        state: Vec<u8>,
        due_time: Duration,
        period: Duration,
    ) -> ActorResult<ActorReminder> {
        let reminder = ActorReminder::new(&self.address, name, state, due_time, period);
        self.register_actor_reminder(&reminder).await?;
        Ok(reminder)
    }

    pub async fn register_actor_reminder(&mut self, reminder: &ActorReminder) -> ActorResult<()> {
        cancellable(&self.cancel, self.timers.register_reminder(reminder)).await?;
        debug!(actor = %self.address, reminder = %reminder.name, "Reminder registered");
        Ok(())
    }

    pub async fn unregister_reminder(&mut self, name: &str) -> ActorResult<()> {
        let token = ActorReminderToken::new(&self.address, name);
        cancellable(&self.cancel, self.timers.unregister_reminder(&token)).await
    }

    pub async fn get_reminder(&mut self, name: &str) -> ActorResult<Option<ActorReminder>> {
        let token = ActorReminderToken::new(&self.address, name);
        cancellable(&self.cancel, self.timers.get_reminder(&token)).await
    }

    /// Whether `name` was registered during this activation.
    pub fn has_timer(&self, name: &str) -> bool {
        self.live_timers.contains(name)
    }

    /// Timers registered during this activation, sorted.
    pub fn timer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.live_timers.iter().cloned().collect();
        names.sort();
        names
    }

    /// Forgets every timer of this activation and returns their tokens.
    pub fn invalidate_timers(&mut self) -> Vec<ActorTimerToken> {
        let mut tokens: Vec<ActorTimerToken> = self
            .live_timers
            .drain()
            .map(|name| ActorTimerToken::new(&self.address, name))
            .collect();
        tokens.sort_by(|a, b| a.name.cmp(&b.name));
        tokens
    }

    pub fn timer_manager(&self) -> &Arc<dyn ActorTimerManager> {
        &self.timers
    }
}

impl std::fmt::Debug for ActorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorContext")
            .field("address", &self.address)
            .field("live_timers", &self.live_timers)
            .finish()
    }
}
