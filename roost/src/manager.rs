//! # Actor Type Manager
//!
//! One manager per registered actor type. It owns the activation table for
//! that type and is the only place envelopes enter a mailbox.
//!
//! ## Key Responsibilities
//! - Routing requests to the mailbox of their actor id
//! - Starting an activation worker for ids that have none
//! - Answering activation state and idle queries for the sweeper
//!
//! The runtime talks to managers through [`ManageActors`], which erases the
//! actor type so managers of different types share one map.

use crate::activation::{lock, ActivationSlot, ActivationState, ActivationStats, ActivationStatus, ActivationTable, ActivationWorker};
use crate::config::{ActorTypeConfig, DEFAULT_IDLE_TIMEOUT};
use crate::envelope::{ActorRequest, Envelope};
use crate::error::MailboxError;
use crate::mailbox::mailbox;
use crate::registry::CallbackRegistry;
use crate::reply::{reply_channel, TurnResult};
use crate::actor_span;
use roost_api::actor::{Actor, ActorFactory};
use roost_api::address::ActorId;
use roost_api::backend::ActorBackend;
use roost_api::method::{CallbackValidator, MethodTable};
use roost_api::timer_manager::ActorTimerManager;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, Instrument};

/// Everything the workers of one actor type share.
pub(crate) struct ActorTypeShared<A: Actor> {
    pub(crate) factory: Box<dyn ActorFactory<A>>,
    pub(crate) methods: Arc<MethodTable<A>>,
    pub(crate) registry: Arc<CallbackRegistry>,
    pub(crate) backend: Arc<dyn ActorBackend>,
    pub(crate) timers: Arc<dyn ActorTimerManager>,
    pub(crate) validator: Arc<dyn CallbackValidator>,
    /// Already merged with the runtime defaults
    pub(crate) config: ActorTypeConfig,
}

/// Type-erased view of an [`ActorManager`].
pub(crate) trait ManageActors: Send + Sync {
    fn actor_type(&self) -> &'static str;

    fn config(&self) -> &ActorTypeConfig;

    /// Queues a turn and returns the receiver of its reply.
    fn dispatch(&self, request: ActorRequest) -> Result<oneshot::Receiver<TurnResult>, MailboxError>;

    /// Queues a deactivation. `None` when the id has no live worker.
    fn deactivate(&self, id: &ActorId) -> Result<Option<oneshot::Receiver<()>>, MailboxError>;

    fn activation_state(&self, id: &ActorId) -> ActivationState;

    fn activation_stats(&self, id: &ActorId) -> Option<ActivationStats>;

    /// Ids with a live activation, sorted.
    fn active_ids(&self) -> Vec<ActorId>;

    /// Ids idle for at least the type's idle timeout with nothing queued.
    fn idle_ids(&self, now: Instant) -> Vec<ActorId>;
}

pub(crate) struct ActorManager<A: Actor> {
    shared: Arc<ActorTypeShared<A>>,
    table: Arc<ActivationTable>,
}

impl<A: Actor> ActorManager<A> {
    pub(crate) fn new(shared: ActorTypeShared<A>) -> Self {
        Self {
            shared: Arc::new(shared),
            table: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // Pushes under the table lock so a retiring worker never misses it.
    fn push(&self, id: &ActorId, envelope: Envelope) -> Result<(), MailboxError> {
        let mut slots = lock(&self.table);
        if let Some(slot) = slots.get(id) {
            return slot.mailbox.push(envelope);
        }

        let (sender, receiver) = mailbox(self.shared.config.mailbox_capacity);
        sender.push(envelope)?;
        let status = Arc::new(ActivationStatus::new());
        slots.insert(
            id.clone(),
            ActivationSlot {
                mailbox: sender,
                status: status.clone(),
            },
        );
        drop(slots);

        debug!(actor_type = A::TYPE_NAME, actor_id = %id, "Starting activation worker");
        let worker = ActivationWorker::new(
            id.clone(),
            self.shared.clone(),
            receiver,
            status,
            Arc::downgrade(&self.table),
        );
        tokio::spawn(worker.run().instrument(actor_span!(A::TYPE_NAME, id)));
        Ok(())
    }
}

impl<A: Actor> ManageActors for ActorManager<A> {
    fn actor_type(&self) -> &'static str {
        A::TYPE_NAME
    }

    fn config(&self) -> &ActorTypeConfig {
        &self.shared.config
    }

    fn dispatch(&self, request: ActorRequest) -> Result<oneshot::Receiver<TurnResult>, MailboxError> {
        let id = request.actor_id.clone();
        let (reply, receiver) = reply_channel();
        self.push(&id, Envelope::Turn { request, reply })?;
        Ok(receiver)
    }

    fn deactivate(&self, id: &ActorId) -> Result<Option<oneshot::Receiver<()>>, MailboxError> {
        let slots = lock(&self.table);
        let Some(slot) = slots.get(id) else {
            return Ok(None);
        };
        let (done, receiver) = oneshot::channel();
        slot.mailbox.push(Envelope::Deactivate { done: Some(done) })?;
        Ok(Some(receiver))
    }

    fn activation_state(&self, id: &ActorId) -> ActivationState {
        lock(&self.table)
            .get(id)
            .map(|slot| slot.status.state())
            .unwrap_or(ActivationState::Inactive)
    }

    fn activation_stats(&self, id: &ActorId) -> Option<ActivationStats> {
        lock(&self.table).get(id).map(|slot| slot.status.stats())
    }

    fn active_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = lock(&self.table)
            .iter()
            .filter(|(_, slot)| slot.status.state() != ActivationState::Inactive)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn idle_ids(&self, now: Instant) -> Vec<ActorId> {
        let idle_timeout = self.shared.config.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT);
        let mut ids: Vec<ActorId> = lock(&self.table)
            .iter()
            .filter(|(_, slot)| {
                slot.status.state() == ActivationState::Active
                    && slot.mailbox.is_empty()
                    && slot.status.idle_for(now) >= idle_timeout
            })
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
