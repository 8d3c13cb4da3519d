//! Inbound requests and the envelopes carrying them through a mailbox.

use crate::reply::ReplySender;
use roost_api::actor::ActorCallType;
use roost_api::address::{ActorAddress, ActorId};
use roost_api::errors::ActorError;
use roost_api::reminder::ActorReminder;
use roost_api::timer::ActorTimer;
use roost_api::types::Payload;
use std::fmt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What a request asks the actor to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Call a method by name with a serialized argument payload
    InvokeMethod { method: String, payload: Payload },
    /// Deliver a timer tick; `payload` is the stored timer record
    TimerTick { timer: String, payload: Payload },
    /// Deliver a reminder; `payload` is the stored reminder record
    ReminderFire { reminder: String, payload: Payload },
}

/// One request addressed to an actor.
#[derive(Debug, Clone)]
pub struct ActorRequest {
    pub id: Uuid,
    pub actor_type: String,
    pub actor_id: ActorId,
    pub kind: RequestKind,
    /// Cancels the turn at its next suspension point, or before it starts
    pub cancel: CancellationToken,
}

impl ActorRequest {
    pub fn new(actor_type: impl Into<String>, actor_id: ActorId, kind: RequestKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_type: actor_type.into(),
            actor_id,
            kind,
            cancel: CancellationToken::new(),
        }
    }

    pub fn invoke(actor_type: impl Into<String>, actor_id: ActorId, method: impl Into<String>, payload: Payload) -> Self {
        Self::new(
            actor_type,
            actor_id,
            RequestKind::InvokeMethod {
                method: method.into(),
                payload,
            },
        )
    }

    pub fn timer_tick(actor_type: impl Into<String>, actor_id: ActorId, timer: impl Into<String>, payload: Payload) -> Self {
        Self::new(
            actor_type,
            actor_id,
            RequestKind::TimerTick {
                timer: timer.into(),
                payload,
            },
        )
    }

    /// Tick for `timer`, carrying its encoded record.
    pub fn tick_for(timer: &ActorTimer) -> Result<Self, ActorError> {
        let payload = serde_json::to_vec(&timer.to_payload())?;
        Ok(Self::timer_tick(
            timer.actor_type.clone(),
            timer.actor_id.clone(),
            timer.name.clone(),
            payload,
        ))
    }

    pub fn reminder_fire(
        actor_type: impl Into<String>,
        actor_id: ActorId,
        reminder: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self::new(
            actor_type,
            actor_id,
            RequestKind::ReminderFire {
                reminder: reminder.into(),
                payload,
            },
        )
    }

    /// Delivery of `reminder`, carrying its encoded record.
    pub fn fire_for(reminder: &ActorReminder) -> Result<Self, ActorError> {
        let payload = serde_json::to_vec(&reminder.to_payload())?;
        Ok(Self::reminder_fire(
            reminder.actor_type.clone(),
            reminder.actor_id.clone(),
            reminder.name.clone(),
            payload,
        ))
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn address(&self) -> ActorAddress {
        ActorAddress::new(self.actor_type.clone(), self.actor_id.clone())
    }

    pub fn call_type(&self) -> ActorCallType {
        match self.kind {
            RequestKind::InvokeMethod { .. } => ActorCallType::Method,
            RequestKind::TimerTick { .. } => ActorCallType::Timer,
            RequestKind::ReminderFire { .. } => ActorCallType::Reminder,
        }
    }

    /// Method, timer or reminder name the request targets.
    pub fn target(&self) -> &str {
        match &self.kind {
            RequestKind::InvokeMethod { method, .. } => method,
            RequestKind::TimerTick { timer, .. } => timer,
            RequestKind::ReminderFire { reminder, .. } => reminder,
        }
    }
}

/// Lowercase label for a call type in log fields.
pub(crate) struct ActorCallTypeLabel(pub ActorCallType);

impl fmt::Display for ActorCallTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.0 {
            ActorCallType::Method => "method",
            ActorCallType::Timer => "timer",
            ActorCallType::Reminder => "reminder",
        })
    }
}

/// Unit of work in an activation's mailbox.
#[derive(Debug)]
pub(crate) enum Envelope {
    Turn { request: ActorRequest, reply: ReplySender },
    Deactivate { done: Option<oneshot::Sender<()>> },
}
