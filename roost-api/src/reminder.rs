//! # Reminders
//!
//! A reminder is a durable, backend-persisted schedule. It survives
//! deactivation: when it fires for an inactive actor the actor is activated
//! again and [`Actor::receive_reminder`](crate::actor::Actor::receive_reminder)
//! is invoked with the reminder's name, state and schedule.
//!
//! When a repetition count is set the backend stops delivery once the count
//! is exhausted; the runtime only observes deliveries stopping.

use crate::address::{ActorAddress, ActorId};
use crate::duration::{self, TTL_FIELD};
use crate::errors::FormatError;
use crate::payload::ReminderPayload;
use std::time::Duration;

/// A reminder registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorReminder {
    pub actor_type: String,
    pub actor_id: ActorId,
    /// Unique among the actor's reminders; re-registering replaces
    pub name: String,
    /// Opaque application state handed back on every delivery
    pub state: Vec<u8>,
    pub due_time: Duration,
    pub period: Duration,
    pub repetitions: Option<u32>,
    pub ttl: Option<Duration>,
}

impl ActorReminder {
    pub fn new(
        address: &ActorAddress,
        name: impl Into<String>,
        state: Vec<u8>,
        due_time: Duration,
        period: Duration,
    ) -> Self {
        Self {
            actor_type: address.actor_type.clone(),
            actor_id: address.actor_id.clone(),
            name: name.into(),
            state,
            due_time,
            period,
            repetitions: None,
            ttl: None,
        }
    }

    /// Limits delivery to `count` firings.
    pub fn with_repetitions(mut self, count: u32) -> Self {
        self.repetitions = Some(count);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn token(&self) -> ActorReminderToken {
        ActorReminderToken {
            actor_type: self.actor_type.clone(),
            actor_id: self.actor_id.clone(),
            name: self.name.clone(),
        }
    }

    /// Encodes the registration into its wire record.
    pub fn to_payload(&self) -> ReminderPayload {
        let schedule = duration::encode(self.due_time, self.period, self.repetitions);
        ReminderPayload {
            data: self.state.clone(),
            due_time: schedule.due_time,
            period: schedule.period,
            ttl: self.ttl.map(duration::format_duration),
        }
    }

    /// Rebuilds a registration from a stored record.
    pub fn from_payload(token: ActorReminderToken, payload: ReminderPayload) -> Result<Self, FormatError> {
        let schedule = duration::decode(&payload.due_time, &payload.period)?;
        let ttl = payload
            .ttl
            .as_deref()
            .map(|ttl| duration::parse_duration(TTL_FIELD, ttl))
            .transpose()?;
        Ok(Self {
            actor_type: token.actor_type,
            actor_id: token.actor_id,
            name: token.name,
            state: payload.data,
            due_time: schedule.due_time,
            period: schedule.period,
            repetitions: schedule.repetitions,
            ttl,
        })
    }
}

/// Reference to a reminder, enough to unregister or look it up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorReminderToken {
    pub actor_type: String,
    pub actor_id: ActorId,
    pub name: String,
}

impl ActorReminderToken {
    pub fn new(address: &ActorAddress, name: impl Into<String>) -> Self {
        Self {
            actor_type: address.actor_type.clone(),
            actor_id: address.actor_id.clone(),
            name: name.into(),
        }
    }
}
