//! # Timers
//!
//! A timer is a best-effort schedule tied to the current activation. Each
//! tick invokes the named callback method on the actor. Timers are lost when
//! the actor deactivates and are never re-attached on reactivation.

use crate::address::{ActorAddress, ActorId};
use crate::duration::{self, TTL_FIELD};
use crate::errors::FormatError;
use crate::payload::TimerPayload;
use std::time::Duration;

/// A timer registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorTimer {
    pub actor_type: String,
    pub actor_id: ActorId,
    pub name: String,
    /// Method invoked on each tick
    pub callback: String,
    /// Argument handed to the callback on each tick
    pub state: Vec<u8>,
    pub due_time: Duration,
    pub period: Duration,
    pub repetitions: Option<u32>,
    pub ttl: Option<Duration>,
}

impl ActorTimer {
    pub fn new(
        address: &ActorAddress,
        name: impl Into<String>,
        callback: impl Into<String>,
        state: Vec<u8>,
        due_time: Duration,
        period: Duration,
    ) -> Self {
        Self {
            actor_type: address.actor_type.clone(),
            actor_id: address.actor_id.clone(),
            name: name.into(),
            callback: callback.into(),
            state,
            due_time,
            period,
            repetitions: None,
            ttl: None,
        }
    }

    pub fn with_repetitions(mut self, count: u32) -> Self {
        self.repetitions = Some(count);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn token(&self) -> ActorTimerToken {
        ActorTimerToken {
            actor_type: self.actor_type.clone(),
            actor_id: self.actor_id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn to_payload(&self) -> TimerPayload {
        let schedule = duration::encode(self.due_time, self.period, self.repetitions);
        TimerPayload {
            callback: self.callback.clone(),
            data: self.state.clone(),
            due_time: schedule.due_time,
            period: schedule.period,
            ttl: self.ttl.map(duration::format_duration),
        }
    }

    pub fn from_payload(token: ActorTimerToken, payload: TimerPayload) -> Result<Self, FormatError> {
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
            callback: payload.callback,
            state: payload.data,
            due_time: schedule.due_time,
            period: schedule.period,
            repetitions: schedule.repetitions,
            ttl,
        })
    }
}

/// Reference to a timer, enough to unregister it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorTimerToken {
    pub actor_type: String,
    pub actor_id: ActorId,
    pub name: String,
}

impl ActorTimerToken {
    pub fn new(address: &ActorAddress, name: impl Into<String>) -> Self {
        Self {
            actor_type: address.actor_type.clone(),
            actor_id: address.actor_id.clone(),
            name: name.into(),
        }
    }
}
