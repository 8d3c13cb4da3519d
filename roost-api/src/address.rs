//! # Actor Addressing
//!
//! ## Key Concepts
//! - ActorId: logical identity of one actor, unique within its actor type
//! - ActorAddress: actor type plus id, the key every backend call is scoped by
//!
//! Ids are assigned by the host and never change. Callers address an actor by
//! id without knowing whether it is currently activated.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// Opaque identifier of a virtual actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an id backed by a random UUID v4.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ActorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ActorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// # Actor Address
///
/// Actor type name plus [`ActorId`]. Timers, reminders and state entries are
/// all stored under an address.
///
/// ## Format
/// Displays as `type/id`, e.g. `CounterActor/42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorAddress {
    /// Registered actor type name
    pub actor_type: String,
    /// Identity within the type
    pub actor_id: ActorId,
}

impl ActorAddress {
    pub fn new(actor_type: impl Into<String>, actor_id: ActorId) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id,
        }
    }
}

impl Display for ActorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.actor_type, self.actor_id)
    }
}
