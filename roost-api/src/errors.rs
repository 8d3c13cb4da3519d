//! # Actor Runtime Error Types
//!
//! This module defines the error types used throughout the Roost virtual actor
//! runtime. Every failure a caller can observe is one of the variants below.
//!
//! ## Error Families
//!
//! - `FormatError`: a duration or repetition string could not be decoded
//! - `ValidationError`: a timer callback does not satisfy the signature contract
//! - `BackendError`: the remote backend failed or rejected a call
//! - `ActorError`: umbrella type returned by every actor-facing operation
//!
//! ## Retry Semantics
//!
//! None of these errors are retried internally. Format and validation errors
//! point at a code defect; backend errors are surfaced to whoever triggered the
//! call. State that was pending when a save failed stays pending, so a retried
//! save re-sends the same batch.
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::errors::ActorError;
//!
//! fn describe(error: &ActorError) -> &'static str {
//!     match error {
//!         ActorError::KeyNotFound(_) => "missing state",
//!         ActorError::Backend(_) => "backend trouble",
//!         _ => "other",
//!     }
//! }
//! ```

use thiserror::Error;

/// A duration or repetition field that could not be decoded.
///
/// `field` names the payload field (`dueTime`, `period`, `ttl`) so the caller
/// can tell which half of a schedule was malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field} value {value:?}: {reason}")]
pub struct FormatError {
    /// Payload field the value came from
    pub field: &'static str,
    /// The offending text
    pub value: String,
    /// What was wrong with it
    pub reason: String,
}

impl FormatError {
    pub fn new(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Timer callback signature violations.
///
/// Raised once, at registration time. These are never retried since they
/// indicate the callback was declared wrongly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No method with the callback name is registered for the actor type.
    #[error("Timer callback method: {callback} does not exist on the actor type: {actor_type}")]
    MissingMethod {
        actor_type: String,
        callback: String,
    },

    /// More than one method is registered under the callback name.
    #[error("Timer callback method: {callback} cannot be overloaded.")]
    Overloaded { callback: String },

    /// The callback declares two or more parameters.
    #[error("Timer callback can accept only zero or one parameters")]
    TooManyParameters { callback: String, params: usize },

    /// The callback is synchronous or produces a value.
    #[error("Timer callback can only return type ActorResult<()>")]
    InvalidReturnType { callback: String },
}

/// Failures talking to the backend accessor.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend received the call and refused it.
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// The addressed timer, reminder or key does not exist.
    #[error("Not found in backend: {0}")]
    NotFound(String),

    /// Any other transport or backend failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Core error type for actor operations.
///
/// Returned by the state manager, the timer manager, actor methods and
/// lifecycle hooks. Turn failures reach the original caller of that turn
/// unchanged.
#[derive(Error, Debug)]
pub enum ActorError {
    /// Malformed duration or repetition encoding.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Timer callback signature violation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// State read for a key that is neither cached nor stored.
    #[error("Actor state with name {0} was not found")]
    KeyNotFound(String),

    /// State add for a key that already exists.
    #[error("An actor state with name {0} already exists")]
    StateAlreadyExists(String),

    /// Backend communication failure.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Value could not be converted to or from JSON.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Method invocation for a name the actor type does not declare.
    #[error("Method {method} does not exist on the actor type: {actor_type}")]
    MethodNotFound { actor_type: String, method: String },

    /// Method invocation for a name declared more than once.
    #[error("Method {method} is declared more than once on the actor type: {actor_type}")]
    AmbiguousMethod { actor_type: String, method: String },

    /// Timer tick for a timer this activation never registered.
    #[error("Timer {0} is not registered for the current activation")]
    TimerNotRegistered(String),

    /// Reminder delivered to an actor that does not handle reminders.
    #[error("Actor type {0} does not handle reminders")]
    NotRemindable(String),

    /// The turn's cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller stopped waiting for the turn.
    #[error("Timeout")]
    Timeout,

    /// The actor has been deactivated or the runtime stopped.
    #[error("Actor stopped")]
    Stopped,

    /// User code reported a failure while handling a turn.
    #[error("Message handling failed: {0}")]
    MessageHandlingError(String),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActorError {
    /// Whether the error came from the backend accessor.
    pub fn is_backend(&self) -> bool {
        matches!(self, ActorError::Backend(_))
    }
}
