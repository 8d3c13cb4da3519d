use roost_api::errors::{ActorError, ValidationError};
use thiserror::Error;

/// Errors related to Mailbox operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    #[error("Mailbox is full (capacity: {capacity})")]
    Full { capacity: usize },
    #[error("Mailbox is closed")]
    Closed,
}

/// Errors raised by the runtime itself rather than by actor code.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Actor type not registered: {0}")]
    ActorTypeNotRegistered(String),
    #[error("Registration error: {0}")]
    Registration(String),
    #[error("Actor runtime is shutting down")]
    ShuttingDown,
    #[error(transparent)]
    Mailbox(#[from] MailboxError),
    #[error(transparent)]
    Actor(#[from] ActorError),
    #[error("Internal runtime error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<ValidationError> for RuntimeError {
    fn from(err: ValidationError) -> Self {
        RuntimeError::Actor(ActorError::Validation(err))
    }
}

impl RuntimeError {
    /// The actor-level error, if the failure came from a turn.
    pub fn as_actor_error(&self) -> Option<&ActorError> {
        match self {
            RuntimeError::Actor(err) => Some(err),
            _ => None,
        }
    }
}
