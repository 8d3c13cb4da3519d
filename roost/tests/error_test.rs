// Integration tests for error types in roost::error

use anyhow::anyhow;
use roost::error::{MailboxError, RuntimeError};
use roost_api::{ActorError, BackendError, ValidationError};

#[test]
fn test_mailbox_error_display() {
    assert_eq!(MailboxError::Full { capacity: 100 }.to_string(), "Mailbox is full (capacity: 100)");
    assert_eq!(MailboxError::Closed.to_string(), "Mailbox is closed");
}

#[test]
fn test_runtime_error_display() {
    assert_eq!(
        RuntimeError::ActorTypeNotRegistered("Ghost".to_string()).to_string(),
        "Actor type not registered: Ghost"
    );
    assert_eq!(
        RuntimeError::Registration("duplicate name".to_string()).to_string(),
        "Registration error: duplicate name"
    );
    assert_eq!(RuntimeError::ShuttingDown.to_string(), "Actor runtime is shutting down");
    assert_eq!(
        RuntimeError::from(MailboxError::Full { capacity: 1 }).to_string(),
        "Mailbox is full (capacity: 1)"
    );
    let other = RuntimeError::Other(anyhow!("worker panicked"));
    assert!(other.to_string().contains("worker panicked"));
}

#[test]
fn test_actor_errors_pass_through_unchanged() {
    let err = RuntimeError::from(ActorError::KeyNotFound("count".to_string()));
    assert_eq!(err.to_string(), "Actor state with name count was not found");
    assert!(matches!(err.as_actor_error(), Some(ActorError::KeyNotFound(key)) if key == "count"));

    let err = RuntimeError::from(ActorError::Backend(BackendError::Unavailable("offline".to_string())));
    assert_eq!(err.to_string(), "Backend unavailable: offline");

    assert!(RuntimeError::ShuttingDown.as_actor_error().is_none());
}

#[test]
fn test_validation_error_converts_to_actor_error() {
    let err = RuntimeError::from(ValidationError::Overloaded {
        callback: "on_tick".to_string(),
    });
    assert!(matches!(err, RuntimeError::Actor(ActorError::Validation(_))));
    assert_eq!(err.to_string(), "Timer callback method: on_tick cannot be overloaded.");
}
