// Roost Virtual Actor Runtime
//
// This crate hosts actors declared against the `roost-api` model on tokio:
// one mailbox and one worker task per activated actor id, a process-wide
// callback registry, the default timer manager and an in-memory backend.

pub mod activation;
pub mod backend;
pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;
pub mod timer_manager;

mod mailbox;
mod manager;
mod reply;

// Re-export commonly used types
pub use activation::{ActivationState, ActivationStats};
pub use backend::InMemoryBackend;
pub use config::{ActorRuntimeConfig, ActorTypeConfig};
pub use envelope::{ActorRequest, RequestKind};
pub use error::{MailboxError, RuntimeError};
pub use registry::CallbackRegistry;
pub use reply::TurnResult;
pub use runtime::{ActorRuntime, ActorRuntimeBuilder};
pub use timer_manager::DefaultActorTimerManager;
pub use roost_api::*;
