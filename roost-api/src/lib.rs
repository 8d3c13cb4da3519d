//! # Roost Virtual Actor API
//!
//! Roost is a virtual actor programming model. Actors are addressed by type
//! and id, activated on demand, and run one turn at a time. State, timers and
//! reminders are coordinated with a remote backend.
//!
//! ## Design Principles
//!
//! - **Location Transparency**: callers address an actor by id without knowing
//!   whether it is currently activated.
//! - **Turn-Based Concurrency**: no two turns of the same actor ever overlap.
//! - **Explicit Registries**: method dispatch and timer callback validation are
//!   lookups in a table built once per actor type.
//! - **Backend Agnostic**: everything durable goes through [`ActorBackend`].
//!
//! ## Core Components
//!
//! - **Duration Codec**: the two textual schedule encodings the backend accepts
//! - **Method Registry**: declared methods and timer callback validation
//! - **State Manager**: per-activation cache with batched commits
//! - **Timer Manager**: timer and reminder registration against the backend
//! - **Actor Context**: the per-turn view an actor works through
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use roost_api::{actor_methods, Actor, ActorContext, ActorResult, MethodTable};
//!
//! struct Counter;
//!
//! #[actor_methods]
//! impl Counter {
//!     pub async fn increment(&mut self, ctx: &mut ActorContext, by: i64) -> ActorResult<i64> {
//!         let count = ctx.state().get_or_add_state("count", 0i64).await? + by;
//!         ctx.state().set_state("count", &count)?;
//!         Ok(count)
//!     }
//! }
//!
//! impl Actor for Counter {
//!     const TYPE_NAME: &'static str = "Counter";
//!
//!     fn methods() -> MethodTable<Self> {
//!         Self::method_table()
//!     }
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`actor`]: the `Actor` trait, lifecycle hooks and factories
//! - [`address`]: actor ids and addresses
//! - [`backend`]: the backend accessor contract
//! - [`context`]: per-turn actor context
//! - [`duration`]: schedule encodings
//! - [`errors`]: error taxonomy
//! - [`method`]: method tables and callback validation
//! - [`payload`]: timer and reminder wire records
//! - [`reminder`] / [`timer`]: schedule registrations
//! - [`state`]: the actor state manager
//! - [`timer_manager`]: timer and reminder registration contract
//! - [`types`]: common type definitions

extern crate self as roost_api;

pub mod actor;
pub mod address;
pub mod backend;
pub mod context;
pub mod duration;
pub mod errors;
pub mod method;
pub mod payload;
pub mod reminder;
pub mod state;
pub mod timer;
pub mod timer_manager;
pub mod types;

pub use actor::{Actor, ActorCallType, ActorFactory, ActorMethodContext};
pub use address::{ActorAddress, ActorId};
pub use backend::{ActorBackend, StateChange, StateOperation};
pub use context::ActorContext;
pub use errors::{ActorError, BackendError, FormatError, ValidationError};
pub use method::{
    CallbackValidator, MethodDescriptor, MethodFn, MethodHandle, MethodTable, Receiver, ReturnShape, Visibility,
};
pub use payload::{ReminderPayload, TimerPayload};
pub use reminder::{ActorReminder, ActorReminderToken};
pub use state::{ActorStateManager, StateChangeKind};
pub use timer::{ActorTimer, ActorTimerToken};
pub use timer_manager::ActorTimerManager;
pub use types::{ActorResult, BoxedFuture, Payload};

// Re-export the attribute macro
pub use roost_api_derive::actor_methods;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
