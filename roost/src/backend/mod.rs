//! Backend accessor implementations shipped with the runtime.
//!
//! Production deployments bring their own [`ActorBackend`](roost_api::backend::ActorBackend)
//! talking to the scheduling and storage service. [`InMemoryBackend`] keeps
//! everything in process, for tests and local development.

pub mod memory;

pub use memory::InMemoryBackend;
