use crate::address::ActorId;
use crate::context::ActorContext;
use crate::errors::ActorError;
use crate::method::MethodTable;
use crate::types::{ActorResult, BoxedFuture};
use std::time::Duration;

/// Kind of turn being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorCallType {
    Method,
    Timer,
    Reminder,
}

/// Describes the turn passed to the pre/post method hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorMethodContext {
    /// Method name, timer callback name or reminder name
    pub method_name: String,
    pub call_type: ActorCallType,
}

impl ActorMethodContext {
    pub fn new(method_name: impl Into<String>, call_type: ActorCallType) -> Self {
        Self {
            method_name: method_name.into(),
            call_type,
        }
    }
}

/// Creates actor instances on activation.
pub trait ActorFactory<A: Actor>: Send + Sync + 'static {
    fn create(&self, id: &ActorId) -> A;
}

impl<A, F> ActorFactory<A> for F
where
    A: Actor,
    F: Fn(&ActorId) -> A + Send + Sync + 'static,
{
    fn create(&self, id: &ActorId) -> A {
        self(id)
    }
}

/// Core virtual actor trait
///
/// An actor is identified by `TYPE_NAME` plus an [`ActorId`]. The runtime
/// activates an instance on the first request for an id and runs its turns
/// one at a time.
pub trait Actor: Send + Sized + 'static {
    /// Registered actor type name
    const TYPE_NAME: &'static str;

    /// Methods callable by name, including timer callbacks.
    fn methods() -> MethodTable<Self>;

    /// Called after activation, before the first turn
    fn on_activate<'a>(&'a mut self, _ctx: &'a mut ActorContext) -> BoxedFuture<'a, ActorResult<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Called before the instance is dropped
    fn on_deactivate<'a>(&'a mut self, _ctx: &'a mut ActorContext) -> BoxedFuture<'a, ActorResult<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Called before every turn
    fn on_pre_method<'a>(
        &'a mut self,
        _method: &'a ActorMethodContext,
        _ctx: &'a mut ActorContext,
    ) -> BoxedFuture<'a, ActorResult<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Called after every successful turn, before state is saved
    fn on_post_method<'a>(
        &'a mut self,
        _method: &'a ActorMethodContext,
        _ctx: &'a mut ActorContext,
    ) -> BoxedFuture<'a, ActorResult<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Handle a reminder delivery
    ///
    /// Actors that register reminders override this. The default rejects the
    /// delivery with [`ActorError::NotRemindable`].
    fn receive_reminder<'a>(
        &'a mut self,
        _name: &'a str,
        _state: Vec<u8>,
        _due_time: Duration,
        _period: Duration,
        _ctx: &'a mut ActorContext,
    ) -> BoxedFuture<'a, ActorResult<()>> {
        let actor_type = Self::TYPE_NAME;
        Box::pin(async move { Err(ActorError::NotRemindable(actor_type.to_string())) })
    }
}
