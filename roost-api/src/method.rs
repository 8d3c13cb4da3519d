//! # Method Registry
//!
//! Actor types declare their callable methods up front in a [`MethodTable`].
//! Method dispatch and timer callback validation are lookups against that
//! table rather than runtime introspection.
//!
//! ## Core Components
//!
//! - `MethodDescriptor`: name, arity, return shape and the invoke function
//! - `MethodTable`: every descriptor an actor type declares, overloads included
//! - `MethodHandle`: a callback that passed validation, ready to invoke
//! - `CallbackValidator`: object-safe validation seam used by [`ActorContext`]
//!
//! ## Timer Callback Contract
//!
//! Checked in this order, first failure wins:
//!
//! 1. a method with the callback name exists
//! 2. exactly one method carries that name
//! 3. it takes zero or one parameters
//! 4. it is asynchronous and completes without a value
//!
//! Visibility and whether the method takes a receiver are recorded but never
//! rejected.
//!
//! Tables are normally generated by `#[actor_methods]`.

use crate::context::ActorContext;
use crate::errors::{ActorError, ValidationError};
use crate::types::{ActorResult, BoxedFuture, Payload};
use std::fmt;

/// Type-erased entry point of one declared method.
pub type MethodFn<A> =
    for<'a> fn(&'a mut A, &'a mut ActorContext, Payload) -> BoxedFuture<'a, ActorResult<Payload>>;

/// What a method produces when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// Asynchronous, no result value
    Completion,
    /// Asynchronous, carries a value
    Value,
    /// Not asynchronous
    Sync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// Visible within a crate or module path only
    Restricted,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    Instance,
    Static,
}

/// Declared shape of one method.
pub struct MethodDescriptor<A> {
    pub name: &'static str,
    /// Parameter count, excluding the receiver and the context
    pub params: usize,
    pub returns: ReturnShape,
    pub visibility: Visibility,
    pub receiver: Receiver,
    pub invoke: MethodFn<A>,
}

impl<A> Clone for MethodDescriptor<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for MethodDescriptor<A> {}

impl<A> fmt::Debug for MethodDescriptor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("visibility", &self.visibility)
            .field("receiver", &self.receiver)
            .finish()
    }
}

/// A timer callback that satisfied the callback contract.
pub struct MethodHandle<A> {
    descriptor: MethodDescriptor<A>,
}

impl<A> MethodHandle<A> {
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &MethodDescriptor<A> {
        &self.descriptor
    }

    /// Invokes the callback. A parameterless callback ignores `payload`.
    pub fn invoke<'a>(
        &self,
        actor: &'a mut A,
        ctx: &'a mut ActorContext,
        payload: Payload,
    ) -> BoxedFuture<'a, ActorResult<()>> {
        let call = (self.descriptor.invoke)(actor, ctx, payload);
        Box::pin(async move { call.await.map(|_| ()) })
    }
}

impl<A> Clone for MethodHandle<A> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor,
        }
    }
}

impl<A> fmt::Debug for MethodHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MethodHandle").field(&self.descriptor).finish()
    }
}

/// Every method an actor type declares.
pub struct MethodTable<A> {
    methods: Vec<MethodDescriptor<A>>,
}

impl<A> MethodTable<A> {
    pub fn new() -> Self {
        Self { methods: Vec::new() }
    }

    pub fn with(mut self, descriptor: MethodDescriptor<A>) -> Self {
        self.methods.push(descriptor);
        self
    }

    pub fn register(&mut self, descriptor: MethodDescriptor<A>) {
        self.methods.push(descriptor);
    }

    /// Appends another table, e.g. one generated for a second impl block.
    pub fn extend(&mut self, other: MethodTable<A>) {
        self.methods.extend(other.methods);
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.iter().map(|m| m.name)
    }

    pub fn overloads<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s MethodDescriptor<A>> + 's {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Looks up the single method callers invoke by `name`.
    pub fn find_method(&self, actor_type: &str, name: &str) -> ActorResult<&MethodDescriptor<A>> {
        let mut matches = self.methods.iter().filter(|m| m.name == name);
        let first = matches.next().ok_or_else(|| ActorError::MethodNotFound {
            actor_type: actor_type.to_string(),
            method: name.to_string(),
        })?;
        if matches.next().is_some() {
            return Err(ActorError::AmbiguousMethod {
                actor_type: actor_type.to_string(),
                method: name.to_string(),
            });
        }
        Ok(first)
    }

    /// Checks `callback` against the timer callback contract.
    pub fn validate_timer_callback(&self, actor_type: &str, callback: &str) -> Result<MethodHandle<A>, ValidationError> {
        let mut matches = self.overloads(callback);
        let descriptor = *matches.next().ok_or_else(|| ValidationError::MissingMethod {
            actor_type: actor_type.to_string(),
            callback: callback.to_string(),
        })?;
        if matches.next().is_some() {
            return Err(ValidationError::Overloaded {
                callback: callback.to_string(),
            });
        }
        if descriptor.params > 1 {
            return Err(ValidationError::TooManyParameters {
                callback: callback.to_string(),
                params: descriptor.params,
            });
        }
        if descriptor.returns != ReturnShape::Completion {
            return Err(ValidationError::InvalidReturnType {
                callback: callback.to_string(),
            });
        }
        Ok(MethodHandle { descriptor })
    }
}

impl<A> Default for MethodTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for MethodTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods.iter()).finish()
    }
}

/// Validates timer callbacks by actor type name.
///
/// The context holds one of these so it can reject a bad timer before any
/// backend call is made.
pub trait CallbackValidator: Send + Sync {
    fn validate_timer_callback(&self, actor_type: &str, callback: &str) -> Result<(), ValidationError>;
}

/// Uncached validation straight against a table.
impl<A: 'static> CallbackValidator for MethodTable<A> {
    fn validate_timer_callback(&self, actor_type: &str, callback: &str) -> Result<(), ValidationError> {
        MethodTable::validate_timer_callback(self, actor_type, callback).map(|_| ())
    }
}
