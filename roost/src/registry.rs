//! # Callback Registry
//!
//! Process-wide record of every registered actor type's method table, plus a
//! read-through cache of validated timer callbacks keyed by
//! `(actor type, callback name)`.
//!
//! ## Key Concepts
//! - Registration: the runtime records a type's table once, when the type is
//!   registered. Registering the same type again is a no-op.
//! - Resolution: the first lookup of a callback validates it against the
//!   table and caches the resulting handle. Only successful validations are
//!   cached, so a failing callback is re-checked (and fails again) each time.
//! - Lifetime: entries are never evicted. Runtimes built without an explicit
//!   registry share [`CallbackRegistry::global`].
//!
//! Two tasks resolving the same callback at once may both validate it; the
//! first insert wins and the handles are interchangeable.

use crate::error::RuntimeError;
use lazy_static::lazy_static;
use roost_api::actor::Actor;
use roost_api::errors::ValidationError;
use roost_api::method::{CallbackValidator, MethodHandle, MethodTable};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Erased = Arc<dyn Any + Send + Sync>;
type ValidateFn = fn(&CallbackRegistry, &str) -> Result<(), ValidationError>;

struct TypeRecord {
    type_id: TypeId,
    table: Erased,
    validate: ValidateFn,
}

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<CallbackRegistry> = Arc::new(CallbackRegistry::new());
}

pub struct CallbackRegistry {
    types: RwLock<HashMap<String, TypeRecord>>,
    handles: RwLock<HashMap<(String, String), Erased>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn validate_erased<A: Actor>(registry: &CallbackRegistry, callback: &str) -> Result<(), ValidationError> {
    registry.resolve_timer_callback::<A>(callback).map(|_| ())
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<CallbackRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Records `A`'s method table under `A::TYPE_NAME`.
    ///
    /// Fails when a different Rust type already claimed the name.
    pub fn register_type<A: Actor>(&self) -> Result<Arc<MethodTable<A>>, RuntimeError> {
        let mut types = write(&self.types);
        if let Some(record) = types.get(A::TYPE_NAME) {
            if record.type_id != TypeId::of::<A>() {
                return Err(RuntimeError::Registration(format!(
                    "actor type name {} is already registered by another type",
                    A::TYPE_NAME
                )));
            }
            return record
                .table
                .clone()
                .downcast::<MethodTable<A>>()
                .map_err(|_| RuntimeError::Registration(format!("method table of {} has the wrong type", A::TYPE_NAME)));
        }

        let table = Arc::new(A::methods());
        types.insert(
            A::TYPE_NAME.to_string(),
            TypeRecord {
                type_id: TypeId::of::<A>(),
                table: table.clone(),
                validate: validate_erased::<A>,
            },
        );
        debug!(actor_type = A::TYPE_NAME, methods = table.len(), "Actor type registered");
        Ok(table)
    }

    pub fn is_registered(&self, actor_type: &str) -> bool {
        read(&self.types).contains_key(actor_type)
    }

    pub fn method_table<A: Actor>(&self) -> Option<Arc<MethodTable<A>>> {
        read(&self.types)
            .get(A::TYPE_NAME)
            .filter(|record| record.type_id == TypeId::of::<A>())
            .and_then(|record| record.table.clone().downcast::<MethodTable<A>>().ok())
    }

    /// Validated handle for `callback` on `A`, from the cache when possible.
    ///
    /// Types that were never registered are validated against a freshly built
    /// table.
    pub fn resolve_timer_callback<A: Actor>(&self, callback: &str) -> Result<MethodHandle<A>, ValidationError> {
        let key = (A::TYPE_NAME.to_string(), callback.to_string());
        if let Some(handle) = read(&self.handles)
            .get(&key)
            .and_then(|cached| cached.downcast_ref::<MethodHandle<A>>())
        {
            return Ok(handle.clone());
        }

        let table = self.method_table::<A>().unwrap_or_else(|| Arc::new(A::methods()));
        let handle = table.validate_timer_callback(A::TYPE_NAME, callback)?;

        let mut handles = write(&self.handles);
        let cached = handles.entry(key).or_insert_with(|| Arc::new(handle.clone()));
        Ok(cached.downcast_ref::<MethodHandle<A>>().cloned().unwrap_or(handle))
    }

    /// Number of cached callback handles.
    pub fn cached_handles(&self) -> usize {
        read(&self.handles).len()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackValidator for CallbackRegistry {
    fn validate_timer_callback(&self, actor_type: &str, callback: &str) -> Result<(), ValidationError> {
        // copy the fn pointer out so the types lock is released before validating
        let validate = read(&self.types).get(actor_type).map(|record| record.validate);
        match validate {
            Some(validate) => validate(self, callback),
            None => Err(ValidationError::MissingMethod {
                actor_type: actor_type.to_string(),
                callback: callback.to_string(),
            }),
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = read(&self.types).keys().cloned().collect();
        types.sort();
        f.debug_struct("CallbackRegistry")
            .field("types", &types)
            .field("cached_handles", &self.cached_handles())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_api::context::ActorContext;
    use roost_api::method::{MethodDescriptor, Receiver, ReturnShape, Visibility};
    use roost_api::types::{ActorResult, BoxedFuture, Payload};

    struct Ticker;

    fn noop<'a>(_: &'a mut Ticker, _: &'a mut ActorContext, _: Payload) -> BoxedFuture<'a, ActorResult<Payload>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn descriptor(name: &'static str, params: usize, returns: ReturnShape) -> MethodDescriptor<Ticker> {
        MethodDescriptor {
            name,
            params,
            returns,
            visibility: Visibility::Public,
            receiver: Receiver::Instance,
            invoke: noop,
        }
    }

    impl Actor for Ticker {
        const TYPE_NAME: &'static str = "Ticker";

        fn methods() -> MethodTable<Self> {
            MethodTable::new()
                .with(descriptor("tick", 1, ReturnShape::Completion))
                .with(descriptor("count", 0, ReturnShape::Value))
        }
    }

    struct Impostor;

    impl Actor for Impostor {
        const TYPE_NAME: &'static str = "Ticker";

        fn methods() -> MethodTable<Self> {
            MethodTable::new()
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = CallbackRegistry::new();
        let first = registry.register_type::<Ticker>().unwrap();
        let second = registry.register_type::<Ticker>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_registered("Ticker"));
    }

    #[test]
    fn test_name_clash_is_rejected() {
        let registry = CallbackRegistry::new();
        registry.register_type::<Ticker>().unwrap();
        let err = registry.register_type::<Impostor>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Registration error: actor type name Ticker is already registered by another type"
        );
    }

    #[test]
    fn test_only_successes_are_cached() {
        let registry = CallbackRegistry::new();
        registry.register_type::<Ticker>().unwrap();

        assert!(registry.resolve_timer_callback::<Ticker>("count").is_err());
        assert_eq!(registry.cached_handles(), 0);

        let handle = registry.resolve_timer_callback::<Ticker>("tick").unwrap();
        assert_eq!(handle.name(), "tick");
        registry.resolve_timer_callback::<Ticker>("tick").unwrap();
        assert_eq!(registry.cached_handles(), 1);
    }

    #[test]
    fn test_validator_by_type_name() {
        let registry = CallbackRegistry::new();
        registry.register_type::<Ticker>().unwrap();

        assert!(CallbackValidator::validate_timer_callback(&registry, "Ticker", "tick").is_ok());
        let err = CallbackValidator::validate_timer_callback(&registry, "Unknown", "tick").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Timer callback method: tick does not exist on the actor type: Unknown"
        );
    }
}
