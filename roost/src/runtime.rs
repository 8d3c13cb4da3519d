//! # Actor Runtime
//!
//! The host-facing entry point. Registers actor types, routes inbound
//! requests to the right activation and manages activation lifetime.
//!
//! ## Key Concepts
//! - Actor type registration: one [`ActorManager`] per type, keyed by
//!   `Actor::TYPE_NAME`, plus the type's method table in the callback registry
//! - Dispatch: method calls, timer ticks and reminder deliveries all become an
//!   [`ActorRequest`] queued on the target id's mailbox
//! - Idle deactivation: an optional sweeper task deactivates activations idle
//!   for longer than their type's idle timeout
//! - Shutdown: new requests are refused and every activation is deactivated
//!
//! ## Usage
//!
//! ```rust,ignore
//! let backend = Arc::new(InMemoryBackend::new());
//! let runtime = ActorRuntime::builder(backend).build();
//! runtime.register_actor::<Counter, _>(|_: &ActorId| Counter::default())?;
//!
//! let count: i64 = runtime.invoke("Counter", ActorId::from("a"), "increment", &5).await?;
//! runtime.shutdown().await;
//! ```

use crate::activation::{ActivationState, ActivationStats};
use crate::config::{ActorRuntimeConfig, ActorTypeConfig};
use crate::envelope::ActorRequest;
use crate::error::RuntimeError;
use crate::manager::{ActorManager, ActorTypeShared, ManageActors};
use crate::registry::CallbackRegistry;
use crate::timer_manager::DefaultActorTimerManager;
use futures::future::join_all;
use roost_api::actor::{Actor, ActorFactory};
use roost_api::address::ActorId;
use roost_api::backend::ActorBackend;
use roost_api::errors::ActorError;
use roost_api::method::CallbackValidator;
use roost_api::timer_manager::ActorTimerManager;
use roost_api::types::Payload;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Assembles an [`ActorRuntime`].
pub struct ActorRuntimeBuilder {
    backend: Arc<dyn ActorBackend>,
    config: ActorRuntimeConfig,
    timer_manager: Option<Arc<dyn ActorTimerManager>>,
    registry: Option<Arc<CallbackRegistry>>,
}

impl ActorRuntimeBuilder {
    pub fn new(backend: Arc<dyn ActorBackend>) -> Self {
        Self {
            backend,
            config: ActorRuntimeConfig::default(),
            timer_manager: None,
            registry: None,
        }
    }

    pub fn config(mut self, config: ActorRuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the [`DefaultActorTimerManager`].
    pub fn timer_manager(mut self, timer_manager: Arc<dyn ActorTimerManager>) -> Self {
        self.timer_manager = Some(timer_manager);
        self
    }

    /// Uses a private registry instead of [`CallbackRegistry::global`].
    pub fn registry(mut self, registry: Arc<CallbackRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> ActorRuntime {
        let timers = self
            .timer_manager
            .unwrap_or_else(|| Arc::new(DefaultActorTimerManager::new(self.backend.clone())));
        ActorRuntime {
            config: self.config,
            backend: self.backend,
            timers,
            registry: self.registry.unwrap_or_else(CallbackRegistry::global),
            managers: RwLock::new(HashMap::new()),
            shutting_down: AtomicBool::new(false),
            sweeper: Mutex::new(None),
        }
    }
}

pub struct ActorRuntime {
    config: ActorRuntimeConfig,
    backend: Arc<dyn ActorBackend>,
    timers: Arc<dyn ActorTimerManager>,
    registry: Arc<CallbackRegistry>,
    managers: RwLock<HashMap<String, Arc<dyn ManageActors>>>,
    shutting_down: AtomicBool,
    sweeper: Mutex<Option<CancellationToken>>,
}

impl ActorRuntime {
    pub fn builder(backend: Arc<dyn ActorBackend>) -> ActorRuntimeBuilder {
        ActorRuntimeBuilder::new(backend)
    }

    /// Runtime with default configuration and the default timer manager.
    pub fn new(backend: Arc<dyn ActorBackend>) -> Self {
        ActorRuntimeBuilder::new(backend).build()
    }

    pub fn config(&self) -> &ActorRuntimeConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn ActorBackend> {
        &self.backend
    }

    pub fn timer_manager(&self) -> &Arc<dyn ActorTimerManager> {
        &self.timers
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Registers actor type `A` with the runtime defaults.
    pub fn register_actor<A, F>(&self, factory: F) -> Result<(), RuntimeError>
    where
        A: Actor,
        F: ActorFactory<A>,
    {
        self.register_actor_with_config::<A, F>(factory, ActorTypeConfig::default())
    }

    /// Registers actor type `A`; unset fields of `config` fall back to the
    /// runtime defaults.
    pub fn register_actor_with_config<A, F>(&self, factory: F, config: ActorTypeConfig) -> Result<(), RuntimeError>
    where
        A: Actor,
        F: ActorFactory<A>,
    {
        if self.is_shutting_down() {
            return Err(RuntimeError::ShuttingDown);
        }
        let mut managers = self.managers.write().unwrap_or_else(PoisonError::into_inner);
        if managers.contains_key(A::TYPE_NAME) {
            return Err(RuntimeError::Registration(format!(
                "actor type {} is already registered",
                A::TYPE_NAME
            )));
        }

        let methods = self.registry.register_type::<A>()?;
        let validator: Arc<dyn CallbackValidator> = self.registry.clone();
        let shared = ActorTypeShared {
            factory: Box::new(factory),
            methods,
            registry: self.registry.clone(),
            backend: self.backend.clone(),
            timers: self.timers.clone(),
            validator,
            config: self.config.merge_with_type_config(&config),
        };
        managers.insert(A::TYPE_NAME.to_string(), Arc::new(ActorManager::new(shared)));
        info!(actor_type = A::TYPE_NAME, "Actor type registered with runtime");
        Ok(())
    }

    /// Registered actor type names, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .managers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    fn manager(&self, actor_type: &str) -> Result<Arc<dyn ManageActors>, RuntimeError> {
        self.managers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(actor_type)
            .cloned()
            .ok_or_else(|| RuntimeError::ActorTypeNotRegistered(actor_type.to_string()))
    }

    fn all_managers(&self) -> Vec<Arc<dyn ManageActors>> {
        self.managers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Queues `request` on its actor's mailbox and waits for the turn.
    ///
    /// With a call timeout configured, a caller that gives up also cancels the
    /// request, so a turn that has not started yet is skipped.
    pub async fn dispatch(&self, request: ActorRequest) -> Result<Payload, RuntimeError> {
        if self.is_shutting_down() {
            return Err(RuntimeError::ShuttingDown);
        }
        let manager = self.manager(&request.actor_type)?;
        let call_timeout = manager.config().call_timeout;
        let cancel = request.cancel.clone();
        debug!(request_id = %request.id, actor = %request.address(), name = request.target(), "Dispatching request");
        let receiver = manager.dispatch(request)?;

        let reply = match call_timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(reply) => reply,
                Err(_) => {
                    cancel.cancel();
                    return Err(ActorError::Timeout.into());
                }
            },
            None => receiver.await,
        };

        match reply {
            Ok(result) => result.map_err(RuntimeError::from),
            Err(_) => Err(ActorError::Stopped.into()),
        }
    }

    /// Invokes `method` with an already serialized argument payload.
    pub async fn invoke_method(
        &self,
        actor_type: &str,
        actor_id: ActorId,
        method: &str,
        payload: Payload,
    ) -> Result<Payload, RuntimeError> {
        self.dispatch(ActorRequest::invoke(actor_type, actor_id, method, payload))
            .await
    }

    /// Invokes `method` with a JSON-encoded argument and decodes the result.
    ///
    /// An empty result payload decodes as JSON `null`, so methods completing
    /// without a value can be called with `R = ()`.
    pub async fn invoke<T, R>(&self, actor_type: &str, actor_id: ActorId, method: &str, args: &T) -> Result<R, RuntimeError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(args).map_err(ActorError::from)?;
        let output = self.invoke_method(actor_type, actor_id, method, payload).await?;
        let bytes: &[u8] = if output.is_empty() { b"null" } else { &output };
        Ok(serde_json::from_slice(bytes).map_err(ActorError::from)?)
    }

    /// Delivers one tick of `timer`. `payload` is the stored timer record.
    pub async fn fire_timer(
        &self,
        actor_type: &str,
        actor_id: ActorId,
        timer: &str,
        payload: Payload,
    ) -> Result<(), RuntimeError> {
        self.dispatch(ActorRequest::timer_tick(actor_type, actor_id, timer, payload))
            .await
            .map(|_| ())
    }

    /// Delivers `reminder`. `payload` is the stored reminder record.
    pub async fn fire_reminder(
        &self,
        actor_type: &str,
        actor_id: ActorId,
        reminder: &str,
        payload: Payload,
    ) -> Result<(), RuntimeError> {
        self.dispatch(ActorRequest::reminder_fire(actor_type, actor_id, reminder, payload))
            .await
            .map(|_| ())
    }

    /// Deactivates one actor after the turns already queued for it.
    ///
    /// Returns `false` when the actor had no activation.
    pub async fn deactivate(&self, actor_type: &str, actor_id: &ActorId) -> Result<bool, RuntimeError> {
        let manager = self.manager(actor_type)?;
        match manager.deactivate(actor_id)? {
            Some(done) => {
                // a dropped ack means the worker already exited
                let _ = done.await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn activation_state(&self, actor_type: &str, actor_id: &ActorId) -> ActivationState {
        self.manager(actor_type)
            .map(|manager| manager.activation_state(actor_id))
            .unwrap_or(ActivationState::Inactive)
    }

    pub fn activation_stats(&self, actor_type: &str, actor_id: &ActorId) -> Option<ActivationStats> {
        self.manager(actor_type)
            .ok()
            .and_then(|manager| manager.activation_stats(actor_id))
    }

    /// Ids of `actor_type` with a live activation, sorted.
    pub fn active_actor_ids(&self, actor_type: &str) -> Vec<ActorId> {
        self.manager(actor_type)
            .map(|manager| manager.active_ids())
            .unwrap_or_default()
    }

    /// Deactivates every activation idle past its type's idle timeout.
    /// Returns how many were deactivated.
    pub async fn sweep_idle(&self) -> usize {
        let now = Instant::now();
        let mut pending = Vec::new();
        for manager in self.all_managers() {
            for id in manager.idle_ids(now) {
                match manager.deactivate(&id) {
                    Ok(Some(done)) => {
                        debug!(actor_type = manager.actor_type(), actor_id = %id, "Deactivating idle actor");
                        pending.push(done);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(actor_type = manager.actor_type(), actor_id = %id, error = %err, "Idle deactivation not queued");
                    }
                }
            }
        }
        let count = pending.len();
        join_all(pending).await;
        count
    }

    /// Starts the idle sweeper, running every `scan_interval` until shutdown.
    /// Calling it again restarts the sweeper.
    pub fn start_idle_sweeper(self: &Arc<Self>) {
        let token = CancellationToken::new();
        if let Some(previous) = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone())
        {
            previous.cancel();
        }

        let runtime: Weak<ActorRuntime> = Arc::downgrade(self);
        let scan_interval = self.config.scan_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scan_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(runtime) = runtime.upgrade() else {
                            break;
                        };
                        let swept = runtime.sweep_idle().await;
                        if swept > 0 {
                            info!(count = swept, "Idle actors deactivated");
                        }
                    }
                }
            }
            debug!("Idle sweeper stopped");
        });
    }

    /// Refuses new requests and deactivates every activation, waiting at most
    /// `shutdown_timeout` for them to finish.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(token) = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner).take() {
            token.cancel();
        }

        let mut pending = Vec::new();
        for manager in self.all_managers() {
            for id in manager.active_ids() {
                match manager.deactivate(&id) {
                    Ok(Some(done)) => pending.push(done),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(actor_type = manager.actor_type(), actor_id = %id, error = %err, "Deactivation not queued during shutdown");
                    }
                }
            }
        }

        let count = pending.len();
        match tokio::time::timeout(self.config.shutdown_timeout, join_all(pending)).await {
            Ok(_) => info!(deactivated = count, "Actor runtime shutdown completed gracefully"),
            Err(_) => warn!(
                timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                "Actor runtime shutdown timed out"
            ),
        }
    }
}

impl std::fmt::Debug for ActorRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorRuntime")
            .field("config", &self.config)
            .field("actor_types", &self.registered_types())
            .field("is_shutting_down", &self.is_shutting_down())
            .finish()
    }
}
