//! # Activation Worker
//!
//! One worker task per activated actor id. The worker owns the actor instance
//! and its context and drains the id's mailbox one envelope at a time, which
//! is what makes turns of the same id strictly sequential and FIFO.
//!
//! ## Lifecycle
//!
//! ```text
//! Inactive -> Activating -> Active <-> InTurn
//!                              |
//!                              v
//!                        Deactivating -> Inactive
//! ```
//!
//! - The first turn envelope creates the instance through the type's factory
//!   and runs `on_activate`.
//! - A deactivate envelope runs `on_deactivate`, drops the activation's timers
//!   and clears the state cache.
//! - Turns queued behind a deactivate envelope reactivate the actor.
//! - A turn that panics is reported to its caller as a failed turn and the
//!   instance is dropped without `on_deactivate`; the next turn activates a
//!   fresh instance.
//! - An inactive worker with an empty mailbox removes its slot from the
//!   activation table and exits. Both happen under the table lock, and pushes
//!   happen under the same lock, so no envelope is ever stranded.

use crate::envelope::{ActorCallTypeLabel, ActorRequest, Envelope, RequestKind};
use crate::mailbox::MailboxSender;
use crate::manager::ActorTypeShared;
use crate::reply::TurnResult;
use crate::{log_error, log_lifecycle, log_turn, turn_span};
use flume::{Receiver, TryRecvError};
use futures::FutureExt;
use roost_api::actor::{Actor, ActorMethodContext};
use roost_api::address::{ActorAddress, ActorId};
use roost_api::context::ActorContext;
use roost_api::duration;
use roost_api::errors::ActorError;
use roost_api::payload::{ReminderPayload, TimerPayload};
use roost_api::types::ActorResult;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{warn, Instrument};

/// Lifecycle state of one actor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    /// No instance loaded
    Inactive,
    /// Instance being created
    Activating,
    /// Idle, ready for the next turn
    Active,
    /// Executing a turn
    InTurn,
    /// Running deactivation
    Deactivating,
}

/// Counters for one activation slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationStats {
    pub activations: u64,
    pub turns: u64,
    pub failures: u64,
}

pub(crate) struct ActivationStatus {
    state: Mutex<ActivationState>,
    last_active: Mutex<Instant>,
    activations: AtomicU64,
    turns: AtomicU64,
    failures: AtomicU64,
}

impl ActivationStatus {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ActivationState::Activating),
            last_active: Mutex::new(Instant::now()),
            activations: AtomicU64::new(0),
            turns: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> ActivationState {
        *lock(&self.state)
    }

    fn set_state(&self, state: ActivationState) {
        *lock(&self.state) = state;
    }

    fn touch(&self) {
        *lock(&self.last_active) = Instant::now();
    }

    pub(crate) fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*lock(&self.last_active))
    }

    fn record_turn(&self, ok: bool) {
        self.turns.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn stats(&self) -> ActivationStats {
        ActivationStats {
            activations: self.activations.load(Ordering::Relaxed),
            turns: self.turns.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// How a turn ended, as seen by the worker loop.
enum TurnOutcome {
    Completed(TurnResult),
    /// User code panicked; the instance must not run again
    Panicked(ActorError),
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Table entry for an id that has a live worker.
pub(crate) struct ActivationSlot {
    pub(crate) mailbox: MailboxSender,
    pub(crate) status: Arc<ActivationStatus>,
}

pub(crate) type ActivationTable = Mutex<HashMap<ActorId, ActivationSlot>>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct ActivationWorker<A: Actor> {
    id: ActorId,
    address: ActorAddress,
    shared: Arc<ActorTypeShared<A>>,
    receiver: Receiver<Envelope>,
    status: Arc<ActivationStatus>,
    table: Weak<ActivationTable>,
}

impl<A: Actor> ActivationWorker<A> {
    pub(crate) fn new(
        id: ActorId,
        shared: Arc<ActorTypeShared<A>>,
        receiver: Receiver<Envelope>,
        status: Arc<ActivationStatus>,
        table: Weak<ActivationTable>,
    ) -> Self {
        Self {
            address: ActorAddress::new(A::TYPE_NAME, id.clone()),
            id,
            shared,
            receiver,
            status,
            table,
        }
    }

    pub(crate) async fn run(self) {
        let mut instance: Option<(A, ActorContext)> = None;
        loop {
            let envelope = match self.receiver.try_recv() {
                Ok(envelope) => envelope,
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) if instance.is_none() => {
                    if self.try_retire() {
                        return;
                    }
                    continue;
                }
                Err(TryRecvError::Empty) => match self.receiver.recv_async().await {
                    Ok(envelope) => envelope,
                    Err(_) => break,
                },
            };

            match envelope {
                Envelope::Turn { request, reply } => {
                    if request.cancel.is_cancelled() {
                        reply.send(Err(ActorError::Cancelled));
                        continue;
                    }
                    if instance.is_none() {
                        match self.activate().await {
                            Ok(activated) => instance = Some(activated),
                            Err(err) => {
                                reply.send(Err(err));
                                continue;
                            }
                        }
                    }
                    if let Some((actor, ctx)) = instance.as_mut() {
                        match self.run_turn(actor, ctx, request).await {
                            TurnOutcome::Completed(result) => reply.send(result),
                            TurnOutcome::Panicked(err) => {
                                reply.send(Err(err));
                                if let Some((actor, ctx)) = instance.take() {
                                    self.discard(actor, ctx).await;
                                }
                            }
                        }
                    }
                }
                Envelope::Deactivate { done } => {
                    if let Some((actor, ctx)) = instance.take() {
                        self.deactivate(actor, ctx).await;
                    }
                    if let Some(done) = done {
                        let _ = done.send(());
                    }
                }
            }
        }

        // runtime dropped
        if let Some((actor, ctx)) = instance.take() {
            self.deactivate(actor, ctx).await;
        }
    }

    async fn activate(&self) -> ActorResult<(A, ActorContext)> {
        self.status.set_state(ActivationState::Activating);
        let mut actor = self.shared.factory.create(&self.id);
        let mut ctx = ActorContext::new(
            self.address.clone(),
            self.shared.backend.clone(),
            self.shared.timers.clone(),
            self.shared.validator.clone(),
        );

        let activated = async {
            actor.on_activate(&mut ctx).await?;
            ctx.state().save_state().await
        }
        .await;

        match activated {
            Ok(()) => {
                self.status.activations.fetch_add(1, Ordering::Relaxed);
                self.status.touch();
                self.status.set_state(ActivationState::Active);
                log_lifecycle!(A::TYPE_NAME, self.id, "activated");
                Ok((actor, ctx))
            }
            Err(err) => {
                self.status.set_state(ActivationState::Inactive);
                log_error!(err, actor = %self.address, "Activation failed");
                Err(err)
            }
        }
    }

    async fn run_turn(&self, actor: &mut A, ctx: &mut ActorContext, request: ActorRequest) -> TurnOutcome {
        self.status.set_state(ActivationState::InTurn);
        let call_type = request.call_type();
        let method = ActorMethodContext::new(request.target(), call_type);
        let span = turn_span!(ActorCallTypeLabel(call_type), method.method_name, request_id = %request.id);
        log_turn!(A::TYPE_NAME, self.id, ActorCallTypeLabel(call_type), method.method_name);

        ctx.begin_turn(request.cancel.clone());
        let kind = request.kind;
        let turn = AssertUnwindSafe(async {
            actor.on_pre_method(&method, ctx).await?;
            let output = self.dispatch(actor, ctx, kind).await?;
            actor.on_post_method(&method, ctx).await?;
            ctx.state().save_state().await?;
            Ok::<_, ActorError>(output)
        })
        .catch_unwind()
        .instrument(span)
        .await;

        self.status.touch();
        let result = match turn {
            Ok(result) => result,
            Err(panic) => {
                self.status.record_turn(false);
                let err = ActorError::MessageHandlingError(format!(
                    "Panic in actor {} during {}: {}",
                    self.address,
                    method.method_name,
                    panic_message(&*panic)
                ));
                log_error!(err, actor = %self.address, method = %method.method_name, "Turn panicked");
                return TurnOutcome::Panicked(err);
            }
        };

        self.status.record_turn(result.is_ok());
        if let Err(err) = &result {
            // next turn re-reads from the backend
            ctx.state().clear_cache();
            warn!(actor = %self.address, method = %method.method_name, error = %err, "Turn failed");
        }
        self.status.set_state(ActivationState::Active);
        TurnOutcome::Completed(result)
    }

    async fn dispatch(&self, actor: &mut A, ctx: &mut ActorContext, kind: RequestKind) -> TurnResult {
        match kind {
            RequestKind::InvokeMethod { method, payload } => {
                let descriptor = *self.shared.methods.find_method(A::TYPE_NAME, &method)?;
                (descriptor.invoke)(actor, ctx, payload).await
            }
            RequestKind::TimerTick { timer, payload } => {
                if !ctx.has_timer(&timer) {
                    return Err(ActorError::TimerNotRegistered(timer));
                }
                let record: TimerPayload = serde_json::from_slice(&payload)?;
                let handle = self.shared.registry.resolve_timer_callback::<A>(&record.callback)?;
                handle.invoke(actor, ctx, record.data).await?;
                Ok(Vec::new())
            }
            RequestKind::ReminderFire { reminder, payload } => {
                let record: ReminderPayload = serde_json::from_slice(&payload)?;
                let schedule = duration::decode(&record.due_time, &record.period)?;
                actor
                    .receive_reminder(&reminder, record.data, schedule.due_time, schedule.period, ctx)
                    .await?;
                Ok(Vec::new())
            }
        }
    }

    // Drops an instance whose turn panicked. `on_deactivate` is skipped since
    // the instance may be half-updated; its timers and cache still go.
    async fn discard(&self, actor: A, mut ctx: ActorContext) {
        drop(actor);
        ctx.begin_turn(CancellationToken::new());
        self.release_timers(&mut ctx).await;
        ctx.state().clear_cache();
        self.status.set_state(ActivationState::Inactive);
        log_lifecycle!(A::TYPE_NAME, self.id, "discarded");
    }

    async fn release_timers(&self, ctx: &mut ActorContext) {
        for token in ctx.invalidate_timers() {
            if let Err(err) = ctx.timer_manager().unregister_timer(&token).await {
                warn!(actor = %self.address, timer = %token.name, error = %err, "Failed to unregister timer on deactivation");
            }
        }
    }

    async fn deactivate(&self, mut actor: A, mut ctx: ActorContext) {
        self.status.set_state(ActivationState::Deactivating);
        ctx.begin_turn(CancellationToken::new());
        if let Err(err) = actor.on_deactivate(&mut ctx).await {
            warn!(actor = %self.address, error = %err, "on_deactivate failed");
        }

        // timers do not outlive the activation
        self.release_timers(&mut ctx).await;

        ctx.state().clear_cache();
        self.status.set_state(ActivationState::Inactive);
        log_lifecycle!(A::TYPE_NAME, self.id, "deactivated");
    }

    // Removes this worker's slot if nothing is queued. Returns whether the
    // worker should exit.
    fn try_retire(&self) -> bool {
        let Some(table) = self.table.upgrade() else {
            return true;
        };
        let mut slots = lock(&table);
        if !self.receiver.is_empty() {
            return false;
        }
        let owned = slots
            .get(&self.id)
            .is_some_and(|slot| Arc::ptr_eq(&slot.status, &self.status));
        if owned {
            slots.remove(&self.id);
        }
        self.status.set_state(ActivationState::Inactive);
        true
    }
}
