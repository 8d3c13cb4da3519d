use roost::{ActorRequest, ActorRuntime, CallbackRegistry, InMemoryBackend, RuntimeError};
use roost_api::{
    actor_methods, Actor, ActorAddress, ActorContext, ActorError, ActorId, ActorReminder, ActorResult, ActorTimer,
    BoxedFuture, MethodTable, ReminderPayload,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Delivery {
    name: String,
    state: Vec<u8>,
    due_time: Duration,
    period: Duration,
}

#[derive(Default)]
struct Probe {
    ticks: Mutex<Vec<Vec<u8>>>,
    reminders: Mutex<Vec<Delivery>>,
}

struct Sensor {
    probe: Arc<Probe>,
}

#[actor_methods]
impl Sensor {
    pub async fn start(&mut self, ctx: &mut ActorContext, name: String) -> ActorResult<()> {
        ctx.register_timer(&name, "record", b"tick".to_vec(), Duration::ZERO, Duration::from_secs(5))
            .await?;
        Ok(())
    }

    pub async fn stop(&mut self, ctx: &mut ActorContext, name: String) -> ActorResult<()> {
        ctx.unregister_timer(&name).await
    }

    pub async fn start_unknown(&mut self, ctx: &mut ActorContext) -> ActorResult<()> {
        ctx.register_timer("bad", "missing", Vec::new(), Duration::ZERO, Duration::from_secs(5))
            .await?;
        Ok(())
    }

    pub async fn record(&mut self, data: Vec<u8>) -> ActorResult<()> {
        self.probe.ticks.lock().unwrap().push(data);
        Ok(())
    }

    pub async fn remind(&mut self, ctx: &mut ActorContext) -> ActorResult<()> {
        let reminder = ActorReminder::new(
            ctx.address(),
            "batch",
            b"state".to_vec(),
            Duration::from_secs(60),
            Duration::from_secs(60),
        )
        .with_repetitions(10);
        ctx.register_actor_reminder(&reminder).await
    }

    pub async fn forget(&mut self, ctx: &mut ActorContext, name: String) -> ActorResult<()> {
        ctx.unregister_reminder(&name).await
    }

    pub async fn repetitions(&mut self, ctx: &mut ActorContext, name: String) -> ActorResult<Option<u32>> {
        Ok(ctx.get_reminder(&name).await?.and_then(|reminder| reminder.repetitions))
    }
}

impl Actor for Sensor {
    const TYPE_NAME: &'static str = "Sensor";

    fn methods() -> MethodTable<Self> {
        Self::method_table()
    }

    fn receive_reminder<'a>(
        &'a mut self,
        name: &'a str,
        state: Vec<u8>,
        due_time: Duration,
        period: Duration,
        _ctx: &'a mut ActorContext,
    ) -> BoxedFuture<'a, ActorResult<()>> {
        self.probe.reminders.lock().unwrap().push(Delivery {
            name: name.to_string(),
            state,
            due_time,
            period,
        });
        Box::pin(async { Ok(()) })
    }
}

/// Keeps the default reminder handling.
struct Plain;

#[actor_methods]
impl Plain {
    pub async fn noop(&mut self) -> ActorResult<()> {
        Ok(())
    }
}

impl Actor for Plain {
    const TYPE_NAME: &'static str = "Plain";

    fn methods() -> MethodTable<Self> {
        Self::method_table()
    }
}

fn setup() -> (Arc<InMemoryBackend>, Arc<Probe>, ActorRuntime) {
    let backend = Arc::new(InMemoryBackend::new());
    let probe = Arc::new(Probe::default());
    let runtime = ActorRuntime::builder(backend.clone())
        .registry(Arc::new(CallbackRegistry::new()))
        .build();
    let shared = probe.clone();
    runtime
        .register_actor::<Sensor, _>(move |_: &ActorId| Sensor { probe: shared.clone() })
        .unwrap();
    runtime.register_actor::<Plain, _>(|_: &ActorId| Plain).unwrap();
    (backend, probe, runtime)
}

#[tokio::test]
async fn test_timer_ticks_invoke_callback_once_each() {
    let (backend, probe, runtime) = setup();
    let id = ActorId::from("s1");

    runtime.invoke::<_, ()>("Sensor", id.clone(), "start", "record").await.unwrap();
    let record = backend.timer_record("Sensor", &id, "record").unwrap();
    assert_eq!(record.callback, "record");
    assert_eq!(record.due_time, "0h0m0s0ms");
    assert_eq!(record.period, "0h0m5s0ms");

    let payload = backend.timer_payload("Sensor", &id, "record").unwrap();
    for _ in 0..10 {
        runtime.fire_timer("Sensor", id.clone(), "record", payload.clone()).await.unwrap();
    }
    let ticks = probe.ticks.lock().unwrap().clone();
    assert_eq!(ticks.len(), 10);
    assert!(ticks.iter().all(|data| data == b"tick"));
}

#[tokio::test]
async fn test_unregistered_timer_stops_ticking() {
    let (backend, probe, runtime) = setup();
    let id = ActorId::from("s1");

    runtime.invoke::<_, ()>("Sensor", id.clone(), "start", "record").await.unwrap();
    let payload = backend.timer_payload("Sensor", &id, "record").unwrap();
    runtime.invoke::<_, ()>("Sensor", id.clone(), "stop", "record").await.unwrap();
    assert_eq!(backend.timer_count(), 0);

    let err = runtime.fire_timer("Sensor", id.clone(), "record", payload).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Actor(ActorError::TimerNotRegistered(_))));
    assert_eq!(err.to_string(), "Timer record is not registered for the current activation");
    assert!(probe.ticks.lock().unwrap().is_empty());

    // unregistering twice is harmless
    runtime.invoke::<_, ()>("Sensor", id, "stop", "record").await.unwrap();
}

#[tokio::test]
async fn test_timers_end_with_the_activation() {
    let (backend, probe, runtime) = setup();
    let id = ActorId::from("s1");

    runtime.invoke::<_, ()>("Sensor", id.clone(), "start", "record").await.unwrap();
    runtime.invoke::<_, ()>("Sensor", id.clone(), "start", "audit").await.unwrap();
    assert_eq!(backend.timer_names("Sensor", &id), vec!["audit".to_string(), "record".to_string()]);

    assert!(runtime.deactivate("Sensor", &id).await.unwrap());
    assert!(backend.timer_names("Sensor", &id).is_empty());

    let address = ActorAddress::new("Sensor", id.clone());
    let stale = ActorTimer::new(&address, "record", "record", b"tick".to_vec(), Duration::ZERO, Duration::from_secs(5));
    let err = runtime
        .dispatch(ActorRequest::tick_for(&stale).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Actor(ActorError::TimerNotRegistered(_))));
    assert!(probe.ticks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_callback_is_rejected_before_backend() {
    let (backend, _probe, runtime) = setup();

    let err = runtime
        .invoke::<_, ()>("Sensor", ActorId::from("s1"), "start_unknown", &())
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Actor(ActorError::Validation(_))));
    assert_eq!(
        err.to_string(),
        "Timer callback method: missing does not exist on the actor type: Sensor"
    );
    assert_eq!(backend.timer_count(), 0);
}

#[tokio::test]
async fn test_backend_failure_leaves_timer_untracked() {
    let (backend, _probe, runtime) = setup();
    let id = ActorId::from("s1");

    backend.fail_next_timer_op("timer service down");
    let err = runtime
        .invoke::<_, ()>("Sensor", id.clone(), "start", "record")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Backend unavailable: timer service down");

    let address = ActorAddress::new("Sensor", id);
    let timer = ActorTimer::new(&address, "record", "record", Vec::new(), Duration::ZERO, Duration::from_secs(5));
    let err = runtime
        .dispatch(ActorRequest::tick_for(&timer).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Actor(ActorError::TimerNotRegistered(_))));
}

#[tokio::test]
async fn test_reminder_registration_and_delivery() {
    let (backend, probe, runtime) = setup();
    let id = ActorId::from("s1");

    runtime.invoke::<_, ()>("Sensor", id.clone(), "remind", &()).await.unwrap();
    let record = backend.reminder_record("Sensor", &id, "batch").unwrap();
    assert_eq!(record.due_time, "0h1m0s0ms");
    assert_eq!(record.period, "R10/PT1M");
    assert_eq!(record.data, b"state".to_vec());

    let payload = backend.reminder_payload("Sensor", &id, "batch").unwrap();
    runtime.fire_reminder("Sensor", id.clone(), "batch", payload).await.unwrap();
    assert_eq!(
        *probe.reminders.lock().unwrap(),
        vec![Delivery {
            name: "batch".to_string(),
            state: b"state".to_vec(),
            due_time: Duration::from_secs(60),
            period: Duration::from_secs(60),
        }]
    );
}

#[tokio::test]
async fn test_reminders_outlive_the_activation() {
    let (backend, _probe, runtime) = setup();
    let id = ActorId::from("s1");

    runtime.invoke::<_, ()>("Sensor", id.clone(), "remind", &()).await.unwrap();
    runtime.deactivate("Sensor", &id).await.unwrap();
    assert_eq!(backend.reminder_names("Sensor", &id), vec!["batch".to_string()]);

    let count: Option<u32> = runtime.invoke("Sensor", id.clone(), "repetitions", "batch").await.unwrap();
    assert_eq!(count, Some(10));
    let missing: Option<u32> = runtime.invoke("Sensor", id.clone(), "repetitions", "weekly").await.unwrap();
    assert_eq!(missing, None);

    runtime.invoke::<_, ()>("Sensor", id.clone(), "forget", "batch").await.unwrap();
    assert!(backend.reminder_names("Sensor", &id).is_empty());
    runtime.invoke::<_, ()>("Sensor", id, "forget", "batch").await.unwrap();
}

#[tokio::test]
async fn test_default_reminder_handler_rejects_delivery() {
    let (_backend, _probe, runtime) = setup();
    let address = ActorAddress::new("Plain", ActorId::from("p1"));
    let reminder = ActorReminder::new(&address, "nudge", Vec::new(), Duration::ZERO, Duration::from_secs(1));

    let err = runtime
        .dispatch(ActorRequest::fire_for(&reminder).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Actor(ActorError::NotRemindable(_))));
    assert_eq!(err.to_string(), "Actor type Plain does not handle reminders");
}

#[tokio::test]
async fn test_malformed_reminder_record_fails_turn() {
    let (_backend, probe, runtime) = setup();
    let record = ReminderPayload {
        data: Vec::new(),
        due_time: "soon".to_string(),
        period: String::new(),
        ttl: None,
    };
    let payload = serde_json::to_vec(&record).unwrap();

    let err = runtime
        .fire_reminder("Sensor", ActorId::from("s1"), "batch", payload)
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Actor(ActorError::Format(_))));
    assert!(probe.reminders.lock().unwrap().is_empty());
}
