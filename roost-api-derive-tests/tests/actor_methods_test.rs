use async_trait::async_trait;
use roost_api::{
    actor_methods, Actor, ActorAddress, ActorBackend, ActorContext, ActorId, ActorReminder, ActorReminderToken,
    ActorResult, ActorTimer, ActorTimerManager, ActorTimerToken, BackendError, CallbackValidator, MethodTable,
    Receiver, ReturnShape, StateChange, ValidationError, Visibility,
};
use std::sync::Arc;

#[derive(Default)]
struct Probe {
    ticks: Vec<Vec<u8>>,
    total: i64,
    pings: u32,
}

#[actor_methods]
impl Probe {
    pub async fn on_tick(&mut self, data: Vec<u8>) -> ActorResult<()> {
        self.ticks.push(data);
        Ok(())
    }

    pub async fn ping(&mut self) -> ActorResult<()> {
        self.pings += 1;
        Ok(())
    }

    pub async fn add(&mut self, ctx: &mut ActorContext, by: i64) -> ActorResult<i64> {
        self.total += by;
        ctx.state().set_state("total", &self.total)?;
        Ok(self.total)
    }

    pub async fn label(&self, count: i64, name: String) -> ActorResult<String> {
        Ok(format!("{name}{count}"))
    }

    pub async fn two_args(&mut self, _a: i32, _b: i32) -> ActorResult<()> {
        Ok(())
    }

    pub async fn value(&mut self) -> ActorResult<i32> {
        Ok(7)
    }

    pub fn version(&self) -> u32 {
        3
    }

    #[roost(rename = "dup")]
    pub async fn dup_plain(&mut self) -> ActorResult<()> {
        Ok(())
    }

    #[roost(rename = "dup")]
    pub async fn dup_with_arg(&mut self, _x: i32) -> ActorResult<()> {
        Ok(())
    }

    async fn hidden(&mut self) -> ActorResult<()> {
        self.pings += 10;
        Ok(())
    }

    pub(crate) async fn crate_only(&mut self) {}

    pub async fn shared_tick() -> ActorResult<()> {
        Ok(())
    }

    #[roost(skip)]
    pub fn helper<T: ToString>(&self, value: T) -> String {
        value.to_string()
    }
}

#[actor_methods(table = "extra_methods")]
impl Probe {
    pub async fn reset(&mut self) -> ActorResult<()> {
        self.total = 0;
        Ok(())
    }
}

impl Actor for Probe {
    const TYPE_NAME: &'static str = "Probe";

    fn methods() -> MethodTable<Self> {
        let mut table = Self::method_table();
        table.extend(Self::extra_methods());
        table
    }
}

struct NullBackend;

#[async_trait]
impl ActorBackend for NullBackend {
    async fn register_timer(&self, _: &str, _: &ActorId, _: &str, _: Vec<u8>) -> Result<(), BackendError> {
        Ok(())
    }

    async fn unregister_timer(&self, _: &str, _: &ActorId, _: &str) -> Result<(), BackendError> {
        Ok(())
    }

    async fn register_reminder(&self, _: &str, _: &ActorId, _: &str, _: Vec<u8>) -> Result<(), BackendError> {
        Ok(())
    }

    async fn unregister_reminder(&self, _: &str, _: &ActorId, _: &str) -> Result<(), BackendError> {
        Ok(())
    }

    async fn get_reminder(&self, _: &str, _: &ActorId, _: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(None)
    }

    async fn get_state(&self, _: &str, _: &ActorId, _: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(None)
    }

    async fn save_state(&self, _: &str, _: &ActorId, _: Vec<StateChange>) -> Result<(), BackendError> {
        Ok(())
    }
}

struct NullTimers;

#[async_trait]
impl ActorTimerManager for NullTimers {
    async fn register_timer(&self, _: &ActorTimer) -> ActorResult<()> {
        Ok(())
    }

    async fn unregister_timer(&self, _: &ActorTimerToken) -> ActorResult<()> {
        Ok(())
    }

    async fn register_reminder(&self, _: &ActorReminder) -> ActorResult<()> {
        Ok(())
    }

    async fn unregister_reminder(&self, _: &ActorReminderToken) -> ActorResult<()> {
        Ok(())
    }

    async fn get_reminder(&self, _: &ActorReminderToken) -> ActorResult<Option<ActorReminder>> {
        Ok(None)
    }
}

fn context() -> ActorContext {
    ActorContext::new(
        ActorAddress::new("Probe", ActorId::from("p1")),
        Arc::new(NullBackend),
        Arc::new(NullTimers),
        Arc::new(Probe::methods()),
    )
}

fn validation_error(callback: &str) -> ValidationError {
    Probe::methods()
        .validate_timer_callback("Probe", callback)
        .expect_err("callback should be rejected")
}

#[test]
fn test_table_lists_declared_methods() {
    let table = Probe::methods();
    let mut names: Vec<&str> = table.names().collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "add",
            "crate_only",
            "dup",
            "dup",
            "hidden",
            "label",
            "on_tick",
            "ping",
            "reset",
            "shared_tick",
            "two_args",
            "value",
            "version"
        ]
    );
    assert!(table.overloads("helper").next().is_none());
}

#[test]
fn test_descriptor_shapes() {
    let table = Probe::methods();

    let add = table.find_method("Probe", "add").unwrap();
    assert_eq!(add.params, 1);
    assert_eq!(add.returns, ReturnShape::Value);
    assert_eq!(add.receiver, Receiver::Instance);

    let version = table.find_method("Probe", "version").unwrap();
    assert_eq!(version.returns, ReturnShape::Sync);

    let crate_only = table.find_method("Probe", "crate_only").unwrap();
    assert_eq!(crate_only.returns, ReturnShape::Completion);
    assert_eq!(crate_only.visibility, Visibility::Restricted);

    let hidden = table.find_method("Probe", "hidden").unwrap();
    assert_eq!(hidden.visibility, Visibility::Private);

    let shared = table.find_method("Probe", "shared_tick").unwrap();
    assert_eq!(shared.receiver, Receiver::Static);
    assert_eq!(shared.params, 0);
}

#[test]
fn test_valid_callbacks() {
    let table = Probe::methods();
    for callback in ["on_tick", "ping", "hidden", "crate_only", "shared_tick", "reset"] {
        let handle = table.validate_timer_callback("Probe", callback).unwrap();
        assert_eq!(handle.name(), callback);
    }
}

#[test]
fn test_missing_callback() {
    assert_eq!(
        validation_error("nope").to_string(),
        "Timer callback method: nope does not exist on the actor type: Probe"
    );
}

#[test]
fn test_overloaded_callback() {
    assert_eq!(
        validation_error("dup").to_string(),
        "Timer callback method: dup cannot be overloaded."
    );
}

#[test]
fn test_too_many_parameters() {
    assert_eq!(
        validation_error("two_args"),
        ValidationError::TooManyParameters {
            callback: "two_args".to_string(),
            params: 2,
        }
    );
    assert_eq!(
        validation_error("two_args").to_string(),
        "Timer callback can accept only zero or one parameters"
    );
}

#[test]
fn test_value_and_sync_callbacks_rejected() {
    for callback in ["value", "version", "add"] {
        assert_eq!(
            validation_error(callback).to_string(),
            "Timer callback can only return type ActorResult<()>"
        );
    }
}

#[test]
fn test_validator_trait_object() {
    let validator: Arc<dyn CallbackValidator> = Arc::new(Probe::methods());
    assert!(validator.validate_timer_callback("Probe", "ping").is_ok());
    assert!(validator.validate_timer_callback("Probe", "dup").is_err());
}

#[tokio::test]
async fn test_invoke_decodes_single_json_argument() {
    let mut probe = Probe::default();
    let mut ctx = context();
    let table = Probe::methods();
    let add = *table.find_method("Probe", "add").unwrap();

    let output = (add.invoke)(&mut probe, &mut ctx, b"5".to_vec()).await.unwrap();
    assert_eq!(output, b"5".to_vec());
    let output = (add.invoke)(&mut probe, &mut ctx, b"2".to_vec()).await.unwrap();
    assert_eq!(output, b"7".to_vec());
    assert_eq!(ctx.state().get_state::<i64>("total").await.unwrap(), 7);
}

#[tokio::test]
async fn test_invoke_decodes_argument_tuple() {
    let mut probe = Probe::default();
    let mut ctx = context();
    let table = Probe::methods();
    let label = *table.find_method("Probe", "label").unwrap();

    let output = (label.invoke)(&mut probe, &mut ctx, br#"[2,"x"]"#.to_vec()).await.unwrap();
    let decoded: String = serde_json::from_slice(&output).unwrap();
    assert_eq!(decoded, "x2");
}

#[tokio::test]
async fn test_invoke_bad_argument_is_serialization_error() {
    let mut probe = Probe::default();
    let mut ctx = context();
    let table = Probe::methods();
    let add = *table.find_method("Probe", "add").unwrap();

    let err = (add.invoke)(&mut probe, &mut ctx, b"\"five\"".to_vec()).await.unwrap_err();
    assert!(err.to_string().starts_with("Serialization failed:"));
    assert_eq!(probe.total, 0);
}

#[tokio::test]
async fn test_sync_method_result_is_json() {
    let mut probe = Probe::default();
    let mut ctx = context();
    let table = Probe::methods();
    let version = *table.find_method("Probe", "version").unwrap();

    let output = (version.invoke)(&mut probe, &mut ctx, Vec::new()).await.unwrap();
    assert_eq!(output, b"3".to_vec());
}

#[tokio::test]
async fn test_handle_passes_raw_bytes() {
    let mut probe = Probe::default();
    let mut ctx = context();
    let table = Probe::methods();
    let handle = table.validate_timer_callback("Probe", "on_tick").unwrap();

    handle.invoke(&mut probe, &mut ctx, b"abc".to_vec()).await.unwrap();
    handle.invoke(&mut probe, &mut ctx, Vec::new()).await.unwrap();
    assert_eq!(probe.ticks, vec![b"abc".to_vec(), Vec::new()]);
}

#[tokio::test]
async fn test_parameterless_handles_ignore_payload() {
    let mut probe = Probe::default();
    let mut ctx = context();
    let table = Probe::methods();

    let ping = table.validate_timer_callback("Probe", "ping").unwrap();
    ping.invoke(&mut probe, &mut ctx, b"ignored".to_vec()).await.unwrap();
    let hidden = table.validate_timer_callback("Probe", "hidden").unwrap();
    hidden.invoke(&mut probe, &mut ctx, Vec::new()).await.unwrap();
    let shared = table.validate_timer_callback("Probe", "shared_tick").unwrap();
    shared.invoke(&mut probe, &mut ctx, Vec::new()).await.unwrap();

    assert_eq!(probe.pings, 11);
}

#[test]
fn test_skipped_helper_still_callable() {
    let probe = Probe::default();
    assert_eq!(probe.helper(42), "42");
}

#[test]
fn test_ambiguous_invocation() {
    let table = Probe::methods();
    let err = table.find_method("Probe", "dup").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Method dup is declared more than once on the actor type: Probe"
    );
}
