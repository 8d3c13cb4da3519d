use roost_api::{ActorAddress, ActorId, ActorReminder, ActorTimer, ReminderPayload, TimerPayload};
use serde_json::json;
use std::time::Duration;

fn address() -> ActorAddress {
    ActorAddress::new("Sensor", ActorId::from("s1"))
}

#[test]
fn test_timer_record_wire_format() {
    let timer = ActorTimer::new(&address(), "record", "on_tick", b"hi".to_vec(), Duration::ZERO, Duration::from_secs(5));
    let value = serde_json::to_value(timer.to_payload()).unwrap();
    assert_eq!(
        value,
        json!({
            "callback": "on_tick",
            "data": "aGk=",
            "dueTime": "0h0m0s0ms",
            "period": "0h0m5s0ms",
        })
    );
}

#[test]
fn test_reminder_record_with_ttl() {
    let reminder = ActorReminder::new(&address(), "daily", Vec::new(), Duration::from_secs(1), Duration::from_secs(60))
        .with_repetitions(3)
        .with_ttl(Duration::from_secs(3_600));
    let value = serde_json::to_value(reminder.to_payload()).unwrap();
    assert_eq!(
        value,
        json!({
            "data": "",
            "dueTime": "0h0m1s0ms",
            "period": "R3/PT1M",
            "ttl": "1h0m0s0ms",
        })
    );
}

#[test]
fn test_reminder_decodes_back() {
    let reminder = ActorReminder::new(&address(), "daily", b"s".to_vec(), Duration::from_millis(1_500), Duration::from_secs(90))
        .with_repetitions(4)
        .with_ttl(Duration::from_secs(600));
    let bytes = serde_json::to_vec(&reminder.to_payload()).unwrap();
    let payload: ReminderPayload = serde_json::from_slice(&bytes).unwrap();

    let decoded = ActorReminder::from_payload(reminder.token(), payload).unwrap();
    assert_eq!(decoded, reminder);
}

#[test]
fn test_timer_decodes_back() {
    let timer = ActorTimer::new(&address(), "record", "on_tick", b"x".to_vec(), Duration::ZERO, Duration::from_secs(5));
    let payload: TimerPayload = serde_json::from_slice(&serde_json::to_vec(&timer.to_payload()).unwrap()).unwrap();
    assert_eq!(ActorTimer::from_payload(timer.token(), payload).unwrap(), timer);
}

#[test]
fn test_reference_record_decodes() {
    let payload: ReminderPayload = serde_json::from_value(json!({
        "data": "c3RhdGU=",
        "dueTime": "0h1m0s0ms",
        "period": "R10/PT1M",
    }))
    .unwrap();
    let reminder = ActorReminder::from_payload(ActorReminder::new(&address(), "r", Vec::new(), Duration::ZERO, Duration::ZERO).token(), payload)
        .unwrap();
    assert_eq!(reminder.state, b"state".to_vec());
    assert_eq!(reminder.due_time, Duration::from_secs(60));
    assert_eq!(reminder.period, Duration::from_secs(60));
    assert_eq!(reminder.repetitions, Some(10));
    assert_eq!(reminder.ttl, None);
}

#[test]
fn test_malformed_record_is_format_error() {
    let payload = ReminderPayload {
        data: Vec::new(),
        due_time: "later".to_string(),
        period: String::new(),
        ttl: None,
    };
    let token = ActorReminder::new(&address(), "r", Vec::new(), Duration::ZERO, Duration::ZERO).token();
    let err = ActorReminder::from_payload(token, payload).unwrap_err();
    assert_eq!(err.field, "dueTime");
    assert_eq!(err.value, "later");
}
