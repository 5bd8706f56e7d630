// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn sample_event() -> Event {
    Event {
        event_id: EventId::new("11111111-2222-3333-4444-555555555555"),
        event_type: "file.modified".to_string(),
        agent_name: "web-01".to_string(),
        timestamp: 1_700_000_000,
        stack: "prod".to_string(),
        run_id: "run-9".to_string(),
        data: r#"{"path":"/tmp/x"}"#.to_string(),
        severity: Severity::Warning,
    }
}

#[test]
fn severity_defaults_to_info() {
    assert_eq!(Severity::default(), Severity::Info);

    let json = r#"{
        "event_id": "e-1",
        "event_type": "custom.triggered",
        "agent_name": "a1",
        "timestamp": 0
    }"#;
    let event: Event = serde_json::from_str(json).unwrap();
    assert_eq!(event.severity, Severity::Info);
    assert!(event.stack.is_empty());
    assert!(event.data.is_empty());
}

#[parameterized(
    debug = { Severity::Debug, "debug" },
    info = { Severity::Info, "info" },
    warning = { Severity::Warning, "warning" },
    error = { Severity::Error, "error" },
    critical = { Severity::Critical, "critical" },
    fatal = { Severity::Fatal, "fatal" },
)]
fn severity_roundtrips_through_strings(severity: Severity, text: &str) {
    assert_eq!(severity.as_str(), text);
    assert_eq!(text.parse::<Severity>().unwrap(), severity);
    assert_eq!(
        serde_json::to_string(&severity).unwrap(),
        format!("\"{text}\"")
    );
}

#[test]
fn unknown_severity_is_rejected() {
    let err = "loud".parse::<Severity>().unwrap_err();
    assert_eq!(err.to_string(), "unknown severity: loud");
}

#[test]
fn event_json_roundtrip_preserves_all_fields() {
    let event = sample_event();
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn empty_correlation_labels_are_omitted_on_the_wire() {
    let mut event = sample_event();
    event.stack = String::new();
    event.run_id = String::new();
    let json = serde_json::to_string(&event).unwrap();
    assert!(!json.contains("stack"));
    assert!(!json.contains("run_id"));
}
