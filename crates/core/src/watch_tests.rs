// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

fn config(watcher_type: WatcherType) -> WatcherConfig {
    WatcherConfig::new(watcher_type, vec![EventCondition::Changed])
}

#[test]
fn new_config_gets_a_uuid() {
    let a = config(WatcherType::Cpu);
    let b = config(WatcherType::Cpu);
    assert_ne!(a.id, b.id);
    assert_eq!(a.id.as_str().len(), 36);
}

#[test]
fn interval_defaults_to_five_seconds() {
    let mut cfg = config(WatcherType::Cpu);
    assert_eq!(cfg.interval(), Duration::from_secs(5));

    cfg.interval_secs = 30;
    assert_eq!(cfg.interval(), Duration::from_secs(30));
}

#[test]
fn empty_conditions_are_invalid() {
    let mut cfg = config(WatcherType::Cpu);
    cfg.conditions.clear();
    assert_eq!(cfg.validate(), Err(WatchConfigError::NoConditions));
}

#[parameterized(
    file = { WatcherType::File, "file_path" },
    directory = { WatcherType::Directory, "file_path" },
    disk = { WatcherType::Disk, "file_path" },
    log = { WatcherType::Log, "file_path" },
    process = { WatcherType::Process, "process_name" },
    port = { WatcherType::Port, "port" },
    service = { WatcherType::Service, "service_name" },
    command = { WatcherType::Command, "command" },
)]
fn required_fields_are_enforced(watcher_type: WatcherType, field: &'static str) {
    let cfg = config(watcher_type);
    assert_eq!(
        cfg.validate(),
        Err(WatchConfigError::MissingField {
            watcher_type,
            field,
        })
    );
}

#[test]
fn log_watcher_requires_a_pattern_too() {
    let mut cfg = config(WatcherType::Log);
    cfg.file_path = "/var/log/app.log".to_string();
    assert_eq!(
        cfg.validate(),
        Err(WatchConfigError::MissingField {
            watcher_type: WatcherType::Log,
            field: "pattern",
        })
    );

    cfg.pattern = "ERROR*".to_string();
    assert_eq!(cfg.validate(), Ok(()));
}

#[test]
fn cpu_watcher_needs_no_extra_fields() {
    assert_eq!(config(WatcherType::Cpu).validate(), Ok(()));
}

#[parameterized(
    network = { WatcherType::Network },
    connection = { WatcherType::Connection },
    user = { WatcherType::User },
    package = { WatcherType::Package },
)]
fn reserved_types_are_flagged(watcher_type: WatcherType) {
    assert!(watcher_type.is_reserved());
    assert_eq!(config(watcher_type).validate(), Ok(()));
}

#[test]
fn config_json_roundtrip_drops_empty_fields() {
    let mut cfg = WatcherConfig::new(
        WatcherType::File,
        vec![EventCondition::Created, EventCondition::Changed],
    );
    cfg.file_path = "/tmp/watched".to_string();
    cfg.check_hash = true;
    cfg.stack = "prod".to_string();

    let json = serde_json::to_value(&cfg).unwrap();
    assert_eq!(json["type"], "file");
    assert!(json.get("process_name").is_none());
    assert!(json.get("service_name").is_none());

    let back: WatcherConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn conditions_parse_from_strings() {
    assert_eq!(
        "above".parse::<EventCondition>().unwrap(),
        EventCondition::Above
    );
    assert!(matches!(
        "bigger".parse::<EventCondition>(),
        Err(WatchConfigError::UnknownCondition(_))
    ));
}
