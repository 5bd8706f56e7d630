// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL lock semantics: holder scoping, expiry, scoped acquisition.

use sloth_core::FakeClock;
use sloth_storage::{KvError, KvStore};
use std::time::Duration;

#[test]
fn lock_contention() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let kv = KvStore::open(tmp.path(), clock).unwrap();
    let ttl = Duration::from_secs(30);

    kv.lock("L", "h1", ttl).unwrap();

    let err = kv.lock("L", "h2", ttl).unwrap_err();
    assert_eq!(err.to_string(), "lock 'L' already held by h1");

    let err = kv.unlock("L", "h2").unwrap_err();
    assert_eq!(err.to_string(), "lock 'L' not held by h2");

    kv.unlock("L", "h1").unwrap();
    kv.lock("L", "h2", ttl).unwrap();
    assert_eq!(kv.is_locked("L"), (true, "h2".to_string()));
}

#[test]
fn expiry_makes_the_lock_available() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let kv = KvStore::open(tmp.path(), clock.clone()).unwrap();

    kv.lock("L", "h1", Duration::from_secs(30)).unwrap();
    assert_eq!(kv.is_locked("L"), (true, "h1".to_string()));

    clock.advance_secs(31);
    assert_eq!(kv.is_locked("L"), (false, String::new()));
    kv.lock("L", "h2", Duration::from_secs(30)).unwrap();
}

#[test]
fn with_lock_serializes_critical_sections() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let kv = KvStore::open(tmp.path(), clock).unwrap();

    let result: Result<i64, KvError> = kv.with_lock("inventory", "job-1", Duration::from_secs(30), || {
        // While held, nobody else can take it
        let err = kv.lock("inventory", "job-2", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, KvError::AlreadyHeld { .. }));
        kv.increment("inventory/counter", 1)
    });

    assert_eq!(result.unwrap(), 1);
    // Released on exit: immediately reacquirable
    kv.lock("inventory", "job-2", Duration::from_secs(30)).unwrap();
}
