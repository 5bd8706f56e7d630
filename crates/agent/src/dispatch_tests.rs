// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn payload(command: &str) -> TaskPayload {
    TaskPayload {
        command: command.to_string(),
        stack: String::new(),
        run_id: String::new(),
        env: HashMap::new(),
        timeout_secs: 0,
    }
}

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let outcome = run_task(&payload("echo hello")).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.stdout, "hello\n");
    assert!(outcome.stderr.is_empty());
}

#[tokio::test]
async fn captures_stderr_and_failure() {
    let outcome = run_task(&payload("echo oops >&2; exit 3")).await.unwrap();
    assert_eq!(outcome.exit_code, 3);
    assert_eq!(outcome.stderr, "oops\n");
}

#[tokio::test]
async fn env_is_passed_through() {
    let mut task = payload("printf '%s' \"$DEPLOY_TARGET\"");
    task.env
        .insert("DEPLOY_TARGET".to_string(), "staging".to_string());

    let outcome = run_task(&task).await.unwrap();
    assert_eq!(outcome.stdout, "staging");
}

#[tokio::test]
async fn timeout_kills_the_task() {
    let mut task = payload("sleep 30");
    task.timeout_secs = 1;

    let err = run_task(&task).await.unwrap_err();
    assert!(matches!(err, DispatchError::Timeout(1)));
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let err = run_task(&payload("")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Empty { .. }));
}
