//! End-to-end runs with real child processes (unix only)
//!
//! `cargo test -p herd-task --test process_test`
#![cfg(unix)]

mod common;

use common::MemorySink;
use herd_foundation::SupervisorConfig;
use herd_task::{ProcessLauncher, ShutdownReason, Supervisor, SupervisorEvent, TaskOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn supervisor(config: SupervisorConfig, sink: &MemorySink) -> Supervisor<ProcessLauncher> {
    Supervisor::new(config, ProcessLauncher::new(), Arc::new(sink.clone())).expect("valid config")
}

async fn run(supervisor: Supervisor<ProcessLauncher>) -> herd_task::RunReport {
    tokio::time::timeout(Duration::from_secs(20), supervisor.run())
        .await
        .expect("supervisor did not finish")
        .expect("run failed")
}

#[tokio::test]
async fn test_echo_replicas() {
    let sink = MemorySink::default();
    let config = SupervisorConfig::new("sh")
        .with_args(["-c", "echo out-{{index}}; echo err-{{index}} >&2"])
        .with_count(3);

    let report = run(supervisor(config, &sink)).await;

    assert_eq!(report.outcomes, vec![TaskOutcome::ExitedClean; 3]);
    let texts = sink.texts();
    for i in 0..3 {
        assert!(texts.contains(&format!("[task-{}] [STDOUT] out-{}", i, i)));
        assert!(texts.contains(&format!("[task-{}] [STDERR] err-{}", i, i)));
    }
}

#[tokio::test]
async fn test_env_override_per_replica() {
    let sink = MemorySink::default();
    let config = SupervisorConfig::new("sh")
        .with_args(["-c", "echo \"$REPLICA\""])
        .with_env("REPLICA=r{{index}}")
        .with_count(2);

    run(supervisor(config, &sink)).await;

    let texts = sink.texts();
    assert!(texts.contains(&"[task-0] [STDOUT] r0".to_string()));
    assert!(texts.contains(&"[task-1] [STDOUT] r1".to_string()));
}

#[tokio::test]
async fn test_interrupt_terminates_sleepers() {
    let sink = MemorySink::default();
    let config = SupervisorConfig::new("sleep").with_args(["30"]).with_count(2);
    let supervisor = supervisor(config, &sink);

    let events = supervisor.events();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = events.send(SupervisorEvent::Interrupt);
    });

    let report = run(supervisor).await;
    let sigterm = TaskOutcome::KilledBySignal("SIGTERM".to_string());
    assert_eq!(report.outcomes, vec![sigterm.clone(), sigterm]);
    assert_eq!(report.shutdown, Some(ShutdownReason::Interrupt));
}

#[tokio::test]
async fn test_ignored_term_is_escalated_to_kill() {
    let sink = MemorySink::default();
    let config = SupervisorConfig::new("sh")
        .with_args(["-c", "trap '' TERM; echo armed; while :; do sleep 1; done"])
        .with_count(1)
        .with_timeout(Duration::from_millis(300));
    let supervisor = supervisor(config, &sink);

    let events = supervisor.events();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = events.send(SupervisorEvent::Interrupt);
    });

    let report = run(supervisor).await;
    assert_eq!(
        report.outcomes,
        vec![TaskOutcome::KilledBySignal("SIGKILL".to_string())]
    );
    assert!(sink
        .texts()
        .contains(&"task 0 graceful timeout reached - terminating".to_string()));
}

#[tokio::test]
async fn test_missing_program_fails_fast() {
    let sink = MemorySink::default();
    let config = SupervisorConfig::new("nonexistent_command_12345")
        .with_count(2)
        .with_fail_fast(true);

    let report = run(supervisor(config, &sink)).await;

    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o, TaskOutcome::LaunchFailed(_))));
    assert_eq!(report.shutdown, Some(ShutdownReason::FailFast { index: 0 }));
}

#[tokio::test]
async fn test_background_grandchild_does_not_hold_run_open() {
    let sink = MemorySink::default();
    let config = SupervisorConfig::new("sh")
        .with_args(["-c", "sleep 8 & echo started"])
        .with_count(1)
        .with_timeout(Duration::from_millis(300));

    let start = Instant::now();
    let report = run(supervisor(config, &sink)).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(report.outcomes, vec![TaskOutcome::ExitedClean]);
    assert!(sink.texts().contains(&"[task-0] [STDOUT] started".to_string()));
}

#[tokio::test]
async fn test_interrupt_after_exit_ends_run() {
    let sink = MemorySink::default();
    let config = SupervisorConfig::new("sh")
        .with_args(["-c", "sleep 8 & echo started"])
        .with_count(1)
        .with_timeout(Duration::from_secs(30));
    let supervisor = supervisor(config, &sink);

    let events = supervisor.events();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let _ = events.send(SupervisorEvent::Interrupt);
    });

    let start = Instant::now();
    let report = run(supervisor).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(report.outcomes, vec![TaskOutcome::ExitedClean]);
    assert_eq!(report.shutdown, Some(ShutdownReason::Interrupt));
}
