// tests/trigger_logging.rs
//
// Log events emitted by `handle_trigger`, captured per test thread.

use mqtt_exec::dispatch::{Entry, handle_trigger};
use mqtt_exec::exec::CommandSpec;
use mqtt_exec_test_utils::capture::capture_events;
use mqtt_exec_test_utils::fake_runner::{FakeBehaviour, FakeRunner};
use mqtt_exec_test_utils::with_timeout;
use tracing::Level;

const STARTS: &str = "command starts...";
const SUCCEEDED: &str = "command succeeded";
const FAILED: &str = "execution failed";
const SKIPPED: &str = "previous run still in progress; trigger skipped";

fn entry(name: &str) -> Entry {
    Entry::new(
        name,
        "ci/build",
        CommandSpec::new("make").with_args(["all"]),
        false,
        None,
    )
}

#[tokio::test]
async fn success_logs_start_then_output() {
    let (capture, _guard) = capture_events();
    let entry = entry("build");
    let runner = FakeRunner::new(FakeBehaviour::Succeed(b"built 3 targets".to_vec()));

    assert!(handle_trigger(&entry, &runner).await.is_success());

    let messages: Vec<_> = capture.events().into_iter().map(|e| e.message).collect();
    assert_eq!(messages, vec![STARTS.to_string(), SUCCEEDED.to_string()]);

    let start = &capture.with_message(STARTS)[0];
    assert_eq!(start.level, Level::INFO);
    assert_eq!(start.field("entry"), Some("build"));
    assert_eq!(start.field("command"), Some("make all"));

    let done = &capture.with_message(SUCCEEDED)[0];
    assert_eq!(done.level, Level::INFO);
    assert_eq!(done.field("entry"), Some("build"));
    assert_eq!(done.field("output"), Some("built 3 targets"));
}

#[tokio::test]
async fn failure_logs_error_with_output() {
    let (capture, _guard) = capture_events();
    let entry = entry("deploy");
    let runner = FakeRunner::new(FakeBehaviour::Exit(2, b"permission denied".to_vec()));

    assert!(handle_trigger(&entry, &runner).await.is_failure());

    let failed = capture.with_message(FAILED);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].level, Level::ERROR);
    assert_eq!(failed[0].field("entry"), Some("deploy"));
    assert_eq!(failed[0].field("error"), Some("command exited with status 2"));
    assert_eq!(failed[0].field("output"), Some("permission denied"));
    assert!(capture.with_message(SUCCEEDED).is_empty());
}

#[tokio::test]
async fn spawn_failure_logs_error_tagged_with_entry() {
    let (capture, _guard) = capture_events();
    let entry = entry("missing");
    let runner = FakeRunner::new(FakeBehaviour::FailToSpawn);

    assert!(handle_trigger(&entry, &runner).await.is_failure());

    let failed = capture.with_message(FAILED);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].field("entry"), Some("missing"));
    assert!(failed[0].field("error").is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn busy_entry_logs_skip_without_start() {
    let (capture, _guard) = capture_events();
    let entry = entry("build");
    let runner = FakeRunner::succeeding();

    let permit = entry.guard().try_begin_or_skip();
    assert!(permit.is_admitted());

    assert!(handle_trigger(&entry, &runner).await.is_skipped());
    drop(permit);

    let events = capture.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, SKIPPED);
    assert_eq!(events[0].level, Level::INFO);
    assert_eq!(events[0].field("entry"), Some("build"));
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn overlapping_triggers_log_one_run_and_one_skip() {
    let (capture, _guard) = capture_events();
    let entry = entry("build");
    let runner = FakeRunner::succeeding().held();

    let first = handle_trigger(&entry, &runner);
    let second = async {
        runner.wait_for_calls(1).await;
        let outcome = handle_trigger(&entry, &runner).await;
        runner.release(1);
        outcome
    };
    let (first, second) = with_timeout(async { tokio::join!(first, second) }).await;

    assert!(first.is_success());
    assert!(second.is_skipped());

    for message in [STARTS, SUCCEEDED, SKIPPED] {
        let events = capture.with_message(message);
        assert_eq!(events.len(), 1, "{message}");
        assert_eq!(events[0].field("entry"), Some("build"));
    }
}
