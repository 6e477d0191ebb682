mod common;
use crate::common::{executor_for, init_tracing, with_timeout, Recorder};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use sitedag::engine::{CoreRuntime, Runtime, RuntimeEvent, TriggerReason};
use sitedag::types::TriggerWhileRunningBehaviour;

fn trigger(task: &str) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason: TriggerReason::FileWatch,
    }
}

/// Trigger `styles` (slow), then `scripts` and `compile` while it runs.
async fn run_with(behaviour: TriggerWhileRunningBehaviour) -> Recorder {
    init_tracing();
    let rec = Recorder::new();
    let executor = Arc::new(executor_for(vec![
        rec.task("styles", &[], Duration::from_millis(200)),
        rec.task("scripts", &[], Duration::from_millis(10)),
        rec.task("compile", &[], Duration::from_millis(10)),
    ]));

    let (tx, rx) = mpsc::channel(16);
    let runtime = Runtime::new(CoreRuntime::new(behaviour, 1), rx, tx.clone(), executor);
    let handle = tokio::spawn(runtime.run());

    tx.send(trigger("styles")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(trigger("scripts")).await.unwrap();
    tx.send(trigger("compile")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    with_timeout(handle).await.unwrap().unwrap();
    rec
}

#[tokio::test]
async fn queue_merges_triggers_into_one_follow_up_run() {
    let rec = run_with(TriggerWhileRunningBehaviour::Queue).await;
    assert_eq!(rec.count("styles"), 1);
    assert_eq!(rec.count("scripts"), 1);
    assert_eq!(rec.count("compile"), 1);
    // The follow-up only starts once the first run is over.
    assert!(rec.position("end:styles").unwrap() < rec.position("start:scripts").unwrap());
}

#[tokio::test]
async fn cancel_keeps_only_the_latest_trigger() {
    let rec = run_with(TriggerWhileRunningBehaviour::Cancel).await;
    assert_eq!(rec.count("styles"), 1);
    assert_eq!(rec.count("scripts"), 0);
    assert_eq!(rec.count("compile"), 1);
}

#[tokio::test]
async fn failed_run_does_not_stop_the_runtime() {
    init_tracing();
    let rec = Recorder::new();
    let executor = Arc::new(executor_for(vec![
        rec.failing_task("scripts", &[]),
        rec.task("styles", &[], Duration::from_millis(10)),
    ]));
    let (tx, rx) = mpsc::channel(16);
    let runtime = Runtime::new(
        CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1),
        rx,
        tx.clone(),
        executor,
    );
    let handle = tokio::spawn(runtime.run());

    tx.send(trigger("scripts")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(trigger("styles")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(rec.count("styles"), 1);
}
