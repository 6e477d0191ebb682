mod common;
use crate::common::{executor_for, init_tracing, with_timeout, Recorder, SiteFixture};

use std::sync::Arc;
use std::time::Duration;

use sitedag::dag::{action_fn, Task, TaskRegistry};
use sitedag::engine::{Executor, TaskContext};
use sitedag::errors::BuildError;
use sitedag::tasks::register_builtin_tasks;
use sitedag::types::Environment;

const SHORT: Duration = Duration::from_millis(20);

#[tokio::test]
async fn diamond_runs_shared_dependency_once() {
    init_tracing();
    let rec = Recorder::new();
    let exec = executor_for(vec![
        rec.task("a", &[], SHORT),
        rec.task("b", &["a"], SHORT),
        rec.task("c", &["a"], SHORT),
        rec.task("d", &["b", "c"], SHORT),
    ]);

    let summary = with_timeout(exec.run("d")).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(rec.count("a"), 1);
    assert_eq!(summary.succeeded.len(), 4);
    assert!(rec.position("end:a").unwrap() < rec.position("start:b").unwrap());
    assert!(rec.position("end:a").unwrap() < rec.position("start:c").unwrap());
    assert!(rec.position("end:b").unwrap() < rec.position("start:d").unwrap());
    assert!(rec.position("end:c").unwrap() < rec.position("start:d").unwrap());
}

#[tokio::test]
async fn independent_tasks_run_concurrently() {
    init_tracing();
    let rec = Recorder::new();
    let exec = executor_for(vec![
        rec.task("fonts", &[], Duration::from_millis(100)),
        rec.task("styles", &[], Duration::from_millis(100)),
        Task::group("default", ["fonts", "styles"]),
    ]);

    with_timeout(exec.run("default")).await.unwrap();

    // Both started before either finished.
    let events = rec.events();
    assert!(events[0].starts_with("start:"));
    assert!(events[1].starts_with("start:"));
}

#[tokio::test]
async fn cycle_fails_before_any_action_runs() {
    init_tracing();
    let rec = Recorder::new();
    let exec = executor_for(vec![
        rec.task("a", &["c"], SHORT),
        rec.task("b", &["a"], SHORT),
        rec.task("c", &["b"], SHORT),
        rec.task("leaf", &[], SHORT),
        Task::group("default", ["leaf", "a"]),
    ]);

    let err = exec.run("default").await.unwrap_err();

    match err {
        BuildError::CyclicDependency { cycle } => {
            assert_eq!(cycle.first(), cycle.last());
            for name in ["a", "b", "c"] {
                assert!(cycle.contains(&name.to_string()), "{cycle:?}");
            }
        }
        other => panic!("expected CyclicDependency, got {other}"),
    }
    assert!(rec.events().is_empty());
}

#[tokio::test]
async fn unknown_dependency_names_the_missing_task() {
    init_tracing();
    let rec = Recorder::new();
    let exec = executor_for(vec![
        rec.task("styles", &[], SHORT),
        Task::group("default", ["styles", "missing"]),
    ]);

    let err = exec.run("default").await.unwrap_err();

    assert!(
        matches!(&err, BuildError::UnknownTask { name, referenced_by }
            if name == "missing" && referenced_by.as_deref() == Some("default")),
        "{err}"
    );
    assert!(rec.events().is_empty());
    assert!(matches!(
        exec.run("nope").await,
        Err(BuildError::UnknownTask { .. })
    ));
}

#[tokio::test]
async fn failure_blocks_dependents_but_not_siblings() {
    init_tracing();
    let rec = Recorder::new();
    let exec = executor_for(vec![
        rec.failing_task("scripts", &[]),
        rec.task("bundle", &["scripts"], SHORT),
        rec.task("styles", &[], Duration::from_millis(50)),
        Task::group("default", ["bundle", "styles"]),
    ]);

    let err = with_timeout(exec.run("default")).await.unwrap_err();

    assert!(matches!(&err, BuildError::TaskFailed { task, .. } if task == "scripts"));
    assert_eq!(rec.count("styles"), 1);
    assert!(rec.position("start:bundle").is_none());
}

#[tokio::test]
async fn panicking_action_is_a_task_failure() {
    init_tracing();
    let exec = executor_for(vec![Task::new("boom").with_action(action_fn(|_ctx| async {
        if true {
            panic!("kaboom");
        }
        Ok(())
    }))]);

    let err = with_timeout(exec.run("boom")).await.unwrap_err();
    assert!(matches!(err, BuildError::TaskFailed { task, .. } if task == "boom"));
}

#[tokio::test]
async fn cyclic_site_graph_writes_nothing() {
    init_tracing();
    let site = SiteFixture::standard();
    let cfg = Arc::new(site.config(Environment::Production));

    let mut registry = TaskRegistry::new();
    register_builtin_tasks(&mut registry, cfg);
    // Last registration wins: styles now waits on a task that waits on it.
    let styles = registry.get("styles").unwrap().clone().after(["postcss"]);
    registry.register(styles);
    registry.register(Task::group("postcss", ["styles"]));

    assert!(matches!(
        registry.validate(),
        Err(BuildError::CyclicDependency { .. })
    ));

    let exec = Executor::new(Arc::new(registry), TaskContext::default());
    let err = exec.run("default").await.unwrap_err();
    assert!(matches!(err, BuildError::CyclicDependency { .. }));
    assert!(!site.exists("static"));
}
