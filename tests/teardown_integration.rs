//! Integration tests for stack teardown
//!
//! Drives the coordinator end to end against the in-memory directory:
//! - removal ordering and continue-past-failure
//! - empty stacks and capability gating
//! - multi-stack error aggregation and fatal listing errors
//! - convergence waiting and cancellation

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use stackdown::directory::{ApiVersion, InMemoryDirectory, ResourceMutator};
use stackdown::engine::{TeardownCoordinator, WaitPolicy};
use stackdown::errors::{DirectoryError, TeardownError};
use stackdown::progress::{ProgressLine, RecordingSink};
use stackdown::types::{Resource, ResourceKind, Task, TaskState};

fn fast_policy() -> WaitPolicy {
    WaitPolicy {
        poll_interval: Duration::from_millis(1),
        max_poll_interval: Duration::from_millis(5),
        timeout: None,
    }
}

fn coordinator(
    directory: &Arc<InMemoryDirectory>,
    sink: &Arc<RecordingSink>,
) -> TeardownCoordinator<InMemoryDirectory, InMemoryDirectory> {
    TeardownCoordinator::new(directory.clone(), directory.clone(), sink.clone(), fast_policy())
}

fn in_use(kind: ResourceKind, id: &str) -> DirectoryError {
    DirectoryError::InUse {
        kind,
        id: id.to_string(),
        message: "in use".to_string(),
    }
}

// ============================================================================
// Reference scenario
// ============================================================================

#[tokio::test]
async fn test_web_fails_partially_and_db_is_empty() {
    // Secrets are not supported by this API version.
    let directory = Arc::new(InMemoryDirectory::with_api_version(ApiVersion::new(1, 24)));
    directory.add(ResourceKind::Service, Resource::with_id("svc-w", "web", "worker"));
    directory.add(ResourceKind::Service, Resource::with_id("svc-a", "web", "api"));
    directory.add(ResourceKind::Network, Resource::with_id("net-1", "web", "web_default"));
    directory.add(ResourceKind::Secret, Resource::with_id("sec-1", "web", "ignored"));
    directory.fail_removal("svc-a", in_use(ResourceKind::Service, "svc-a"));
    let sink = Arc::new(RecordingSink::new());

    let err = coordinator(&directory, &sink)
        .remove(&["web", "db"], true, &CancellationToken::new())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("failed to remove some resources from stack: web"));
    assert!(!message.contains("db"));

    assert_eq!(
        sink.lines(),
        vec![
            ProgressLine::Out("removing service api".to_string()),
            ProgressLine::Err(format!(
                "failed to remove service svc-a: {}",
                in_use(ResourceKind::Service, "svc-a")
            )),
            ProgressLine::Out("removing service worker".to_string()),
            ProgressLine::Out("removing network web_default".to_string()),
            ProgressLine::Err("nothing found in stack: db".to_string()),
        ]
    );

    let failures = err.stack_failures().unwrap();
    let web = failures.iter().next().unwrap();
    assert_eq!(web.stack, "web");
    assert_eq!(web.failures.len(), 1);
    assert_eq!(web.failures[0].id, "svc-a");
    assert_eq!(web.failures[0].name, "api");

    // The unsupported secret was never touched.
    assert_eq!(directory.resources(ResourceKind::Secret).len(), 1);
    assert_eq!(directory.list_calls(ResourceKind::Secret), 0);
}

// ============================================================================
// Removal behavior
// ============================================================================

#[tokio::test]
async fn test_every_item_attempted_exactly_once_despite_failures() {
    let directory = Arc::new(InMemoryDirectory::new());
    for i in 0..6 {
        directory.add(
            ResourceKind::Network,
            Resource::with_id(format!("n{}", i), "web", format!("net_{}", i)),
        );
    }
    directory.fail_removal("n0", in_use(ResourceKind::Network, "n0"));
    directory.fail_removal("n5", in_use(ResourceKind::Network, "n5"));
    let sink = Arc::new(RecordingSink::new());

    let err = coordinator(&directory, &sink)
        .remove(&["web"], true, &CancellationToken::new())
        .await
        .unwrap_err();

    let mut attempted: Vec<String> = directory
        .removal_attempts()
        .into_iter()
        .map(|(_, id)| id)
        .collect();
    attempted.sort();
    assert_eq!(attempted, vec!["n0", "n1", "n2", "n3", "n4", "n5"]);
    assert_eq!(sink.err_lines().len(), 2);
    assert_eq!(err.stack_failures().unwrap().len(), 1);
}

#[tokio::test]
async fn test_service_order_is_independent_of_input_order() {
    let names = ["zeta", "alpha", "mid", "beta"];
    let directory = Arc::new(InMemoryDirectory::new());
    for name in names {
        directory.add(ResourceKind::Service, Resource::new("web", name));
    }
    let sink = Arc::new(RecordingSink::new());

    coordinator(&directory, &sink)
        .remove(&["web"], true, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        sink.out_lines(),
        vec![
            "removing service alpha",
            "removing service beta",
            "removing service mid",
            "removing service zeta"
        ]
    );
}

#[tokio::test]
async fn test_successful_teardown_returns_no_error() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::new("web", "api"));
    directory.add(ResourceKind::Secret, Resource::new("web", "token"));
    directory.add(ResourceKind::Config, Resource::new("web", "conf"));
    directory.add(ResourceKind::Network, Resource::new("web", "web_default"));
    let sink = Arc::new(RecordingSink::new());

    let report = coordinator(&directory, &sink)
        .remove(&["web"], true, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.stacks[0].had_error());
    for kind in ResourceKind::REMOVAL_ORDER {
        assert!(directory.resources(kind).is_empty());
    }
    assert!(sink.err_lines().is_empty());
}

// ============================================================================
// Empty stacks and capability gating
// ============================================================================

#[tokio::test]
async fn test_empty_stack_makes_no_calls_and_no_error() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::new("other", "api"));
    let sink = Arc::new(RecordingSink::new());

    let report = coordinator(&directory, &sink)
        .remove(&["web"], false, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.stacks[0].nothing_found());
    assert!(directory.removal_attempts().is_empty());
    assert_eq!(directory.task_list_calls(), 0);
    assert_eq!(sink.err_lines(), vec!["nothing found in stack: web"]);
}

#[tokio::test]
async fn test_stack_with_only_unsupported_kinds_is_empty() {
    let directory = Arc::new(InMemoryDirectory::with_api_version(ApiVersion::new(1, 20)));
    directory.add(ResourceKind::Secret, Resource::new("web", "token"));
    directory.add(ResourceKind::Config, Resource::new("web", "conf"));
    let sink = Arc::new(RecordingSink::new());

    let report = coordinator(&directory, &sink)
        .remove(&["web"], true, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.stacks[0].nothing_found());
    assert_eq!(directory.resources(ResourceKind::Secret).len(), 1);
    assert_eq!(directory.resources(ResourceKind::Config).len(), 1);
}

// ============================================================================
// Multi-stack aggregation
// ============================================================================

#[tokio::test]
async fn test_failure_in_one_stack_does_not_stop_the_next() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::with_id("a1", "alpha", "alpha_api"));
    directory.add(ResourceKind::Service, Resource::with_id("b1", "beta", "beta_api"));
    directory.add(ResourceKind::Network, Resource::with_id("b2", "beta", "beta_default"));
    directory.fail_removal("b1", in_use(ResourceKind::Service, "b1"));
    let sink = Arc::new(RecordingSink::new());

    let err = coordinator(&directory, &sink)
        .remove(&["beta", "alpha"], true, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stack_failures().unwrap().stacks(), vec!["beta"]);
    assert!(!err.to_string().contains("alpha"));
    let attempted: Vec<String> = directory
        .removal_attempts()
        .into_iter()
        .map(|(_, id)| id)
        .collect();
    assert_eq!(attempted, vec!["b1", "b2", "a1"]);
}

#[tokio::test]
async fn test_failures_from_several_stacks_are_joined_by_newline() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Config, Resource::with_id("c1", "one", "conf"));
    directory.add(ResourceKind::Config, Resource::with_id("c2", "two", "conf"));
    directory.fail_removal("c1", DirectoryError::PermissionDenied { message: "ro".to_string() });
    directory.fail_removal("c2", DirectoryError::PermissionDenied { message: "ro".to_string() });
    let sink = Arc::new(RecordingSink::new());

    let err = coordinator(&directory, &sink)
        .remove(&["one", "two"], true, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "failed to remove some resources from stack: one\n\
         failed to remove some resources from stack: two"
    );
}

#[tokio::test]
async fn test_listing_error_aborts_before_any_removal() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::new("a", "api"));
    directory.add(ResourceKind::Service, Resource::new("b", "api"));
    directory.fail_list(
        ResourceKind::Network,
        DirectoryError::Transport {
            message: "connection refused".to_string(),
        },
    );
    let sink = Arc::new(RecordingSink::new());

    let err = coordinator(&directory, &sink)
        .remove(&["a", "b"], false, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TeardownError::Query { ref stack, kind: ResourceKind::Network, .. } if stack == "a"
    ));
    assert!(directory.removal_attempts().is_empty());
    assert_eq!(directory.list_calls(ResourceKind::Service), 1);
    assert_eq!(directory.task_list_calls(), 0);
    assert!(sink.lines().is_empty());
}

// ============================================================================
// Convergence
// ============================================================================

#[tokio::test]
async fn test_attached_teardown_waits_for_scripted_convergence() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::with_id("s1", "web", "api"));
    let task = |state| Task {
        id: "t1".to_string(),
        service_id: "s1".to_string(),
        stack: "web".to_string(),
        state,
    };
    directory.script_tasks(
        "web",
        vec![
            vec![task(TaskState::Running)],
            vec![task(TaskState::Running)],
            vec![task(TaskState::Complete)],
        ],
    );
    let sink = Arc::new(RecordingSink::new());

    let report = coordinator(&directory, &sink)
        .remove(&["web"], false, &CancellationToken::new())
        .await
        .unwrap();

    let outcome = report.stacks[0].wait.as_ref().unwrap().as_ref().unwrap();
    assert_eq!(outcome.rounds, 3);
    assert_eq!(directory.task_list_calls(), 3);
}

#[tokio::test]
async fn test_detached_teardown_never_polls_tasks() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::with_id("s1", "web", "api"));
    directory.add_task(Task::new("web", "s1", TaskState::Running));
    let sink = Arc::new(RecordingSink::new());

    coordinator(&directory, &sink)
        .remove(&["web"], true, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(directory.task_list_calls(), 0);
}

#[tokio::test]
async fn test_wait_failure_on_first_stack_still_processes_second() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::with_id("s1", "web", "api"));
    directory.add(ResourceKind::Service, Resource::with_id("s2", "db", "postgres"));
    directory.fail_task_list(DirectoryError::Transport {
        message: "unreachable".to_string(),
    });
    let sink = Arc::new(RecordingSink::new());

    let report = coordinator(&directory, &sink)
        .remove(&["web", "db"], false, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stacks.len(), 2);
    assert!(report.stacks.iter().all(|s| matches!(s.wait, Some(Err(_)))));
    assert_eq!(directory.removal_attempts().len(), 2);
    assert_eq!(
        sink.err_lines()
            .iter()
            .filter(|line| line.starts_with("failed to get tasks for stack:"))
            .count(),
        2
    );
}

// ============================================================================
// Cancellation
// ============================================================================

/// Mutator whose removals never complete.
struct StallingMutator;

#[async_trait]
impl ResourceMutator for StallingMutator {
    async fn remove_service(&self, _id: &str) -> Result<(), DirectoryError> {
        std::future::pending().await
    }

    async fn remove_network(&self, _id: &str) -> Result<(), DirectoryError> {
        std::future::pending().await
    }

    async fn remove_secret(&self, _id: &str) -> Result<(), DirectoryError> {
        std::future::pending().await
    }

    async fn remove_config(&self, _id: &str) -> Result<(), DirectoryError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_cancellation_interrupts_inflight_removal() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::new("web", "api"));
    let sink = Arc::new(RecordingSink::new());
    let coordinator = TeardownCoordinator::new(
        directory.clone(),
        Arc::new(StallingMutator),
        sink.clone(),
        fast_policy(),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = coordinator.remove(&["web"], true, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(sink.out_lines(), vec!["removing service api"]);
}

#[tokio::test]
async fn test_cancellation_during_wait_is_not_convergence() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::with_id("s1", "web", "api"));
    directory.script_tasks(
        "web",
        vec![vec![Task::new("web", "s1", TaskState::Running)]],
    );
    let sink = Arc::new(RecordingSink::new());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let err = coordinator(&directory, &sink)
        .remove(&["web", "db"], false, &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    // The second stack is never reached.
    assert!(!sink.err_lines().iter().any(|line| line.contains("db")));
}

#[tokio::test]
async fn test_cancelled_run_keeps_failures_of_finished_stacks() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add(ResourceKind::Service, Resource::with_id("s1", "web", "api"));
    directory.add(ResourceKind::Network, Resource::with_id("n1", "web", "web_default"));
    directory.fail_removal("n1", in_use(ResourceKind::Network, "n1"));
    directory.script_tasks(
        "web",
        vec![vec![Task::new("web", "s1", TaskState::Running)]],
    );
    let sink = Arc::new(RecordingSink::new());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let err = coordinator(&directory, &sink)
        .remove(&["web", "db"], false, &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    let TeardownError::Cancelled { partial } = &err else {
        panic!("expected cancellation, got {:?}", err);
    };
    assert_eq!(partial.stacks(), vec!["web"]);
    assert_eq!(err.stack_failures().map(|f| f.len()), Some(1));
}
