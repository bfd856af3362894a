//! Tests for the transport-facing handlers

use prometheus_task_lifecycle::config::WorkerPoolConfig;
use prometheus_task_lifecycle::core::{LifecycleCoordinator, TaskStatus, TimedExecutor};
use prometheus_task_lifecycle::runtime::{
    check_status, health, list_tasks, queue_task, stop_task, ApiErrorKind, IdRequest,
    SubmitRequest,
};

fn coordinator() -> LifecycleCoordinator<TimedExecutor> {
    LifecycleCoordinator::start(
        WorkerPoolConfig::new().with_worker_count(1),
        TimedExecutor::from_millis(20),
    )
    .unwrap()
}

fn id(id: &str) -> IdRequest {
    IdRequest {
        id: Some(id.to_string()),
    }
}

#[test]
fn test_queue_task_waits_for_done() {
    let c = coordinator();
    let resp = queue_task(
        &c,
        &SubmitRequest {
            id: Some("q1".into()),
            time: 2,
        },
    )
    .unwrap();
    assert_eq!(resp.id, "q1");
    assert_eq!(resp.status, TaskStatus::Done);
    assert_eq!(
        serde_json::to_string(&resp).unwrap(),
        r#"{"id":"q1","status":"DONE"}"#
    );
    c.shutdown();
}

#[test]
fn test_queue_task_bad_requests() {
    let c = coordinator();

    let missing = queue_task(&c, &SubmitRequest { id: None, time: 1 }).unwrap_err();
    assert_eq!(missing.kind, ApiErrorKind::BadRequest);
    assert!(missing.error.is_none());

    let blank = queue_task(&c, &SubmitRequest { id: Some(" ".into()), time: 1 }).unwrap_err();
    assert_eq!(blank.kind, ApiErrorKind::BadRequest);

    assert_eq!(c.submit("dup", 20), Ok(true));
    let dup = queue_task(&c, &SubmitRequest { id: Some("dup".into()), time: 1 }).unwrap_err();
    assert_eq!(dup.kind, ApiErrorKind::BadRequest);
    assert_eq!(dup.error.as_deref(), Some("duplicate id"));

    c.cancel("dup");
    c.shutdown();
}

#[test]
fn test_check_status_and_stop() {
    let c = coordinator();
    assert_eq!(c.submit("s1", 50), Ok(true));

    let status = check_status(&c, &id("s1")).unwrap().status;
    assert!(status.is_active());

    assert_eq!(stop_task(&c, &id("s1")).unwrap().status, TaskStatus::Stopped);
    assert_eq!(stop_task(&c, &id("never")).unwrap().status, TaskStatus::Stopped);
    assert_eq!(check_status(&c, &id("never")).unwrap().status, TaskStatus::Done);

    assert!(check_status(&c, &IdRequest { id: None }).is_err());
    assert!(stop_task(&c, &IdRequest { id: Some(String::new()) }).is_err());
    c.shutdown();
}

#[test]
fn test_list_and_health() {
    let c = coordinator();
    assert_eq!(c.submit("l1", 50), Ok(true));
    assert_eq!(c.submit("l2", 50), Ok(true));

    let list = list_tasks(&c);
    let ids: Vec<_> = list.tasks.iter().map(|t| t.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["l1", "l2"]);
    assert_eq!(list.stats.worker_count, 1);
    assert!(health(&c).ok);

    c.shutdown();
    assert!(!health(&c).ok);
    assert!(list_tasks(&c).tasks.is_empty());

    let refused = queue_task(&c, &SubmitRequest { id: Some("late".into()), time: 1 }).unwrap_err();
    assert_eq!(refused.kind, ApiErrorKind::Unavailable);
}

#[cfg(feature = "tokio-runtime")]
#[tokio::test]
async fn test_queue_task_async() {
    use prometheus_task_lifecycle::runtime::queue_task_async;

    let c = coordinator();
    let resp = queue_task_async(&c, &SubmitRequest { id: Some("a1".into()), time: 1 })
        .await
        .unwrap();
    assert_eq!(resp.status, TaskStatus::Done);
    c.shutdown();
}
