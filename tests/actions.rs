mod common;

use std::sync::Arc;

use common::{job, registry, FakeAdapter};
use queue_board::board::actions::{dispatch, CleanTarget, QueueAction};
use queue_board::board::handlers::{self, JOB_ID_PARAM, QUEUE_NAME_PARAM, QUEUE_STATUS_PARAM};
use queue_board::board::{BoardError, BoardRequest};
use queue_board::status::JobStatus;
use serde_json::json;

#[tokio::test]
async fn read_only_queue_rejects_commands_before_the_adapter() {
    let emails = Arc::new(FakeAdapter::new().read_only().jobs(JobStatus::Failed, 1));
    let registry = registry(&[("emails", &emails)]);

    for action in [
        QueueAction::RetryJob("failed-0".into()),
        QueueAction::PromoteJob("failed-0".into()),
        QueueAction::CleanJob("failed-0".into()),
        QueueAction::RetryAllFailed,
        QueueAction::CleanAll(CleanTarget::Completed),
        QueueAction::Pause,
        QueueAction::Resume,
    ] {
        let err = dispatch(&registry, "emails", action).await.unwrap_err();
        assert!(matches!(err, BoardError::ReadOnlyViolation(_)));
        assert_eq!(err.http_status(), 405);
    }

    assert!(emails.commands().is_empty());
    assert!(!emails.is_paused_now());
}

#[tokio::test]
async fn read_only_queue_still_serves_logs() {
    let emails = Arc::new(FakeAdapter::new().read_only().logs(&["started", "done"]));
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry)
        .param(QUEUE_NAME_PARAM, "emails")
        .param(JOB_ID_PARAM, "1");

    let response = handlers::job_logs(&req).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body, json!(["started", "done"]));
}

#[tokio::test]
async fn unknown_queue_is_not_found() {
    let emails = Arc::new(FakeAdapter::new());
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry).param(QUEUE_NAME_PARAM, "missing");

    let response = handlers::pause_queue(&req).await;

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.body, json!({"error": "queue missing not found"}));
    assert!(emails.commands().is_empty());
}

#[tokio::test]
async fn retries_can_be_disabled_per_queue() {
    let emails = Arc::new(FakeAdapter::new().without_retries().jobs(JobStatus::Failed, 1));
    let registry = registry(&[("emails", &emails)]);

    let err = dispatch(&registry, "emails", QueueAction::RetryAllFailed)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::RetriesDisabled(_)));

    dispatch(&registry, "emails", QueueAction::CleanAll(CleanTarget::Failed))
        .await
        .unwrap();
    assert_eq!(emails.commands(), ["clean_all_failed"]);
}

#[tokio::test]
async fn successful_commands_return_an_empty_body() {
    let emails = Arc::new(FakeAdapter::new().slot(JobStatus::Failed, Some(job("42", "resize"))));
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry)
        .param(QUEUE_NAME_PARAM, "emails")
        .param(JOB_ID_PARAM, "42");

    let response = handlers::retry_job(&req).await;
    assert_eq!(response.status, None);
    assert_eq!(response.body, json!({}));

    handlers::promote_job(&req).await;
    handlers::clean_job(&req).await;

    assert_eq!(
        emails.commands(),
        ["retry_job:42", "promote_job:42", "clean_job:42"]
    );
}

#[tokio::test]
async fn pause_and_resume_reach_the_backend() {
    let emails = Arc::new(FakeAdapter::new());
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry).param(QUEUE_NAME_PARAM, "emails");

    handlers::pause_queue(&req).await;
    assert!(emails.is_paused_now());

    handlers::resume_queue(&req).await;
    assert!(!emails.is_paused_now());
}

#[tokio::test]
async fn bulk_clean_routes_by_status_parameter() {
    let emails = Arc::new(FakeAdapter::new());
    let registry = registry(&[("emails", &emails)]);

    for status in ["delayed", "failed", "completed"] {
        let req = BoardRequest::new(&registry)
            .param(QUEUE_NAME_PARAM, "emails")
            .param(QUEUE_STATUS_PARAM, status);
        assert_eq!(handlers::clean_all(&req).await.status_code(), 200);
    }

    let req = BoardRequest::new(&registry)
        .param(QUEUE_NAME_PARAM, "emails")
        .param(QUEUE_STATUS_PARAM, "active");
    assert_eq!(handlers::clean_all(&req).await.status_code(), 404);

    assert_eq!(
        emails.commands(),
        ["clean_all_delayed", "clean_all_failed", "clean_all_completed"]
    );
}

#[tokio::test]
async fn backend_errors_are_passed_through_verbatim() {
    let emails = Arc::new(FakeAdapter::new().unavailable());
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry).param(QUEUE_NAME_PARAM, "emails");

    let response = handlers::retry_all(&req).await;

    assert_eq!(response.status_code(), 500);
    assert_eq!(response.body, json!({"error": "connection refused"}));
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let emails = Arc::new(FakeAdapter::new());
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry)
        .param(QUEUE_NAME_PARAM, "emails")
        .param(JOB_ID_PARAM, "404");

    let response = handlers::retry_job(&req).await;

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.body, json!({"error": "job 404 not found"}));
}

#[tokio::test]
async fn workers_endpoint_lists_an_empty_pool() {
    let emails = Arc::new(FakeAdapter::new());
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry).param(QUEUE_NAME_PARAM, "emails");

    let response = handlers::queue_workers(&req).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn job_detail_returns_the_formatted_job() {
    let emails = Arc::new(FakeAdapter::new().read_only().slot(JobStatus::Failed, Some(job("42", "resize"))));
    let registry = registry(&[("emails", &emails)]);
    let req = BoardRequest::new(&registry)
        .param(QUEUE_NAME_PARAM, "emails")
        .param(JOB_ID_PARAM, "42");

    let response = handlers::job_detail(&req).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body["id"], json!("42"));
    assert_eq!(response.body["name"], json!("resize"));
    assert!(response.body.get("returnValue").is_some());
    assert!(emails.commands().is_empty());
}

#[tokio::test]
async fn job_detail_of_a_missing_job_is_not_found() {
    let emails = Arc::new(FakeAdapter::new().jobs(JobStatus::Done, 2));
    let registry = registry(&[("emails", &emails)]);

    let req = BoardRequest::new(&registry)
        .param(QUEUE_NAME_PARAM, "emails")
        .param(JOB_ID_PARAM, "404");
    let response = handlers::job_detail(&req).await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.body, json!({"error": "job 404 not found"}));

    let req = BoardRequest::new(&registry)
        .param(QUEUE_NAME_PARAM, "reports")
        .param(JOB_ID_PARAM, "done-0");
    assert_eq!(handlers::job_detail(&req).await.status_code(), 404);
}

#[tokio::test]
async fn pause_without_backend_support_is_rejected() {
    let billing = Arc::new(FakeAdapter::new().without_pause());
    let registry = registry(&[("billing", &billing)]);
    let req = BoardRequest::new(&registry).param(QUEUE_NAME_PARAM, "billing");

    for response in [
        handlers::pause_queue(&req).await,
        handlers::resume_queue(&req).await,
    ] {
        assert_eq!(response.status_code(), 405);
        assert_eq!(
            response.body,
            json!({"error": "queue cannot be paused: workers have no pause flag"})
        );
    }

    assert!(billing.commands().is_empty());
    assert!(!billing.is_paused_now());
}
