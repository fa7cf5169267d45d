use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collector_engine::{
    Anonymous, AuthTokenProvider, BackendClient, ClientSettings, ErrorKind, FailureOrigin, JobId,
    JobPoller, JobResult, StaticToken,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INTERVAL: Duration = Duration::from_millis(10);

fn init_logging() {
    collector_logging::initialize_for_tests();
}

/// Hands out a different token on every call.
#[derive(Default)]
struct RotatingToken {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl AuthTokenProvider for RotatingToken {
    async fn token(&self) -> Option<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Some(format!("tok-{n}"))
    }
}

fn poller_for(
    server: &MockServer,
    auth: Arc<dyn AuthTokenProvider>,
    deadline: Duration,
) -> JobPoller {
    let client = BackendClient::new(&ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("client");
    JobPoller::new(Arc::new(client), auth, INTERVAL, deadline)
}

async fn status_query_count(server: &MockServer, job: &str) -> usize {
    let wanted = format!("/status/{job}");
    server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}

async fn mount_status_once(server: &MockServer, job: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/status/{job}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn polls_through_progress_until_completed() {
    init_logging();
    let server = MockServer::start().await;
    mount_status_once(&server, "j1", json!({"status": "queued"})).await;
    mount_status_once(&server, "j1", json!({"status": "processing"})).await;
    mount_status_once(
        &server,
        "j1",
        json!({
            "status": "completed",
            "result": {
                "data": {"title": "T", "tags": ["a"], "priority": "Low"},
                "original_url": "https://example.com",
                "processed_at": "2026-01-01 00:00:00"
            }
        }),
    )
    .await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_secs(5));
    let result = poller
        .poll(&JobId::new("j1"), &CancellationToken::new())
        .await
        .expect("completed");

    assert_eq!(
        result,
        JobResult::new(json!({"title": "T", "tags": ["a"], "priority": "Low"}))
    );
    assert_eq!(status_query_count(&server, "j1").await, 3);
}

#[tokio::test]
async fn failed_job_with_quota_marker_is_classified() {
    init_logging();
    let server = MockServer::start().await;
    mount_status_once(
        &server,
        "j1",
        json!({"status": "failed", "error": "Upgrade to Pro for more credits"}),
    )
    .await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_secs(5));
    let err = poller
        .poll(&JobId::new("j1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.origin, FailureOrigin::Job);
    assert_eq!(err.kind, ErrorKind::QuotaExceeded);
    assert_eq!(err.message, "Upgrade to Pro for more credits");
}

#[tokio::test]
async fn failed_job_without_message_uses_fallback() {
    init_logging();
    let server = MockServer::start().await;
    mount_status_once(&server, "j1", json!({"status": "failed"})).await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_secs(5));
    let err = poller
        .poll(&JobId::new("j1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Generic);
    assert_eq!(err.message, "Extraction failed on server.");
}

#[tokio::test]
async fn unknown_job_is_not_found_and_stops_polling() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})))
        .mount(&server)
        .await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_secs(5));
    let err = poller
        .poll(&JobId::new("missing"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.origin, FailureOrigin::StatusQuery);
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Failed to fetch job status: Job not found");

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(status_query_count(&server, "missing").await, 1);
}

#[tokio::test]
async fn server_error_on_status_query_is_not_retried() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/j1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_secs(5));
    let err = poller
        .poll(&JobId::new("j1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.origin, FailureOrigin::StatusQuery);
    assert_eq!(err.kind, ErrorKind::Generic);
    assert_eq!(status_query_count(&server, "j1").await, 1);
}

#[tokio::test]
async fn unrecognized_status_ends_the_poll() {
    init_logging();
    let server = MockServer::start().await;
    mount_status_once(&server, "j1", json!({"status": "deferred"})).await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_secs(5));
    let err = poller
        .poll(&JobId::new("j1"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.origin, FailureOrigin::StatusQuery);
}

#[tokio::test]
async fn token_is_fetched_fresh_for_every_query() {
    init_logging();
    let server = MockServer::start().await;
    mount_status_once(&server, "j1", json!({"status": "processing"})).await;
    mount_status_once(
        &server,
        "j1",
        json!({"status": "completed", "result": {"data": {}}}),
    )
    .await;

    let poller = poller_for(
        &server,
        Arc::new(RotatingToken::default()),
        Duration::from_secs(5),
    );
    poller
        .poll(&JobId::new("j1"), &CancellationToken::new())
        .await
        .expect("completed");

    let auth_headers: Vec<String> = server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .filter_map(|request| request.headers.get("authorization"))
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect();
    assert_eq!(auth_headers, vec!["Bearer tok-1", "Bearer tok-2"]);
}

#[tokio::test]
async fn cancelled_token_prevents_any_query() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let poller = poller_for(&server, Arc::new(StaticToken::new("t")), Duration::from_secs(5));
    let err = poller.poll(&JobId::new("j1"), &cancel).await.unwrap_err();

    assert_eq!(err.origin, FailureOrigin::Cancelled);
    assert_eq!(status_query_count(&server, "j1").await, 0);
}

#[tokio::test]
async fn cancellation_mid_poll_stops_queries() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .mount(&server)
        .await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_secs(5));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(INTERVAL * 4).await;
        trigger.cancel();
    });

    let err = poller.poll(&JobId::new("j1"), &cancel).await.unwrap_err();
    assert!(err.is_cancelled());

    // Let a request that was already on the wire land before counting.
    tokio::time::sleep(INTERVAL * 2).await;
    let after_cancel = status_query_count(&server, "j1").await;
    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(status_query_count(&server, "j1").await, after_cancel);
}

#[tokio::test]
async fn deadline_cancels_a_job_that_never_settles() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .mount(&server)
        .await;

    let poller = poller_for(&server, Arc::new(Anonymous), Duration::from_millis(60));
    let cancel = CancellationToken::new();
    let err = poller.poll(&JobId::new("j1"), &cancel).await.unwrap_err();

    assert_eq!(err.origin, FailureOrigin::DeadlineExceeded);
    assert_eq!(err.kind, ErrorKind::Generic);
    assert!(cancel.is_cancelled());

    tokio::time::sleep(INTERVAL * 2).await;
    let after_deadline = status_query_count(&server, "j1").await;
    assert!(after_deadline >= 1);
    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(status_query_count(&server, "j1").await, after_deadline);
}
