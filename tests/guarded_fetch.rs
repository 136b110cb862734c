//! Guarded fetch against a real HTTP server: redirect validation and deadlines.

use std::sync::Arc;
use std::time::Duration;

use postgrab_core::{FetchError, FetchOptions, GuardedFetcher, HostSet, ReqwestTransport};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn fetcher() -> GuardedFetcher {
    let transport = Arc::new(ReqwestTransport::new(1024 * 1024).unwrap());
    GuardedFetcher::with_scheme_policy(transport, false)
}

fn local_hosts() -> HostSet {
    HostSet::new(["127.0.0.1"])
}

async fn redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", to))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_follows_redirects_within_budget() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    redirect(&server, "/a", "/b").await;
    redirect(&server, "/b", "/c").await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
        .mount(&server)
        .await;

    let response = fetcher()
        .fetch(
            &format!("{}/a", server.uri()),
            &local_hosts(),
            &FetchOptions::new(Duration::from_secs(2)).with_max_redirects(2),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "landed");
    assert!(response.url.path().ends_with("/c"));
}

#[tokio::test]
async fn test_rejects_chain_one_longer_than_budget() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    redirect(&server, "/r0", "/r1").await;
    redirect(&server, "/r1", "/r2").await;
    redirect(&server, "/r2", "/r3").await;
    Mock::given(method("GET"))
        .and(path("/r3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = fetcher()
        .fetch(
            &format!("{}/r0", server.uri()),
            &local_hosts(),
            &FetchOptions::new(Duration::from_secs(2)).with_max_redirects(2),
        )
        .await;

    assert!(matches!(result, Err(FetchError::TooManyRedirects { max: 2, .. })), "got {result:?}");
}

#[tokio::test]
async fn test_blocks_redirect_to_metadata_host() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    redirect(&server, "/a", "http://169.254.169.254/latest/meta-data/").await;

    let result = fetcher()
        .fetch(
            &format!("{}/a", server.uri()),
            &local_hosts(),
            &FetchOptions::new(Duration::from_secs(2)),
        )
        .await;

    match result {
        Err(FetchError::BlockedHost { host, .. }) => assert_eq!(host, "169.254.169.254"),
        other => panic!("expected BlockedHost, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let result = fetcher()
        .fetch(
            &format!("{}/slow", server.uri()),
            &local_hosts(),
            &FetchOptions::new(Duration::from_millis(200)),
        )
        .await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })), "got {result:?}");
    assert!(started.elapsed() < Duration::from_secs(2), "timeout must not wait for the response");
}

#[tokio::test]
async fn test_https_pinned_fetcher_refuses_plain_http() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let transport = Arc::new(ReqwestTransport::new(1024).unwrap());
    let result = GuardedFetcher::new(transport)
        .fetch(
            &format!("{}/a", server.uri()),
            &local_hosts(),
            &FetchOptions::new(Duration::from_secs(2)),
        )
        .await;

    assert!(matches!(result, Err(FetchError::InsecureScheme { .. })), "got {result:?}");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
