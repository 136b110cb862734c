//! Localhost socket guard for wiremock-based tests.
//!
//! Sandboxed CI runners sometimes forbid binding even loopback sockets. Tests
//! call [`start_mock_server_or_skip`] and return early on `None`, unless
//! `POSTGRAB_REQUIRE_SOCKET_TESTS` is set, in which case they fail loudly.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "POSTGRAB_REQUIRE_SOCKET_TESTS";

fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }
    assert!(
        !socket_tests_required(),
        "cannot bind a localhost socket and {REQUIRE_ENV} is set"
    );
    eprintln!("[socket-bound-test] cannot bind localhost socket; skipping (set {REQUIRE_ENV}=1 to fail instead)");
    None
}
