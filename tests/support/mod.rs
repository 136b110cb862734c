#![allow(dead_code)]

pub mod socket_guard;

use std::time::Duration;

use postgrab_core::{ExtractorConfig, PostUrlPolicy, RetryPolicy};
use wiremock::MockServer;

/// Config pointing the post policy at a local mock server over plain http.
pub fn local_config() -> ExtractorConfig {
    ExtractorConfig {
        post_policy: PostUrlPolicy::new("127.0.0.1", ["/posts/", "/embed/feed/update/"]).allow_insecure(),
        require_https: false,
        fetch_timeout: Duration::from_secs(2),
        retry: RetryPolicy::no_retry(),
        ..ExtractorConfig::default()
    }
}

/// Absolute URL for `path` on the mock server.
pub fn url(server: &MockServer, path: &str) -> String {
    format!("{}{path}", server.uri())
}
