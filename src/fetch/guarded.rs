//! Guarded fetches: manual redirect handling with per-hop host validation.
//!
//! Every hop (the initial request and each redirect target) must use https
//! and pass the caller's [`HostAllowList`]. A single deadline covers the whole
//! chain; when it passes the in-flight request future is dropped, which
//! cancels the underlying request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION, REFERER};
use tokio::time::Instant;
use tracing::{debug, instrument};
use url::Url;

use super::transport::{HttpTransport, TransportRequest, TransportResponse};
use super::FetchError;
use crate::config::DEFAULT_MAX_REDIRECTS;
use crate::policy::HostAllowList;

/// Per-call options for a guarded fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Deadline for the whole redirect chain, body included.
    pub timeout: Duration,
    /// Redirect hops followed before failing.
    pub max_redirects: usize,
    /// HTTP method for the first hop.
    pub method: Method,
    /// Headers sent on every hop.
    pub headers: HeaderMap,
}

impl FetchOptions {
    /// Creates GET options with the given deadline and the default hop budget.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            method: Method::GET,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the redirect hop budget.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header; values that are not valid header text are skipped.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the `Referer` header.
    #[must_use]
    pub fn with_referer(self, referer: &str) -> Self {
        self.with_header(REFERER, referer)
    }
}

/// Fetches URLs while validating every redirect hop against an allow-list.
///
/// Cheap to clone; clones share the same transport.
#[derive(Clone)]
pub struct GuardedFetcher {
    transport: Arc<dyn HttpTransport>,
    require_https: bool,
}

impl std::fmt::Debug for GuardedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedFetcher")
            .field("require_https", &self.require_https)
            .finish_non_exhaustive()
    }
}

impl GuardedFetcher {
    /// Creates a fetcher that pins every hop to https.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            require_https: true,
        }
    }

    /// Creates a fetcher with an explicit scheme policy.
    ///
    /// Plain http is only meant for local test servers.
    #[must_use]
    pub fn with_scheme_policy(transport: Arc<dyn HttpTransport>, require_https: bool) -> Self {
        Self {
            transport,
            require_https,
        }
    }

    /// Fetches `url`, following at most `options.max_redirects` validated hops.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if a URL or redirect target cannot be parsed
    /// - [`FetchError::InsecureScheme`] if a hop is not https (when pinned)
    /// - [`FetchError::BlockedHost`] if a hop fails the allow-list
    /// - [`FetchError::MissingLocation`] if a redirect has no target
    /// - [`FetchError::TooManyRedirects`] if the hop budget is exhausted
    /// - [`FetchError::Timeout`] if the deadline passes first
    /// - transport errors from the underlying request
    #[instrument(skip(self, allowed, options), fields(timeout_ms = options.timeout.as_millis()))]
    pub async fn fetch(
        &self,
        url: &str,
        allowed: &dyn HostAllowList,
        options: &FetchOptions,
    ) -> Result<TransportResponse, FetchError> {
        let mut current = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        self.check_hop(&current, allowed)?;

        let deadline = Instant::now() + options.timeout;
        let mut method = options.method.clone();

        for hop in 0..=options.max_redirects {
            let request = TransportRequest {
                method: method.clone(),
                url: current.clone(),
                headers: options.headers.clone(),
            };

            let response = tokio::time::timeout_at(deadline, self.transport.send(request))
                .await
                .map_err(|_| FetchError::timeout(current.as_str(), options.timeout))??;

            if !response.is_redirect() {
                debug!(url = %current, status = response.status, hops = hop, "fetch complete");
                return Ok(response);
            }

            let location = response
                .header(LOCATION.as_str())
                .map(str::trim)
                .filter(|location| !location.is_empty())
                .ok_or_else(|| FetchError::missing_location(current.as_str(), response.status))?;
            let next = current
                .join(location)
                .map_err(|_| FetchError::invalid_url(location))?;
            self.check_hop(&next, allowed)?;

            debug!(from = %current, to = %next, status = response.status, hop, "following redirect");

            if response.status == 303 {
                method = Method::GET;
            }
            current = next;
        }

        Err(FetchError::too_many_redirects(url, options.max_redirects))
    }

    fn check_hop(&self, url: &Url, allowed: &dyn HostAllowList) -> Result<(), FetchError> {
        let scheme = url.scheme();
        let scheme_ok = scheme == "https" || (!self.require_https && scheme == "http");
        if !scheme_ok {
            return Err(FetchError::insecure_scheme(url.as_str(), scheme));
        }
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if host.is_empty() || !allowed.allows(&host) {
            return Err(FetchError::blocked_host(url.as_str(), host));
        }
        Ok(())
    }
}
