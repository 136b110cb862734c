//! Error types for the fetch module.
//!
//! This module defines structured errors for guarded fetches, carrying the
//! URL (and host or status where relevant) of the hop that failed.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during a guarded fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed or resolved.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A hop used a scheme other than https.
    #[error("refusing {scheme}:// request to {url}: only https is allowed")]
    InsecureScheme {
        /// The refused URL.
        url: String,
        /// The refused scheme.
        scheme: String,
    },

    /// A hop targeted a host outside the allow-list.
    #[error("blocked request to host '{host}' ({url})")]
    BlockedHost {
        /// The refused URL.
        url: String,
        /// The host that failed the allow-list check.
        host: String,
    },

    /// A redirect response had no usable `Location` header.
    #[error("HTTP {status} redirect from {url} has no Location header")]
    MissingLocation {
        /// The URL that answered with a redirect.
        url: String,
        /// The redirect status code.
        status: u16,
    },

    /// The redirect hop budget was exhausted.
    #[error("too many redirects (max {max}) fetching {url}")]
    TooManyRedirects {
        /// The originally requested URL.
        url: String,
        /// The hop budget.
        max: usize,
    },

    /// The configured deadline elapsed before a complete response.
    #[error("timeout after {}ms fetching {url}", .timeout.as_millis())]
    Timeout {
        /// The URL in flight when the deadline passed.
        url: String,
        /// The configured deadline.
        timeout: Duration,
    },

    /// The response body exceeded the configured size cap.
    #[error("response body from {url} exceeds {limit} bytes")]
    BodyTooLarge {
        /// The URL whose body was too large.
        url: String,
        /// The size cap in bytes.
        limit: usize,
    },

    /// A follow-up fetch got a non-success status under every referer tried.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The last HTTP status code seen.
        status: u16,
    },

    /// Network-level error from reqwest (DNS, connection refused, TLS, ...).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Transport failure from a non-reqwest transport.
    #[error("transport error fetching {url}: {reason}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// Why the transport failed.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an insecure scheme error.
    pub fn insecure_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::InsecureScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    /// Creates a blocked host error.
    pub fn blocked_host(url: impl Into<String>, host: impl Into<String>) -> Self {
        Self::BlockedHost {
            url: url.into(),
            host: host.into(),
        }
    }

    /// Creates a missing Location error.
    pub fn missing_location(url: impl Into<String>, status: u16) -> Self {
        Self::MissingLocation {
            url: url.into(),
            status,
        }
    }

    /// Creates a too-many-redirects error.
    pub fn too_many_redirects(url: impl Into<String>, max: usize) -> Self {
        Self::TooManyRedirects {
            url: url.into(),
            max,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout,
        }
    }

    /// Creates a body-too-large error.
    pub fn body_too_large(url: impl Into<String>, limit: usize) -> Self {
        Self::BodyTooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for failures that may succeed on a later attempt.
    ///
    /// Policy violations (blocked host, insecure scheme, redirect budget) are
    /// never transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            Self::InvalidUrl { .. }
            | Self::InsecureScheme { .. }
            | Self::BlockedHost { .. }
            | Self::MissingLocation { .. }
            | Self::TooManyRedirects { .. }
            | Self::BodyTooLarge { .. }
            | Self::ClientBuild { .. } => false,
        }
    }

    /// Returns true if the fetch policy (not the network) refused the request.
    #[must_use]
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::InsecureScheme { .. }
                | Self::BlockedHost { .. }
                | Self::MissingLocation { .. }
                | Self::TooManyRedirects { .. }
        )
    }
}
