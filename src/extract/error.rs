//! Top-level extraction failures.
//!
//! Each variant is a distinct signal for the caller: the user-facing message
//! and the process exit code differ per case.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors returned by [`crate::PostExtractor::extract`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The post URL failed validation; no request was made.
    #[error("invalid post URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The post is behind a login wall or the platform blocked the request.
    #[error("post is private or protected ({url}, HTTP {status})")]
    PrivateOrProtected {
        /// The post URL.
        url: String,
        /// The status that signalled the block (200 for a detected login wall).
        status: u16,
    },

    /// The post page answered with another non-success status.
    #[error("failed to fetch post page {url}: HTTP {status}")]
    ScrapeFailed {
        /// The post URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The page fetch itself failed (policy violation, timeout, network).
    #[error("failed to fetch post page: {source}")]
    Fetch {
        /// The underlying fetch failure.
        #[from]
        source: FetchError,
    },

    /// No extraction strategy recovered any post text.
    #[error("no post text found at {url}")]
    TextNotFound {
        /// The post URL.
        url: String,
    },
}

impl ExtractError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a private-or-protected error.
    pub fn private_or_protected(url: impl Into<String>, status: u16) -> Self {
        Self::PrivateOrProtected {
            url: url.into(),
            status,
        }
    }

    /// Creates a scrape failure for a non-success page status.
    pub fn scrape_failed(url: impl Into<String>, status: u16) -> Self {
        Self::ScrapeFailed {
            url: url.into(),
            status,
        }
    }

    /// Creates a text-not-found error.
    pub fn text_not_found(url: impl Into<String>) -> Self {
        Self::TextNotFound { url: url.into() }
    }

    /// Returns true if retrying the whole extraction may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { source } => source.is_transient(),
            Self::ScrapeFailed { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            Self::InvalidUrl { .. } | Self::PrivateOrProtected { .. } | Self::TextNotFound { .. } => {
                false
            }
        }
    }

    /// Process exit code for the CLI.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidUrl { .. } => 2,
            Self::PrivateOrProtected { .. } => 3,
            Self::ScrapeFailed { .. } | Self::Fetch { .. } => 4,
            Self::TextNotFound { .. } => 5,
        }
    }

    /// Short message suitable for an end user.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "That doesn't look like a supported post link.",
            Self::PrivateOrProtected { .. } => {
                "This post is private or requires signing in, so it can't be read."
            }
            Self::ScrapeFailed { .. } | Self::Fetch { .. } => {
                "The post page could not be fetched. Try again later."
            }
            Self::TextNotFound { .. } => "No text could be found in this post.",
        }
    }
}
