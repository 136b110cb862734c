//! Error types for the download module.
//!
//! A [`MediaError`] describes why one media item was dropped. It is logged and
//! counted, never propagated as a batch failure.

use thiserror::Error;

use crate::fetch::FetchError;

/// Why a single media download was dropped.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The guarded fetch failed (policy violation, timeout, network).
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The final response was not a success.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The media URL.
        url: String,
        /// The final HTTP status code.
        status: u16,
    },

    /// The response body was empty.
    #[error("empty response body from {url}")]
    EmptyBody {
        /// The media URL.
        url: String,
    },

    /// The server returned an HTML page instead of media.
    #[error("{url} returned {mime_type}, not media")]
    NotMedia {
        /// The media URL.
        url: String,
        /// The returned MIME type.
        mime_type: String,
    },

    /// Neither the MIME type, the URL, nor the caller's hint identified the kind.
    #[error("cannot determine media type of {url} (content-type '{mime_type}')")]
    Unclassified {
        /// The media URL.
        url: String,
        /// The returned MIME type (possibly empty).
        mime_type: String,
    },
}

impl MediaError {
    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an empty body error.
    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::EmptyBody { url: url.into() }
    }

    /// Creates a not-media error.
    pub fn not_media(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::NotMedia {
            url: url.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Creates an unclassified error.
    pub fn unclassified(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Unclassified {
            url: url.into(),
            mime_type: mime_type.into(),
        }
    }
}
