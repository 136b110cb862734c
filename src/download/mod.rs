//! Media download engine with content-type classification.
//!
//! This module downloads resolved media URLs through the guarded fetcher and
//! decides what each item really is from the response, not from the URL.
//!
//! # Features
//!
//! - Bounded concurrency (semaphore permits, one task per item)
//! - Referer fallback on 401/403 responses
//! - MIME-first classification with URL-pattern and caller-hint fallbacks
//! - Per-kind numbered filenames (`image-01.jpg`, `video-01.mp4`, ...)
//! - Per-item failures are logged and dropped, never fatal to the batch
//!
//! # Example
//!
//! ```no_run
//! use postgrab_core::{MediaDownloader, PostExtractor, ExtractorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = PostExtractor::new(ExtractorConfig::default())?;
//! let result = extractor.extract("https://www.linkedin.com/posts/jane_hello-activity-1").await?;
//!
//! let downloader = MediaDownloader::from_extractor(&extractor);
//! let media = downloader
//!     .download(&result.media_candidates(), Some(result.preferred_referer.as_str()))
//!     .await;
//! for item in &media {
//!     println!("{} ({} bytes)", item.filename, item.buffer.len());
//! }
//! # Ok(())
//! # }
//! ```

mod classify;
mod engine;
mod error;
mod filename;

use std::sync::Arc;

use serde::Serialize;

pub use classify::classify;
pub use engine::MediaDownloader;
pub use error::MediaError;
pub use filename::media_filename;

use crate::extract::PostExtractor;
use crate::media::MediaType;

/// One URL the caller wants downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaCandidate {
    /// Absolute media URL.
    pub url: String,
    /// Declared kind; only consulted when the response is inconclusive.
    pub requested_type: MediaType,
    /// Referer to try before the batch-wide ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

impl MediaCandidate {
    #[must_use]
    pub fn new(url: impl Into<String>, requested_type: MediaType) -> Self {
        Self {
            url: url.into(),
            requested_type,
            referer: None,
        }
    }

    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// A successfully downloaded and classified media item.
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    /// The URL that was requested.
    pub url: String,
    /// Full response body.
    pub buffer: Vec<u8>,
    /// Kind determined from the response.
    pub media_type: MediaType,
    /// Lowercased MIME type without parameters (may be empty).
    pub mime_type: String,
    /// Output filename, e.g. `image-01.jpg`.
    pub filename: String,
}

/// Per-kind counts of a download batch.
///
/// Delivery code uses these to pick single, grouped, or archived delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub images: usize,
    pub videos: usize,
    pub documents: usize,
    pub total_bytes: u64,
}

impl DownloadSummary {
    #[must_use]
    pub fn from_media(media: &[DownloadedMedia]) -> Self {
        media.iter().fold(Self::default(), |mut summary, item| {
            match item.media_type {
                MediaType::Image => summary.images += 1,
                MediaType::Video => summary.videos += 1,
                MediaType::Document => summary.documents += 1,
            }
            summary.total_bytes += item.buffer.len() as u64;
            summary
        })
    }

    /// Total number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.images + self.videos + self.documents
    }
}

impl MediaDownloader {
    /// Builds a downloader sharing the extractor's fetcher and configuration.
    #[must_use]
    pub fn from_extractor(extractor: &PostExtractor) -> Self {
        Self::new(extractor.fetcher().clone(), Arc::clone(extractor.config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(media_type: MediaType, size: usize) -> DownloadedMedia {
        DownloadedMedia {
            url: "https://media.licdn.com/x".to_string(),
            buffer: vec![0; size],
            media_type,
            mime_type: String::new(),
            filename: String::new(),
        }
    }

    #[test]
    fn test_summary_counts_per_kind() {
        let media = vec![
            item(MediaType::Image, 10),
            item(MediaType::Image, 5),
            item(MediaType::Document, 100),
        ];
        let summary = DownloadSummary::from_media(&media);
        assert_eq!(summary.images, 2);
        assert_eq!(summary.videos, 0);
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.total_bytes, 115);
        assert_eq!(summary.count(), 3);
    }

    #[test]
    fn test_candidate_serializes_without_empty_referer() {
        let candidate = MediaCandidate::new("https://media.licdn.com/a.jpg", MediaType::Image);
        let json = serde_json::to_string(&candidate).unwrap_or_default();
        assert_eq!(json, r#"{"url":"https://media.licdn.com/a.jpg","requested_type":"image"}"#);
    }
}
