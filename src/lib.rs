//! Postgrab Core Library
//!
//! This library extracts the text and attached media (images, videos,
//! documents) from a single social-media post page, then downloads that
//! media through SSRF-safe fetches for re-delivery elsewhere.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Immutable limits, allow-lists, and timeouts
//! - [`policy`] - Post URL and media host allow-lists
//! - [`fetch`] - Guarded HTTP fetches with per-hop redirect validation, plus retry
//! - [`page`] - Post page acquisition and auth-wall detection
//! - [`extract`] - Extraction strategy chain and result merging
//! - [`download`] - Media classification and bounded-concurrency downloads
//! - [`media`] - Media kinds and CDN path patterns shared by extraction and download

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod media;
pub mod page;
pub mod policy;
#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, ExtractorConfig};
pub use download::{DownloadSummary, DownloadedMedia, MediaCandidate, MediaDownloader};
pub use extract::{
    ExtractError, ExtractionStrategy, PartialExtraction, PostExtractionResult, PostExtractor,
};
pub use fetch::{
    DEFAULT_MAX_RETRIES, FetchError, FetchOptions, GuardedFetcher, HttpTransport,
    ReqwestTransport, RetryDecision, RetryPolicy, TransportRequest, TransportResponse,
};
pub use media::MediaType;
pub use page::{PageAcquirer, PostPage};
pub use policy::{HostAllowList, HostSet, MediaHostPolicy, PostUrlPolicy};
