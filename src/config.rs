//! Immutable extraction and download configuration.
//!
//! One [`ExtractorConfig`] is built at startup and shared (via `Arc`) by every
//! component. Nothing mutates it afterwards; tests substitute smaller limits
//! with struct-update syntax.

use std::time::Duration;

use thiserror::Error;

use crate::fetch::RetryPolicy;
use crate::policy::{MediaHostPolicy, PostUrlPolicy};

/// Post platform host.
pub const DEFAULT_POST_HOST: &str = "www.linkedin.com";

/// Path prefixes a post URL may start with.
pub const DEFAULT_POST_PATH_PREFIXES: &[&str] = &["/posts/", "/feed/update/", "/embed/feed/update/"];

/// Media CDN hostname suffix.
pub const DEFAULT_MEDIA_HOST_SUFFIX: &str = "licdn.com";

/// Referer origins tried after the post's own origin.
pub const DEFAULT_REFERERS: &[&str] = &["https://www.linkedin.com/", "https://www.linkedin.com/feed/"];

/// Timeout for page, manifest, and embed fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(12);

/// Timeout for media downloads.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Cap on each extracted media list.
pub const DEFAULT_MAX_MEDIA_URLS: usize = 40;

/// Cap on media items downloaded per request.
pub const DEFAULT_MAX_DOWNLOADS: usize = 10;

/// Concurrent media downloads.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 3;

/// Concurrent manifest/embed follow-up fetches.
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 2;

/// Manifest fetches per post.
pub const DEFAULT_MAX_MANIFEST_FETCHES: usize = 4;

/// Embed-frame fetches per post.
pub const DEFAULT_MAX_EMBED_FETCHES: usize = 3;

/// Bytes of a single inline script body scanned by regex.
pub const DEFAULT_MAX_SCRIPT_BYTES: usize = 250_000;

/// Smallest width/height (px) accepted for a content image without a strong class signal.
pub const DEFAULT_MIN_IMAGE_DIMENSION: u32 = 100;

/// Largest response body read into memory (50 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Errors from validating an [`ExtractorConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A limit that must be at least one was zero.
    #[error("invalid config value for `{field}`: must be at least 1")]
    ZeroLimit {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A timeout was zero.
    #[error("invalid config value for `{field}`: timeout must be non-zero")]
    ZeroTimeout {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A default referer is not an absolute https URL.
    #[error("invalid default referer '{referer}': must be an absolute https URL")]
    InvalidReferer {
        /// The rejected referer value.
        referer: String,
    },
}

/// Process-wide extraction and download settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Which post URLs may be fetched.
    pub post_policy: PostUrlPolicy,
    /// Which hosts may serve media, manifests, and documents.
    pub media_policy: MediaHostPolicy,
    /// Referers tried, in order, after the post's own origin.
    pub default_referers: Vec<String>,
    /// Refuse any hop whose scheme is not https.
    pub require_https: bool,
    /// Timeout for page, manifest, and embed fetches.
    pub fetch_timeout: Duration,
    /// Timeout for a media download.
    pub download_timeout: Duration,
    /// Redirect hop budget per guarded fetch.
    pub max_redirects: usize,
    /// Cap on each merged media list.
    pub max_media_urls: usize,
    /// Cap on media items per download request.
    pub max_downloads: usize,
    /// Concurrent media downloads.
    pub download_concurrency: usize,
    /// Concurrent manifest/embed fetches.
    pub resolve_concurrency: usize,
    /// Manifest fetches per post.
    pub max_manifest_fetches: usize,
    /// Embed-frame fetches per post.
    pub max_embed_fetches: usize,
    /// Bytes of one inline script scanned by regex.
    pub max_script_bytes: usize,
    /// Minimum content image dimension in pixels.
    pub min_image_dimension: u32,
    /// Largest response body accepted.
    pub max_body_bytes: usize,
    /// Retry policy for the top-level extraction.
    pub retry: RetryPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            post_policy: PostUrlPolicy::default(),
            media_policy: MediaHostPolicy::default(),
            default_referers: DEFAULT_REFERERS.iter().map(|r| (*r).to_string()).collect(),
            require_https: true,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_media_urls: DEFAULT_MAX_MEDIA_URLS,
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            max_manifest_fetches: DEFAULT_MAX_MANIFEST_FETCHES,
            max_embed_fetches: DEFAULT_MAX_EMBED_FETCHES,
            max_script_bytes: DEFAULT_MAX_SCRIPT_BYTES,
            min_image_dimension: DEFAULT_MIN_IMAGE_DIMENSION,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExtractorConfig {
    /// Checks limits and referers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for zero limits, zero timeouts, or a default
    /// referer that is not an absolute https URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_media_urls", self.max_media_urls),
            ("max_downloads", self.max_downloads),
            ("download_concurrency", self.download_concurrency),
            ("resolve_concurrency", self.resolve_concurrency),
            ("max_script_bytes", self.max_script_bytes),
            ("max_body_bytes", self.max_body_bytes),
        ];
        if let Some((field, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroLimit { field: *field });
        }

        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { field: "fetch_timeout" });
        }
        if self.download_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { field: "download_timeout" });
        }

        if let Some(referer) = self.default_referers.iter().find(|referer| {
            url::Url::parse(referer)
                .map(|parsed| parsed.scheme() != "https" || parsed.host_str().is_none())
                .unwrap_or(true)
        }) {
            return Err(ConfigError::InvalidReferer {
                referer: referer.clone(),
            });
        }

        Ok(())
    }
}
