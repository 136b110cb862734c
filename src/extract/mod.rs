//! Extraction strategy chain.
//!
//! A post page is handed to a fixed, ordered list of [`ExtractionStrategy`]
//! objects. Each runs in two phases:
//!
//! 1. `collect` reads the parsed document synchronously and returns a partial
//!    result plus any follow-up URLs (manifests, embed frames).
//! 2. `resolve` performs the follow-up fetches, if any.
//!
//! The parsed [`scraper::Html`] is not `Send`, so all `collect` phases run
//! first and the document is dropped before any `.await`. A single reducer
//! then merges the partials into one [`PostExtractionResult`].

mod document;
mod dom;
mod embed;
mod error;
mod scan;
mod script;
mod structured;
pub mod text;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, REFERER};
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use document::NativeDocumentStrategy;
pub use dom::DomStrategy;
pub use embed::EmbedStrategy;
pub use error::ExtractError;
pub use script::ScriptStrategy;
pub use structured::StructuredDataStrategy;

use crate::config::ExtractorConfig;
use crate::download::MediaCandidate;
use crate::fetch::{
    FetchError, FetchOptions, GuardedFetcher, HttpTransport, ReqwestTransport, TransportResponse,
};
use crate::media::{self, MediaType};
use crate::page::{PageAcquirer, PostPage, compile_static_selector};
use crate::policy::HostAllowList;

static CANONICAL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"link[rel="canonical"][href]"#));
static OG_URL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"meta[property="og:url"][content]"#));
static OG_IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(
        r#"meta[property="og:image"][content], meta[property="og:image:secure_url"][content], meta[name="twitter:image"][content]"#,
    )
});

/// What one strategy found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialExtraction {
    /// Normalized, non-placeholder post text, if found.
    pub text: Option<String>,
    /// Image URLs.
    pub images: Vec<String>,
    /// Video URLs.
    pub videos: Vec<String>,
    /// Document URLs.
    pub documents: Vec<String>,
}

impl PartialExtraction {
    /// Appends `url` to the list for `kind`, skipping exact duplicates.
    pub fn push(&mut self, kind: MediaType, url: String) {
        let list = match kind {
            MediaType::Image => &mut self.images,
            MediaType::Video => &mut self.videos,
            MediaType::Document => &mut self.documents,
        };
        if !list.contains(&url) {
            list.push(url);
        }
    }

    /// Appends every URL of `other` (text is left untouched).
    pub fn absorb_media(&mut self, other: PartialExtraction) {
        for url in other.images {
            self.push(MediaType::Image, url);
        }
        for url in other.videos {
            self.push(MediaType::Video, url);
        }
        for url in other.documents {
            self.push(MediaType::Document, url);
        }
    }

    /// Total number of media URLs.
    #[must_use]
    pub fn media_count(&self) -> usize {
        self.images.len() + self.videos.len() + self.documents.len()
    }
}

/// A follow-up URL discovered during `collect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    /// URL to fetch.
    pub url: String,
    /// URLs to keep if resolving `url` yields nothing better.
    pub fallback: Vec<String>,
}

/// Output of a strategy's synchronous phase.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Findings that need no network access.
    pub partial: PartialExtraction,
    /// URLs to resolve in the async phase.
    pub follow_ups: Vec<FollowUp>,
}

impl From<PartialExtraction> for Collected {
    fn from(partial: PartialExtraction) -> Self {
        Self {
            partial,
            follow_ups: Vec::new(),
        }
    }
}

/// Per-extraction state shared by all strategies.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    config: Arc<ExtractorConfig>,
    fetcher: GuardedFetcher,
    page_url: Url,
    canonical_url: Url,
    referers: Vec<String>,
}

impl StrategyContext {
    /// Creates a context for a page at `page_url`.
    #[must_use]
    pub fn new(
        config: Arc<ExtractorConfig>,
        fetcher: GuardedFetcher,
        page_url: Url,
        canonical_url: Url,
        referers: Vec<String>,
    ) -> Self {
        Self {
            config,
            fetcher,
            page_url,
            canonical_url,
            referers,
        }
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// URL the page was fetched from (after redirects).
    #[must_use]
    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Canonical post URL used to pick between structured-data candidates.
    #[must_use]
    pub fn canonical_url(&self) -> &Url {
        &self.canonical_url
    }

    /// Referers tried, in order, for follow-up fetches.
    #[must_use]
    pub fn referers(&self) -> &[String] {
        &self.referers
    }

    /// Resolves `raw` against the page and checks scheme and media host.
    #[must_use]
    pub fn accept_media(&self, raw: &str) -> Option<String> {
        let decoded = media::decode_escaped_url(raw);
        if decoded.is_empty() || decoded.starts_with("data:") {
            return None;
        }
        let url = self.page_url.join(&decoded).ok()?;
        let scheme_ok = url.scheme() == "https" || (!self.config.require_https && url.scheme() == "http");
        if !scheme_ok {
            return None;
        }
        let host = url.host_str()?;
        self.config
            .media_policy
            .is_allowed_media_host(host)
            .then(|| url.to_string())
    }

    /// Like [`Self::accept_media`], and the path must match `kind`'s pattern.
    #[must_use]
    pub fn accept(&self, kind: MediaType, raw: &str) -> Option<String> {
        self.accept_media(raw)
            .filter(|url| media::matches_kind(kind, url))
    }

    /// Fetches `url`, trying each referer until one gets a 2xx response.
    ///
    /// Policy violations and timeouts stop the loop; other failures move on to
    /// the next referer.
    ///
    /// # Errors
    ///
    /// Returns the stopping error, or the last failure seen
    /// ([`FetchError::HttpStatus`] for a non-success response).
    pub async fn fetch_with_referers(
        &self,
        url: &str,
        accept: &str,
        allowed: &dyn HostAllowList,
    ) -> Result<TransportResponse, FetchError> {
        let mut last_error = FetchError::http_status(url, 0);
        for referer in &self.referers {
            let options = FetchOptions::new(self.config.fetch_timeout)
                .with_max_redirects(self.config.max_redirects)
                .with_header(ACCEPT, accept)
                .with_header(REFERER, referer);
            match self.fetcher.fetch(url, allowed, &options).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => {
                    debug!(url, referer = %referer, status = response.status, "follow-up refused, trying next referer");
                    last_error = FetchError::http_status(url, response.status);
                }
                Err(error)
                    if error.is_policy_violation() || matches!(error, FetchError::Timeout { .. }) =>
                {
                    return Err(error);
                }
                Err(error) => {
                    debug!(url, referer = %referer, error = %error, "follow-up failed, trying next referer");
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }
}

/// One self-contained extraction technique.
///
/// # Object Safety
///
/// Uses `async_trait` so the extractor can hold `Vec<Box<dyn ExtractionStrategy>>`.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Reads the parsed page without network access.
    fn collect(&self, document: &Html, ctx: &StrategyContext) -> Collected;

    /// Resolves follow-ups. Failures must be logged and absorbed here.
    async fn resolve(&self, collected: Collected, _ctx: &StrategyContext) -> PartialExtraction {
        collected.partial
    }
}

/// The default strategy chain, in text-preference order.
#[must_use]
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(StructuredDataStrategy),
        Box::new(DomStrategy),
        Box::new(ScriptStrategy),
        Box::new(NativeDocumentStrategy),
        Box::new(EmbedStrategy),
    ]
}

/// Final, merged extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostExtractionResult {
    /// Non-empty normalized post text.
    pub text: String,
    /// Unique image URLs, capped.
    pub image_urls: Vec<String>,
    /// Unique video URLs, capped.
    pub video_urls: Vec<String>,
    /// Unique document URLs, capped.
    pub document_urls: Vec<String>,
    /// Origin to send as `Referer` when downloading the media.
    pub preferred_referer: String,
}

impl PostExtractionResult {
    /// Total number of media URLs across all kinds.
    #[must_use]
    pub fn media_count(&self) -> usize {
        self.image_urls.len() + self.video_urls.len() + self.document_urls.len()
    }

    /// Download request list: images, then videos, then documents.
    #[must_use]
    pub fn media_candidates(&self) -> Vec<MediaCandidate> {
        let images = self
            .image_urls
            .iter()
            .map(|url| MediaCandidate::new(url, MediaType::Image));
        let videos = self
            .video_urls
            .iter()
            .map(|url| MediaCandidate::new(url, MediaType::Video));
        let documents = self
            .document_urls
            .iter()
            .map(|url| MediaCandidate::new(url, MediaType::Document));
        images.chain(videos).chain(documents).collect()
    }
}

/// Runs the strategy chain against post URLs.
pub struct PostExtractor {
    config: Arc<ExtractorConfig>,
    fetcher: GuardedFetcher,
    acquirer: PageAcquirer,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl std::fmt::Debug for PostExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("PostExtractor")
            .field("strategies", &names)
            .finish_non_exhaustive()
    }
}

impl PostExtractor {
    /// Creates an extractor using the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: ExtractorConfig) -> Result<Self, FetchError> {
        let transport = Arc::new(ReqwestTransport::new(config.max_body_bytes)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Creates an extractor over an arbitrary transport.
    #[must_use]
    pub fn with_transport(config: ExtractorConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let fetcher = GuardedFetcher::with_scheme_policy(transport, config.require_https);
        let config = Arc::new(config);
        Self {
            acquirer: PageAcquirer::new(fetcher.clone(), Arc::clone(&config)),
            config,
            fetcher,
            strategies: default_strategies(),
        }
    }

    /// Replaces the strategy chain.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<ExtractorConfig> {
        &self.config
    }

    /// The guarded fetcher, for building a downloader on the same transport.
    #[must_use]
    pub fn fetcher(&self) -> &GuardedFetcher {
        &self.fetcher
    }

    /// Extracts text and media from the post at `url`.
    ///
    /// # Errors
    ///
    /// See [`ExtractError`]; per-strategy and per-follow-up failures are
    /// logged and never surface here.
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str) -> Result<PostExtractionResult, ExtractError> {
        let page = self.acquirer.acquire(url).await?;
        let preferred_referer = page.origin();

        let (ctx, collected, og_images) = self.collect_all(&page);

        let mut partials = Vec::with_capacity(collected.len());
        for (strategy, collected) in self.strategies.iter().zip(collected) {
            let partial = strategy.resolve(collected, &ctx).await;
            debug!(
                strategy = strategy.name(),
                has_text = partial.text.is_some(),
                images = partial.images.len(),
                videos = partial.videos.len(),
                documents = partial.documents.len(),
                "strategy finished"
            );
            partials.push(partial);
        }

        let merged = merge_partials(partials, &og_images, self.config.max_media_urls);
        let Some(text) = merged.text else {
            warn!("no strategy recovered post text");
            return Err(ExtractError::text_not_found(url));
        };

        let result = PostExtractionResult {
            text,
            image_urls: merged.images,
            video_urls: merged.videos,
            document_urls: merged.documents,
            preferred_referer,
        };
        info!(
            images = result.image_urls.len(),
            videos = result.video_urls.len(),
            documents = result.document_urls.len(),
            "post extracted"
        );
        Ok(result)
    }

    /// [`Self::extract`] wrapped in the configured retry policy.
    ///
    /// Only transient failures (timeouts, network errors, 408/429/5xx) are
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns the final attempt's error.
    pub async fn extract_with_retry(&self, url: &str) -> Result<PostExtractionResult, ExtractError> {
        self.config
            .retry
            .run_if(
                || self.extract(url),
                ExtractError::is_transient,
                |error, attempt| warn!(attempt, error = %error, "extraction attempt failed, retrying"),
            )
            .await
    }

    /// Parses the page and runs every `collect` phase.
    ///
    /// Kept synchronous so the non-`Send` document never lives across an await.
    fn collect_all(&self, page: &PostPage) -> (StrategyContext, Vec<Collected>, Vec<String>) {
        let document = page.document();
        let canonical_url = canonical_url(&document, &page.url);
        let referers = media::referer_candidates(
            [Some(page.origin().as_str())],
            &self.config.default_referers,
        );
        let ctx = StrategyContext::new(
            Arc::clone(&self.config),
            self.fetcher.clone(),
            page.url.clone(),
            canonical_url,
            referers,
        );

        let collected = self
            .strategies
            .iter()
            .map(|strategy| strategy.collect(&document, &ctx))
            .collect();
        let og_images = document
            .select(&OG_IMAGE_SELECTOR)
            .filter_map(|element| element.value().attr("content"))
            .filter_map(|raw| ctx.accept(MediaType::Image, raw))
            .collect();
        (ctx, collected, og_images)
    }
}

/// Canonical post URL: `<link rel=canonical>`, then `og:url`, then the fetched URL.
fn canonical_url(document: &Html, page_url: &Url) -> Url {
    let from_link = document
        .select(&CANONICAL_SELECTOR)
        .filter_map(|element| element.value().attr("href"));
    let from_og = document
        .select(&OG_URL_SELECTOR)
        .filter_map(|element| element.value().attr("content"));
    from_link
        .chain(from_og)
        .find_map(|raw| page_url.join(raw.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Merges partials in strategy order.
///
/// Text is the first strategy's text; media lists are unioned, de-duplicated
/// by exact URL, and capped. With no media at all, `og_images` are used.
fn merge_partials(
    partials: Vec<PartialExtraction>,
    og_images: &[String],
    max_media_urls: usize,
) -> PartialExtraction {
    let mut merged = PartialExtraction::default();
    for partial in partials {
        if merged.text.is_none() {
            merged.text.clone_from(&partial.text);
        }
        merged.absorb_media(partial);
    }

    if merged.media_count() == 0 {
        for url in og_images {
            merged.push(MediaType::Image, url.clone());
        }
    }

    merged.images.truncate(max_media_urls);
    merged.videos.truncate(max_media_urls);
    merged.documents.truncate(max_media_urls);
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::logs::CapturedLogs;
    use crate::test_support::stub_transport::{StubResponse, StubTransport};

    const POST_URL: &str = "https://www.linkedin.com/posts/jane_hello-activity-7100";
    const IMAGE_URL: &str = "https://media.licdn.com/dms/image/v2/D4E22AQ/feedshare-shrink_800/0/1700";

    fn extractor(stub: &Arc<StubTransport>) -> PostExtractor {
        PostExtractor::with_transport(ExtractorConfig::default(), stub.clone())
    }

    fn page(head: &str, body: &str) -> String {
        format!("<html><head><title>Jane Doe on LinkedIn</title>{head}</head><body>{body}</body></html>")
    }

    fn partial(text: Option<&str>, images: &[&str]) -> PartialExtraction {
        PartialExtraction {
            text: text.map(str::to_string),
            images: images.iter().map(|s| (*s).to_string()).collect(),
            ..PartialExtraction::default()
        }
    }

    #[tokio::test]
    async fn test_json_ld_post_with_one_image() {
        let stub = Arc::new(StubTransport::new());
        let json_ld = format!(
            r#"<script type="application/ld+json">{{"@context":"https://schema.org","@type":"SocialMediaPosting","@id":"{POST_URL}","articleBody":"Hello","image":{{"@type":"ImageObject","url":"{IMAGE_URL}"}}}}</script>"#
        );
        stub.route(POST_URL, StubResponse::html(&page(&json_ld, "")));

        let result = extractor(&stub).extract(POST_URL).await.unwrap();

        assert_eq!(result.text, "Hello");
        assert_eq!(result.image_urls, vec![IMAGE_URL.to_string()]);
        assert!(result.video_urls.is_empty());
        assert!(result.document_urls.is_empty());
        assert_eq!(result.preferred_referer, "https://www.linkedin.com/");
    }

    #[tokio::test]
    async fn test_unauthorized_post_is_private() {
        let stub = Arc::new(StubTransport::new());
        stub.route(POST_URL, StubResponse::status(401));

        let result = extractor(&stub).extract(POST_URL).await;
        assert!(matches!(result, Err(ExtractError::PrivateOrProtected { .. })), "got {result:?}");
    }

    #[tokio::test]
    async fn test_structured_text_preferred_over_dom_text() {
        let stub = Arc::new(StubTransport::new());
        let json_ld = r#"<script type="application/ld+json">{"@type":"SocialMediaPosting","articleBody":"From structured data"}</script>"#;
        let body = r#"<div class="update-components-text">From the DOM</div>"#;
        stub.route(POST_URL, StubResponse::html(&page(json_ld, body)));

        let result = extractor(&stub).extract(POST_URL).await.unwrap();
        assert_eq!(result.text, "From structured data");
    }

    #[tokio::test]
    async fn test_placeholder_structured_text_falls_through_to_dom() {
        let stub = Arc::new(StubTransport::new());
        let json_ld = r#"<script type="application/ld+json">{"@type":"SocialMediaPosting","articleBody":"Sign in"}</script>"#;
        let body = r#"<div class="update-components-text">Real commentary</div>"#;
        stub.route(POST_URL, StubResponse::html(&page(json_ld, body)));

        let result = extractor(&stub).extract(POST_URL).await.unwrap();
        assert_eq!(result.text, "Real commentary");
    }

    #[tokio::test]
    async fn test_falls_back_to_og_description() {
        let stub = Arc::new(StubTransport::new());
        let head = r#"<meta property="og:description" content="OG text">"#;
        stub.route(POST_URL, StubResponse::html(&page(head, "")));

        let result = extractor(&stub).extract(POST_URL).await.unwrap();
        assert_eq!(result.text, "OG text");
    }

    #[tokio::test]
    async fn test_text_not_found_when_only_placeholders() {
        let stub = Arc::new(StubTransport::new());
        let head = r#"<meta property="og:description" content="LinkedIn">"#;
        let body = r#"<div class="update-components-text">  </div>"#;
        stub.route(POST_URL, StubResponse::html(&page(head, body)));

        let result = extractor(&stub).extract(POST_URL).await;
        assert!(matches!(result, Err(ExtractError::TextNotFound { .. })), "got {result:?}");
    }

    #[tokio::test]
    async fn test_og_image_fallback_only_without_other_media() {
        let stub = Arc::new(StubTransport::new());
        let head = format!(
            r#"<meta property="og:description" content="Text"><meta property="og:image" content="{IMAGE_URL}"><meta property="og:image" content="https://media.licdn.com/static/logo.svg">"#
        );
        stub.route(POST_URL, StubResponse::html(&page(&head, "")));

        let result = extractor(&stub).extract(POST_URL).await.unwrap();
        assert_eq!(result.image_urls, vec![IMAGE_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_manifest_timeout_keeps_rest_of_extraction() {
        let stub = Arc::new(StubTransport::new());
        let manifest = "https://media.licdn.com/dms/document/manifest/slow";
        let config_attr = html_escape::encode_double_quoted_attribute(&format!(
            r#"{{"doc":{{"manifestUrl":"{manifest}","coverPages":[]}}}}"#
        ))
        .into_owned();
        let body = format!(
            r#"<div class="update-components-text">Deck post</div><div data-native-document-config="{config_attr}"></div><img class="update-components-image__image" src="{IMAGE_URL}">"#
        );
        stub.route(POST_URL, StubResponse::html(&page("", &body)));
        stub.route(
            manifest,
            StubResponse::json("{}").with_delay(Duration::from_secs(5)),
        );

        let config = ExtractorConfig {
            fetch_timeout: Duration::from_millis(100),
            ..ExtractorConfig::default()
        };
        let extractor = PostExtractor::with_transport(config, stub.clone());

        let logs = CapturedLogs::new();
        let result = {
            let _guard = logs.install();
            extractor.extract(POST_URL).await
        };
        let result = result.unwrap();

        assert_eq!(result.text, "Deck post");
        assert_eq!(result.image_urls, vec![IMAGE_URL.to_string()]);
        assert!(result.document_urls.is_empty());
        assert!(logs.contains("manifest"), "expected a manifest log entry:\n{}", logs.contents());
        assert!(logs.contains("timeout"), "expected a timeout log entry:\n{}", logs.contents());
    }

    #[test]
    fn test_merge_dedups_and_caps() {
        let urls: Vec<String> = (0..50)
            .map(|i| format!("https://media.licdn.com/dms/image/{i}"))
            .collect();
        let first: Vec<&str> = urls.iter().map(String::as_str).collect();
        let partials = vec![
            partial(None, &first[..30]),
            partial(Some("text"), &first[20..]),
            partial(Some("later"), &first[..5]),
        ];

        let merged = merge_partials(partials, &[], 40);
        assert_eq!(merged.text.as_deref(), Some("text"));
        assert_eq!(merged.images.len(), 40);
        let mut unique = merged.images.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), merged.images.len());
    }

    #[test]
    fn test_merge_og_fallback_skipped_when_media_present() {
        let partials = vec![partial(Some("t"), &["https://media.licdn.com/dms/image/a"])];
        let merged = merge_partials(partials, &["https://media.licdn.com/dms/image/og".to_string()], 40);
        assert_eq!(merged.images, vec!["https://media.licdn.com/dms/image/a".to_string()]);
    }

    #[test]
    fn test_canonical_url_preference() {
        let page_url = Url::parse(POST_URL).unwrap();
        let doc = Html::parse_document(
            r#"<head><meta property="og:url" content="https://www.linkedin.com/posts/og"><link rel="canonical" href="/posts/canonical"></head>"#,
        );
        assert_eq!(canonical_url(&doc, &page_url).path(), "/posts/canonical");

        let doc = Html::parse_document(
            r#"<head><meta property="og:url" content="https://www.linkedin.com/posts/og"></head>"#,
        );
        assert_eq!(canonical_url(&doc, &page_url).path(), "/posts/og");

        let doc = Html::parse_document("<head></head>");
        assert_eq!(canonical_url(&doc, &page_url), page_url);
    }

    #[test]
    fn test_media_candidates_order() {
        let result = PostExtractionResult {
            text: "t".to_string(),
            image_urls: vec!["https://media.licdn.com/dms/image/a".to_string()],
            video_urls: vec!["https://dms.licdn.com/playlist/vid/b".to_string()],
            document_urls: vec!["https://media.licdn.com/dms/document/c".to_string()],
            preferred_referer: "https://www.linkedin.com/".to_string(),
        };
        let candidates = result.media_candidates();
        let kinds: Vec<MediaType> = candidates.iter().map(|c| c.requested_type).collect();
        assert_eq!(kinds, vec![MediaType::Image, MediaType::Video, MediaType::Document]);
        assert_eq!(result.media_count(), 3);
    }

    #[test]
    fn test_accept_filters_host_scheme_and_pattern() {
        let ctx = StrategyContext::new(
            Arc::new(ExtractorConfig::default()),
            GuardedFetcher::new(Arc::new(StubTransport::new())),
            Url::parse(POST_URL).unwrap(),
            Url::parse(POST_URL).unwrap(),
            Vec::new(),
        );
        assert_eq!(ctx.accept(MediaType::Image, IMAGE_URL).as_deref(), Some(IMAGE_URL));
        assert!(ctx.accept(MediaType::Image, "https://evil.net/dms/image/a").is_none());
        assert!(ctx.accept(MediaType::Image, "http://media.licdn.com/dms/image/a").is_none());
        assert!(ctx.accept(MediaType::Video, IMAGE_URL).is_none());
        assert!(ctx.accept(MediaType::Image, "data:image/png;base64,AAAA").is_none());
        assert_eq!(
            ctx.accept(MediaType::Image, r"https:\/\/media.licdn.com\/dms\/image\/x").as_deref(),
            Some("https://media.licdn.com/dms/image/x")
        );
    }
}
