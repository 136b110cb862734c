//! Native document viewer strategy.
//!
//! Elements carrying `data-native-document-config` embed a JSON payload with
//! cover-page thumbnails and a manifest URL. The manifest resolves to a
//! transcript/download URL, or to an image manifest listing every page. When
//! real pages are found they replace the covers, which are low-resolution
//! duplicates of the first pages.

use std::sync::LazyLock;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Collected, ExtractionStrategy, FollowUp, PartialExtraction, StrategyContext};
use crate::fetch::FetchError;
use crate::media::MediaType;
use crate::page::compile_static_selector;
use crate::user_agent::JSON_ACCEPT;

static CONFIG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("[data-native-document-config]"));

const MANIFEST_KEYS: &[&str] = &["manifestUrl", "manifest_url"];
const DIRECT_DOCUMENT_KEYS: &[&str] = &["transcribedDocumentUrl", "downloadUrl", "pdfUrl"];
const COVER_KEY_MARKER: &str = "cover";
const MAX_NODES: usize = 5_000;

/// Resolves native document viewers through their manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDocumentStrategy;

#[async_trait]
impl ExtractionStrategy for NativeDocumentStrategy {
    fn name(&self) -> &'static str {
        "native-document"
    }

    fn collect(&self, document: &Html, ctx: &StrategyContext) -> Collected {
        let mut collected = Collected::default();
        for element in document.select(&CONFIG_SELECTOR) {
            let Some(raw) = element.value().attr("data-native-document-config") else {
                continue;
            };
            let Some(payload) = parse_payload(raw) else {
                debug!("skipping unparseable document config");
                continue;
            };
            let viewer = ViewerConfig::from_payload(&payload, ctx);

            for url in viewer.direct {
                collected.partial.push(MediaType::Document, url);
            }
            match viewer.manifest {
                Some(manifest) => collected.follow_ups.push(FollowUp {
                    url: manifest,
                    fallback: viewer.covers,
                }),
                None => {
                    for url in viewer.covers {
                        collected.partial.push(MediaType::Document, url);
                    }
                }
            }
        }
        collected
    }

    async fn resolve(&self, collected: Collected, ctx: &StrategyContext) -> PartialExtraction {
        let Collected {
            mut partial,
            mut follow_ups,
        } = collected;

        let limit = ctx.config().max_manifest_fetches;
        if follow_ups.len() > limit {
            debug!(found = follow_ups.len(), limit, "capping manifest fetches");
            for skipped in follow_ups.split_off(limit) {
                for url in skipped.fallback {
                    partial.push(MediaType::Document, url);
                }
            }
        }

        let resolved: Vec<Vec<String>> = stream::iter(follow_ups)
            .map(|follow_up| resolve_follow_up(follow_up, ctx))
            .buffer_unordered(ctx.config().resolve_concurrency.max(1))
            .collect()
            .await;

        for url in resolved.into_iter().flatten() {
            partial.push(MediaType::Document, url);
        }
        partial
    }
}

/// URLs found in one viewer payload.
#[derive(Debug, Default)]
struct ViewerConfig {
    manifest: Option<String>,
    covers: Vec<String>,
    direct: Vec<String>,
}

impl ViewerConfig {
    fn from_payload(payload: &Value, ctx: &StrategyContext) -> Self {
        let mut config = Self::default();
        walk_objects(payload, |key, value| {
            if MANIFEST_KEYS.contains(&key) {
                if config.manifest.is_none() {
                    config.manifest = value.as_str().and_then(|raw| ctx.accept_media(raw));
                }
            } else if DIRECT_DOCUMENT_KEYS.contains(&key) {
                if let Some(url) = value.as_str().and_then(|raw| ctx.accept_media(raw)) {
                    push_unique(&mut config.direct, url);
                }
            } else if key.to_ascii_lowercase().contains(COVER_KEY_MARKER) {
                for raw in string_urls(value) {
                    if let Some(url) = ctx.accept_media(&raw) {
                        push_unique(&mut config.covers, url);
                    }
                }
            }
        });
        config
    }
}

/// Fetches one manifest; on failure logs and falls back to the covers.
async fn resolve_follow_up(follow_up: FollowUp, ctx: &StrategyContext) -> Vec<String> {
    match resolve_manifest(&follow_up.url, ctx).await {
        Ok(resolved) => {
            let mut documents = resolved.direct;
            if resolved.pages.is_empty() {
                documents.extend(follow_up.fallback);
            } else {
                debug!(url = %follow_up.url, pages = resolved.pages.len(), "manifest pages replace covers");
                documents.extend(resolved.pages);
            }
            documents
        }
        Err(error) => {
            warn!(url = %follow_up.url, error = %error, "document manifest fetch failed");
            follow_up.fallback
        }
    }
}

#[derive(Debug, Default)]
struct ResolvedManifest {
    direct: Vec<String>,
    pages: Vec<String>,
}

async fn resolve_manifest(url: &str, ctx: &StrategyContext) -> Result<ResolvedManifest, FetchError> {
    let media_policy = &ctx.config().media_policy;
    let response = ctx.fetch_with_referers(url, JSON_ACCEPT, media_policy).await?;
    let manifest = parse_payload(&response.text()).unwrap_or(Value::Null);

    let mut resolved = ResolvedManifest::default();
    for key in DIRECT_DOCUMENT_KEYS {
        if let Some(url) = manifest.get(*key).and_then(Value::as_str).and_then(|raw| ctx.accept_media(raw)) {
            push_unique(&mut resolved.direct, url);
        }
    }

    resolved.pages = page_urls(&manifest, ctx);
    if resolved.pages.is_empty()
        && let Some(image_manifest) = best_image_manifest(&manifest, ctx)
    {
        match ctx.fetch_with_referers(&image_manifest, JSON_ACCEPT, media_policy).await {
            Ok(response) => {
                let pages = parse_payload(&response.text()).unwrap_or(Value::Null);
                resolved.pages = page_urls(&pages, ctx);
            }
            Err(error) => {
                warn!(url = %image_manifest, error = %error, "image manifest fetch failed");
            }
        }
    }
    Ok(resolved)
}

/// The `imageManifestUrl` of the widest resolution, or a top-level one.
fn best_image_manifest(manifest: &Value, ctx: &StrategyContext) -> Option<String> {
    let widest = manifest
        .get("perResolutions")
        .and_then(Value::as_array)
        .and_then(|resolutions| {
            resolutions
                .iter()
                .filter(|resolution| resolution.get("imageManifestUrl").is_some())
                .max_by_key(|resolution| resolution.get("width").and_then(Value::as_u64).unwrap_or(0))
        })
        .and_then(|resolution| resolution.get("imageManifestUrl"))
        .or_else(|| manifest.get("imageManifestUrl"));
    widest.and_then(Value::as_str).and_then(|raw| ctx.accept_media(raw))
}

fn page_urls(manifest: &Value, ctx: &StrategyContext) -> Vec<String> {
    let mut pages = Vec::new();
    if let Some(value) = manifest.get("pages") {
        for raw in string_urls(value) {
            if let Some(url) = ctx.accept_media(&raw) {
                push_unique(&mut pages, url);
            }
        }
    }
    pages
}

/// Parses a payload that may be HTML-entity encoded.
fn parse_payload(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    serde_json::from_str(raw).ok().or_else(|| {
        let decoded = html_escape::decode_html_entities(raw);
        serde_json::from_str(&decoded).ok()
    })
}

/// Visits every `(key, value)` pair of every object in `root`, breadth-first.
fn walk_objects<'a>(root: &'a Value, mut visit: impl FnMut(&str, &'a Value)) {
    let mut queue = std::collections::VecDeque::from([root]);
    let mut visited = 0;
    while let Some(node) = queue.pop_front() {
        visited += 1;
        if visited > MAX_NODES {
            break;
        }
        match node {
            Value::Object(object) => {
                for (key, value) in object {
                    visit(key.as_str(), value);
                    queue.push_back(value);
                }
            }
            Value::Array(items) => queue.extend(items),
            _ => {}
        }
    }
}

/// Strings directly in `value`, in arrays, or in `url`/`src` fields of objects.
fn string_urls(value: &Value) -> Vec<String> {
    match value {
        Value::String(url) => vec![url.clone()],
        Value::Array(items) => items.iter().flat_map(string_urls).collect(),
        Value::Object(object) => ["url", "src", "imageUrl"]
            .iter()
            .filter_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn push_unique(list: &mut Vec<String>, url: String) {
    if !list.contains(&url) {
        list.push(url);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::config::ExtractorConfig;
    use crate::fetch::GuardedFetcher;
    use crate::test_support::stub_transport::{StubResponse, StubTransport};

    const POST_URL: &str = "https://www.linkedin.com/posts/jane_deck-activity-1";
    const MANIFEST: &str = "https://media.licdn.com/dms/document/manifest/abc";
    const IMAGE_MANIFEST_HI: &str = "https://media.licdn.com/dms/document/images/abc-1280";
    const COVER: &str = "https://media.licdn.com/dms/image/v2/cover-1";

    fn ctx(stub: &Arc<StubTransport>, config: ExtractorConfig) -> StrategyContext {
        let url = Url::parse(POST_URL).unwrap();
        StrategyContext::new(
            Arc::new(config),
            GuardedFetcher::new(stub.clone()),
            url.clone(),
            url,
            vec![
                "https://www.linkedin.com/".to_string(),
                "https://www.linkedin.com/feed/".to_string(),
            ],
        )
    }

    fn viewer_html(payload: &str) -> String {
        format!(
            r#"<div data-native-document-config="{}"></div>"#,
            html_escape::encode_double_quoted_attribute(payload)
        )
    }

    async fn run(stub: &Arc<StubTransport>, config: ExtractorConfig, html: &str) -> PartialExtraction {
        let ctx = ctx(stub, config);
        let collected = {
            let document = Html::parse_document(html);
            NativeDocumentStrategy.collect(&document, &ctx)
        };
        NativeDocumentStrategy.resolve(collected, &ctx).await
    }

    #[tokio::test]
    async fn test_pages_supersede_covers() {
        let stub = Arc::new(StubTransport::new());
        stub.route(
            MANIFEST,
            StubResponse::json(&format!(
                r#"{{"transcribedDocumentUrl":"https://media.licdn.com/dms/document/pdf/abc.pdf",
                    "perResolutions":[{{"width":480,"imageManifestUrl":"https://media.licdn.com/dms/document/images/abc-480"}},
                                      {{"width":1280,"imageManifestUrl":"{IMAGE_MANIFEST_HI}"}}]}}"#
            )),
        );
        stub.route(
            IMAGE_MANIFEST_HI,
            StubResponse::json(
                r#"{"pages":["https://media.licdn.com/dms/image/v2/page-1","https://media.licdn.com/dms/image/v2/page-2"]}"#,
            ),
        );
        let html = viewer_html(&format!(
            r#"{{"doc":{{"manifestUrl":"{MANIFEST}","coverPages":["{COVER}"]}}}}"#
        ));

        let partial = run(&stub, ExtractorConfig::default(), &html).await;

        assert_eq!(
            partial.documents,
            vec![
                "https://media.licdn.com/dms/document/pdf/abc.pdf".to_string(),
                "https://media.licdn.com/dms/image/v2/page-1".to_string(),
                "https://media.licdn.com/dms/image/v2/page-2".to_string(),
            ]
        );
        let referers: Vec<Option<String>> = stub.requests().into_iter().map(|r| r.referer).collect();
        assert!(referers.iter().all(|r| r.as_deref() == Some("https://www.linkedin.com/")));
    }

    #[tokio::test]
    async fn test_covers_kept_without_pages() {
        let stub = Arc::new(StubTransport::new());
        stub.route(MANIFEST, StubResponse::json(r#"{"unrelated":true}"#));
        let html = viewer_html(&format!(
            r#"{{"doc":{{"manifestUrl":"{MANIFEST}","coverPages":[{{"url":"{COVER}"}}]}}}}"#
        ));

        let partial = run(&stub, ExtractorConfig::default(), &html).await;
        assert_eq!(partial.documents, vec![COVER.to_string()]);
    }

    #[tokio::test]
    async fn test_referer_fallback_on_refusal() {
        let stub = Arc::new(StubTransport::new());
        stub.route_with_referer(MANIFEST, "https://www.linkedin.com/", StubResponse::status(403));
        stub.route_with_referer(
            MANIFEST,
            "https://www.linkedin.com/feed/",
            StubResponse::json(r#"{"downloadUrl":"https://media.licdn.com/dms/document/pdf/x.pdf"}"#),
        );
        let html = viewer_html(&format!(r#"{{"manifestUrl":"{MANIFEST}"}}"#));

        let partial = run(&stub, ExtractorConfig::default(), &html).await;
        assert_eq!(
            partial.documents,
            vec!["https://media.licdn.com/dms/document/pdf/x.pdf".to_string()]
        );
        assert_eq!(stub.request_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_manifest_falls_back_to_covers() {
        let stub = Arc::new(StubTransport::new());
        stub.route(
            MANIFEST,
            StubResponse::json("{}").with_delay(Duration::from_secs(5)),
        );
        let html = viewer_html(&format!(
            r#"{{"manifestUrl":"{MANIFEST}","coverPages":["{COVER}"]}}"#
        ));
        let config = ExtractorConfig {
            fetch_timeout: Duration::from_millis(50),
            ..ExtractorConfig::default()
        };

        let partial = run(&stub, config, &html).await;
        assert_eq!(partial.documents, vec![COVER.to_string()]);
    }

    #[tokio::test]
    async fn test_manifest_fetches_are_capped_and_bounded() {
        let stub = Arc::new(StubTransport::new());
        let mut html = String::new();
        for i in 0..6 {
            let manifest = format!("https://media.licdn.com/dms/document/manifest/{i}");
            stub.route(
                &manifest,
                StubResponse::json(&format!(
                    r#"{{"downloadUrl":"https://media.licdn.com/dms/document/pdf/{i}.pdf"}}"#
                ))
                .with_delay(Duration::from_millis(20)),
            );
            html.push_str(&viewer_html(&format!(r#"{{"manifestUrl":"{manifest}"}}"#)));
        }

        let partial = run(&stub, ExtractorConfig::default(), &html).await;
        assert_eq!(partial.documents.len(), 4);
        assert_eq!(stub.request_count(), 4);
        assert!(stub.peak_in_flight() <= 2, "peak was {}", stub.peak_in_flight());
    }

    #[test]
    fn test_off_cdn_manifest_ignored() {
        let stub = Arc::new(StubTransport::new());
        let ctx = ctx(&stub, ExtractorConfig::default());
        let payload: Value =
            serde_json::from_str(r#"{"manifestUrl":"https://169.254.169.254/latest","coverPages":["https://evil.net/c.jpg"]}"#)
                .unwrap();
        let viewer = ViewerConfig::from_payload(&payload, &ctx);
        assert!(viewer.manifest.is_none());
        assert!(viewer.covers.is_empty());
    }
}
