//! JSON-LD structured-data strategy.

use std::collections::VecDeque;
use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::text::usable_encoded_text;
use super::{Collected, ExtractionStrategy, PartialExtraction, StrategyContext};
use crate::media::MediaType;
use crate::page::compile_static_selector;

static JSON_LD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"script[type="application/ld+json"]"#));

const POST_TYPES: &[&str] = &[
    "SocialMediaPosting",
    "DiscussionForumPosting",
    "VideoObject",
    "Article",
    "NewsArticle",
    "BlogPosting",
];

const TEXT_FIELDS: &[&str] = &["articleBody", "description", "text", "headline", "name"];
const IDENTIFIER_FIELDS: &[&str] = &["@id", "url", "mainEntityOfPage"];
const IMAGE_FIELDS: &[&str] = &["image", "thumbnailUrl"];
const VIDEO_FIELDS: &[&str] = &["video", "contentUrl"];
const ATTACHMENT_FIELDS: &[&str] = &["associatedMedia", "sharedContent", "subjectOf"];

/// Upper bound on JSON nodes visited per script, against adversarial nesting.
const MAX_NODES: usize = 10_000;

/// Reads `application/ld+json` post objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredDataStrategy;

#[async_trait]
impl ExtractionStrategy for StructuredDataStrategy {
    fn name(&self) -> &'static str {
        "structured-data"
    }

    fn collect(&self, document: &Html, ctx: &StrategyContext) -> Collected {
        let mut candidates = Vec::new();
        for script in document.select(&JSON_LD_SELECTOR) {
            let body: String = script.text().collect();
            let Some(value) = parse_json_ld(&body) else {
                debug!("skipping unparseable JSON-LD block");
                continue;
            };
            candidates.extend(post_objects(value));
        }

        let Some(post) = choose_candidate(&candidates, ctx.canonical_url().path()) else {
            return Collected::default();
        };

        let mut partial = PartialExtraction {
            text: TEXT_FIELDS
                .iter()
                .filter_map(|field| post.get(*field).and_then(Value::as_str))
                .find_map(usable_encoded_text),
            ..PartialExtraction::default()
        };

        for field in IMAGE_FIELDS {
            for raw in field_urls(post.get(*field)) {
                if let Some(url) = ctx.accept(MediaType::Image, &raw) {
                    partial.push(MediaType::Image, url);
                }
            }
        }
        for field in VIDEO_FIELDS {
            for raw in field_urls(post.get(*field)) {
                if let Some(url) = ctx.accept(MediaType::Video, &raw) {
                    partial.push(MediaType::Video, url);
                }
            }
        }
        for field in ATTACHMENT_FIELDS {
            for raw in field_urls(post.get(*field)) {
                let Some(kind) = MediaType::from_url(&crate::media::decode_escaped_url(&raw)) else {
                    continue;
                };
                if let Some(url) = ctx.accept(kind, &raw) {
                    partial.push(kind, url);
                }
            }
        }

        partial.into()
    }
}

/// Parses a JSON-LD body, retrying once with HTML entities decoded.
fn parse_json_ld(body: &str) -> Option<Value> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    serde_json::from_str(body).ok().or_else(|| {
        let decoded = html_escape::decode_html_entities(body);
        serde_json::from_str(&decoded).ok()
    })
}

/// Flattens arrays and `@graph` containers and keeps post-typed objects.
fn post_objects(root: Value) -> Vec<Value> {
    let mut found = Vec::new();
    let mut queue = VecDeque::from([root]);
    let mut visited = 0;

    while let Some(node) = queue.pop_front() {
        visited += 1;
        if visited > MAX_NODES {
            break;
        }
        match node {
            Value::Array(items) => queue.extend(items),
            Value::Object(mut object) => {
                if let Some(graph) = object.remove("@graph") {
                    queue.push_back(graph);
                }
                let value = Value::Object(object);
                if is_post_type(&value) {
                    found.push(value);
                }
            }
            _ => {}
        }
    }
    found
}

fn is_post_type(value: &Value) -> bool {
    let types: Vec<&str> = match value.get("@type") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(many)) => many.iter().filter_map(Value::as_str).collect(),
        _ => return false,
    };
    types.into_iter().any(|declared| {
        let short = declared.rsplit(['/', ':', '#']).next().unwrap_or(declared);
        POST_TYPES.contains(&short)
    })
}

/// Picks the candidate whose identifier path equals the canonical path, then
/// one whose path contains it (or vice versa), then the first.
fn choose_candidate<'a>(candidates: &'a [Value], canonical_path: &str) -> Option<&'a Value> {
    let canonical = trim_path(canonical_path);
    if !canonical.is_empty() {
        let paths = |candidate: &Value| -> Vec<String> {
            IDENTIFIER_FIELDS
                .iter()
                .flat_map(|field| field_urls(candidate.get(*field)))
                .map(|raw| identifier_path(&raw))
                .filter(|path| !path.is_empty())
                .collect()
        };
        if let Some(exact) = candidates
            .iter()
            .find(|candidate| paths(*candidate).iter().any(|path| path == canonical))
        {
            return Some(exact);
        }
        if let Some(partial) = candidates.iter().find(|candidate| {
            paths(*candidate)
                .iter()
                .any(|path| path.contains(canonical) || canonical.contains(path.as_str()))
        }) {
            return Some(partial);
        }
    }
    candidates.first()
}

fn identifier_path(raw: &str) -> String {
    let path = url::Url::parse(raw).map_or_else(|_| raw.to_string(), |url| url.path().to_string());
    trim_path(&path).to_string()
}

fn trim_path(path: &str) -> &str {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed == "/" { "" } else { trimmed }
}

/// URLs held by a JSON-LD field: a string, an object's `url`/`contentUrl`/`@id`,
/// or an array of either.
fn field_urls(value: Option<&Value>) -> Vec<String> {
    let mut urls = Vec::new();
    let mut stack: Vec<&Value> = value.into_iter().collect();
    let mut visited = 0;
    while let Some(node) = stack.pop() {
        visited += 1;
        if visited > MAX_NODES {
            break;
        }
        match node {
            Value::String(url) => urls.push(url.clone()),
            Value::Array(items) => stack.extend(items.iter().rev()),
            Value::Object(object) => {
                for key in ["contentUrl", "url", "@id"] {
                    if let Some(Value::String(url)) = object.get(key) {
                        urls.push(url.clone());
                    }
                }
            }
            _ => {}
        }
    }
    urls
}
