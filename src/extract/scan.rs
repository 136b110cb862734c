//! Generic media scan over attributes, inline styles, and script bodies.
//!
//! Used where no page-specific selectors apply (embed frames) and by the
//! script strategy for the size-capped script pass.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::{PartialExtraction, StrategyContext};
use crate::media::{self, MediaType};
use crate::page::compile_static_selector;

static ANY_ELEMENT: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("*"));
static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("script"));

/// Attributes that hold a single media URL.
pub(crate) const URL_ATTRIBUTES: &[&str] = &[
    "src",
    "data-src",
    "data-delayed-url",
    "data-video-url",
    "data-document-url",
    "data-url",
    "href",
    "poster",
    "content",
];

/// Scans every element's URL attributes, `srcset`, `data-sources`, and
/// `style`, then (capped) every inline script body.
pub(crate) fn scan_document(document: &Html, ctx: &StrategyContext) -> PartialExtraction {
    let mut partial = PartialExtraction::default();
    for element in document.select(&ANY_ELEMENT) {
        for raw in element_urls(element) {
            push_classified(&mut partial, ctx, &raw);
        }
    }
    scan_scripts(document, ctx, &[MediaType::Image, MediaType::Video, MediaType::Document], &mut partial);
    partial
}

/// Parses `html` and scans it. The parsed document never leaves this call.
pub(crate) fn scan_html(html: &str, ctx: &StrategyContext) -> PartialExtraction {
    let document = Html::parse_document(html);
    scan_document(&document, ctx)
}

/// Regex-scans inline script bodies for URLs of the given kinds.
///
/// Each body is truncated to `max_script_bytes` before scanning. JSON-LD and
/// external scripts are skipped.
pub(crate) fn scan_scripts(
    document: &Html,
    ctx: &StrategyContext,
    kinds: &[MediaType],
    partial: &mut PartialExtraction,
) {
    let cap = ctx.config().max_script_bytes;
    for script in document.select(&SCRIPT_SELECTOR) {
        let attrs = script.value();
        if attrs.attr("src").is_some() || attrs.attr("type") == Some("application/ld+json") {
            continue;
        }
        let body = capped_text(script, cap);
        for raw in media::find_urls(&body) {
            if let Some(kind) = MediaType::from_url(&raw)
                && kinds.contains(&kind)
                && let Some(url) = ctx.accept(kind, &raw)
            {
                partial.push(kind, url);
            }
        }
    }
}

/// Every candidate URL carried by `element`'s attributes.
pub(crate) fn element_urls(element: ElementRef<'_>) -> Vec<String> {
    let attrs = element.value();
    let mut urls: Vec<String> = URL_ATTRIBUTES
        .iter()
        .filter_map(|name| attrs.attr(name))
        .map(str::to_string)
        .collect();
    if let Some(srcset) = attrs.attr("srcset") {
        urls.extend(srcset_urls(srcset));
    }
    if let Some(sources) = attrs.attr("data-sources") {
        urls.extend(data_sources_urls(sources));
    }
    if let Some(style) = attrs.attr("style") {
        urls.extend(media::find_urls(style));
    }
    urls
}

/// URLs of a `srcset` attribute, largest descriptor last as authored.
pub(crate) fn srcset_urls(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// URLs of a `data-sources` JSON list (`[{"src": ..., "type": ...}]`).
///
/// Falls back to a plain URL scan when the value is not valid JSON.
pub(crate) fn data_sources_urls(raw: &str) -> Vec<String> {
    let parsed = serde_json::from_str::<Value>(raw)
        .ok()
        .or_else(|| serde_json::from_str::<Value>(&html_escape::decode_html_entities(raw)).ok());
    match parsed {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(url) => Some(url.clone()),
                Value::Object(object) => object
                    .get("src")
                    .or_else(|| object.get("url"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => media::find_urls(raw),
    }
}

fn push_classified(partial: &mut PartialExtraction, ctx: &StrategyContext, raw: &str) {
    let decoded = media::decode_escaped_url(raw);
    let Some(kind) = MediaType::from_url(&decoded) else {
        return;
    };
    if let Some(url) = ctx.accept(kind, &decoded) {
        partial.push(kind, url);
    }
}

/// Concatenates `element`'s text chunks, stopping once `max_bytes` is reached.
pub(crate) fn capped_text(element: ElementRef<'_>, max_bytes: usize) -> String {
    let mut out = String::new();
    for chunk in element.text() {
        let room = max_bytes - out.len();
        let piece = truncate_at_char_boundary(chunk, room);
        out.push_str(piece);
        if piece.len() < chunk.len() || out.len() == max_bytes {
            break;
        }
    }
    out
}

/// Returns the longest prefix of `text` not exceeding `max_bytes` that ends
/// on a char boundary.
pub(crate) fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
