//! DOM-selector strategy: commentary text, content images, videos, documents.

use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::scan::{data_sources_urls, srcset_urls};
use super::text::usable_text;
use super::{Collected, ExtractionStrategy, PartialExtraction, StrategyContext};
use crate::media::{self, AVATAR_CLASS_KEYWORDS, MediaType};
use crate::page::compile_static_selector;

/// Commentary selectors, most specific first.
const TEXT_SELECTORS: &[&str] = &[
    r#"[data-test-id="main-feed-activity-card__commentary"]"#,
    ".attributed-text-segment-list__content",
    ".feed-shared-update-v2__description",
    ".update-components-text",
    ".feed-shared-text",
    ".share-update-card__update-text",
    "article .commentary",
];

const META_TEXT_SELECTORS: &[&str] = &[
    r#"meta[property="og:description"]"#,
    r#"meta[name="description"]"#,
    r#"meta[property="og:title"]"#,
];

/// Ancestor classes that mark an image as post content.
const MEDIA_CONTAINER_CLASSES: &[&str] = &[
    "feed-images-content",
    "update-components-image",
    "feed-shared-image",
    "feed-shared-carousel",
    "main-feed-card__media",
    "update-components-article",
    "share-images",
    "multi-image",
];

/// Classes on the image itself that are enough on their own.
const STRONG_IMAGE_CLASSES: &[&str] = &[
    "update-components-image__image",
    "feed-shared-image__image",
    "feed-images-content__image",
    "main-feed-card__image",
];

const IMAGE_SOURCE_ATTRIBUTES: &[&str] = &["data-delayed-url", "data-src", "src"];

const VIDEO_SELECTORS: &[&str] = &[
    "video",
    "video source",
    "[data-sources]",
    "[data-video-url]",
    r#"[style*="licdn"]"#,
];

const VIDEO_ATTRIBUTES: &[&str] = &["src", "data-src", "data-video-url"];

const OG_VIDEO_SELECTORS: &[&str] = &[
    r#"meta[property="og:video"]"#,
    r#"meta[property="og:video:url"]"#,
    r#"meta[property="og:video:secure_url"]"#,
];

const DOCUMENT_SELECTORS: &[&str] = &[
    ".document-s-container [src], .document-s-container [href], .document-s-container [data-url]",
    ".update-components-document [src], .update-components-document [href]",
    "[data-document-url]",
    "a[href]",
    "iframe[src]",
];

const DOCUMENT_ATTRIBUTES: &[&str] = &["data-document-url", "data-url", "href", "src"];

/// Elements whose boundaries become line breaks in commentary text.
const BLOCK_ELEMENTS: &[&str] = &["p", "div", "li", "ul", "ol", "blockquote", "h1", "h2", "h3"];

/// How many ancestors are checked for avatar classes.
const AVATAR_ANCESTOR_DEPTH: usize = 4;

struct Selectors {
    text: Vec<Selector>,
    meta_text: Vec<Selector>,
    images: Selector,
    videos: Vec<Selector>,
    og_video: Vec<Selector>,
    documents: Vec<Selector>,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    text: compile_all(TEXT_SELECTORS),
    meta_text: compile_all(META_TEXT_SELECTORS),
    images: compile_static_selector("img, [data-delayed-url]"),
    videos: compile_all(VIDEO_SELECTORS),
    og_video: compile_all(OG_VIDEO_SELECTORS),
    documents: compile_all(DOCUMENT_SELECTORS),
});

fn compile_all(patterns: &[&str]) -> Vec<Selector> {
    patterns.iter().map(|pattern| compile_static_selector(pattern)).collect()
}

/// Reads the rendered markup with known selectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomStrategy;

#[async_trait]
impl ExtractionStrategy for DomStrategy {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn collect(&self, document: &Html, ctx: &StrategyContext) -> Collected {
        let mut partial = PartialExtraction {
            text: commentary_text(document),
            ..PartialExtraction::default()
        };

        for url in content_images(document, ctx) {
            partial.push(MediaType::Image, url);
        }
        for url in videos(document, ctx) {
            partial.push(MediaType::Video, url);
        }
        for url in documents(document, ctx) {
            partial.push(MediaType::Document, url);
        }
        partial.into()
    }
}

fn commentary_text(document: &Html) -> Option<String> {
    let from_selectors = SELECTORS.text.iter().find_map(|selector| {
        document
            .select(selector)
            .find_map(|element| usable_text(&text_with_breaks(element)))
    });
    from_selectors.or_else(|| {
        SELECTORS.meta_text.iter().find_map(|selector| {
            document
                .select(selector)
                .filter_map(|element| element.value().attr("content"))
                .find_map(usable_text)
        })
    })
}

/// Collects an element's text, turning `<br>` and block boundaries into newlines.
fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    out
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if name == "br" {
                out.push('\n');
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push('\n');
            }
            push_text(child, out);
            if block {
                out.push('\n');
            }
        }
    }
}

fn content_images(document: &Html, ctx: &StrategyContext) -> Vec<String> {
    let min_dimension = ctx.config().min_image_dimension;
    let mut urls = Vec::new();
    for element in document.select(&SELECTORS.images) {
        if !is_content_image(element, min_dimension) {
            continue;
        }
        let attrs = element.value();
        let mut raws: Vec<String> = IMAGE_SOURCE_ATTRIBUTES
            .iter()
            .filter_map(|name| attrs.attr(name))
            .map(str::to_string)
            .collect();
        if let Some(srcset) = attrs.attr("srcset") {
            raws.extend(srcset_urls(srcset));
        }
        urls.extend(raws.iter().filter_map(|raw| ctx.accept(MediaType::Image, raw)));
    }
    urls
}

/// Decides whether an image element is post content rather than chrome.
fn is_content_image(element: ElementRef<'_>, min_dimension: u32) -> bool {
    let own_class = element.value().attr("class").unwrap_or_default().to_ascii_lowercase();
    let strong = STRONG_IMAGE_CLASSES.iter().any(|class| own_class.contains(class));

    let near_avatar = std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .take(AVATAR_ANCESTOR_DEPTH + 1)
        .any(|el| class_has_any(el, AVATAR_CLASS_KEYWORDS));
    if near_avatar {
        return false;
    }

    let in_container = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| class_has_any(el, MEDIA_CONTAINER_CLASSES));
    if !in_container && !strong {
        return false;
    }

    if !strong {
        let too_small = ["width", "height"].iter().any(|name| {
            element
                .value()
                .attr(name)
                .and_then(|value| value.trim().trim_end_matches("px").parse::<u32>().ok())
                .is_some_and(|px| px < min_dimension)
        });
        if too_small {
            return false;
        }
    }
    true
}

fn class_has_any(element: ElementRef<'_>, keywords: &[&str]) -> bool {
    element.value().attr("class").is_some_and(|class| {
        let class = class.to_ascii_lowercase();
        keywords.iter().any(|keyword| class.contains(keyword))
    })
}

fn videos(document: &Html, ctx: &StrategyContext) -> Vec<String> {
    let mut urls = Vec::new();
    for selector in &SELECTORS.videos {
        for element in document.select(selector) {
            let attrs = element.value();
            let mut raws: Vec<String> = VIDEO_ATTRIBUTES
                .iter()
                .filter_map(|name| attrs.attr(name))
                .map(str::to_string)
                .collect();
            if let Some(sources) = attrs.attr("data-sources") {
                raws.extend(data_sources_urls(sources));
            }
            if let Some(style) = attrs.attr("style") {
                raws.extend(media::find_urls(style));
            }
            for raw in raws {
                if let Some(url) = ctx.accept(MediaType::Video, &raw)
                    && !urls.contains(&url)
                {
                    urls.push(url);
                }
            }
        }
    }

    if urls.is_empty() {
        urls = SELECTORS
            .og_video
            .iter()
            .flat_map(|selector| document.select(selector))
            .filter_map(|element| element.value().attr("content"))
            .filter_map(|raw| ctx.accept(MediaType::Video, raw))
            .collect();
    }
    urls
}

fn documents(document: &Html, ctx: &StrategyContext) -> Vec<String> {
    let mut urls = Vec::new();
    for selector in &SELECTORS.documents {
        for element in document.select(selector) {
            for name in DOCUMENT_ATTRIBUTES {
                if let Some(raw) = element.value().attr(name)
                    && let Some(url) = ctx.accept(MediaType::Document, raw)
                    && !urls.contains(&url)
                {
                    urls.push(url);
                }
            }
        }
    }
    urls
}
