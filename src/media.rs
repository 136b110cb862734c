//! Media kinds and the CDN path patterns used to recognize them.
//!
//! Extraction uses these checks to decide which URLs belong in which list;
//! the downloader uses them as a fallback when the response `Content-Type`
//! is inconclusive.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

/// Kind of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A still image.
    Image,
    /// A video file or stream playlist.
    Video,
    /// A document (PDF, office file, or transcript).
    Document,
}

impl MediaType {
    /// Returns the lowercase name used in filenames and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
        }
    }

    /// Guesses the kind from a URL path alone.
    ///
    /// Video and document patterns are checked before image patterns, since
    /// CDN video posters and document pages also live under image paths.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        if is_video_url(url) {
            Some(Self::Video)
        } else if is_document_url(url) {
            Some(Self::Document)
        } else if is_image_url(url) {
            Some(Self::Image)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const IMAGE_PATH_MARKERS: &[&str] = &["/dms/image/"];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];
const VIDEO_PATH_MARKERS: &[&str] = &["/playlist/vid/", "/dms/video/", "/dms/playlist/"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".m3u8", ".webm", ".mov"];
const DOCUMENT_PATH_MARKERS: &[&str] = &["/dms/document/"];
const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".ppt", ".pptx"];

/// URL-path keywords that mark an image as an avatar or logo.
pub(crate) const AVATAR_PATH_KEYWORDS: &[&str] = &[
    "profile-displayphoto",
    "profile-framedphoto",
    "company-logo",
    "profile-displaybackgroundimage",
    "ghost-person",
    "/aero-v1/sc/h/",
];

/// CSS-class keywords that mark an element (or an ancestor) as avatar chrome.
pub(crate) const AVATAR_CLASS_KEYWORDS: &[&str] = &[
    "avatar",
    "actor__avatar",
    "profile-photo",
    "presence-entity",
    "entity-image",
    "company-logo",
    "logo",
];

fn lower_path(url: &str) -> String {
    Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase(),
        |parsed| parsed.path().to_ascii_lowercase(),
    )
}

fn path_matches(url: &str, markers: &[&str], extensions: &[&str]) -> bool {
    let path = lower_path(url);
    markers.iter().any(|marker| path.contains(marker))
        || extensions.iter().any(|ext| path.ends_with(ext))
}

/// Returns true if the URL path looks like a CDN image asset.
#[must_use]
pub fn is_image_url(url: &str) -> bool {
    path_matches(url, IMAGE_PATH_MARKERS, IMAGE_EXTENSIONS)
}

/// Returns true if the URL path looks like a video file or playlist.
#[must_use]
pub fn is_video_url(url: &str) -> bool {
    path_matches(url, VIDEO_PATH_MARKERS, VIDEO_EXTENSIONS)
}

/// Returns true if the URL path looks like a document.
#[must_use]
pub fn is_document_url(url: &str) -> bool {
    path_matches(url, DOCUMENT_PATH_MARKERS, DOCUMENT_EXTENSIONS)
}

/// Returns true if the URL path carries an avatar/logo keyword.
#[must_use]
pub fn is_avatar_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    AVATAR_PATH_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Returns true if `kind`'s path pattern accepts `url`.
#[must_use]
pub fn matches_kind(kind: MediaType, url: &str) -> bool {
    match kind {
        MediaType::Image => is_image_url(url) && !is_avatar_url(url),
        MediaType::Video => is_video_url(url),
        MediaType::Document => is_document_url(url),
    }
}

/// Undoes the escaping found in inline JSON and HTML attributes.
///
/// Handles `\u002F`, `\/`, `\u0026`, `\u003D`, and `&amp;`.
#[must_use]
pub fn decode_escaped_url(raw: &str) -> String {
    let mut out = raw.trim().to_string();
    for (from, to) in [
        ("\\u002F", "/"),
        ("\\u002f", "/"),
        ("\\u0026", "&"),
        ("\\u003D", "="),
        ("\\u003d", "="),
        ("\\/", "/"),
        ("&amp;", "&"),
    ] {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out
}

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"https?://[^\s"'<>()\\]+"#));

/// Finds every absolute http(s) URL in `text` after undoing JSON escapes.
///
/// Trailing punctuation picked up from prose or JSON (`,`, `;`, `.`) is trimmed.
#[must_use]
pub fn find_urls(text: &str) -> Vec<String> {
    let decoded = decode_escaped_url(text);
    URL_PATTERN
        .find_iter(&decoded)
        .map(|m| m.as_str().trim_end_matches([',', ';', '.']).to_string())
        .filter(|url| url.len() > "https://".len())
        .collect()
}

/// Builds the ordered, de-duplicated referer list for a follow-up request.
///
/// Preferred values (item referer, post origin) come first, then the defaults.
#[must_use]
pub fn referer_candidates<'a, I>(preferred: I, defaults: &'a [String]) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut out: Vec<String> = Vec::new();
    let candidates = preferred
        .into_iter()
        .flatten()
        .chain(defaults.iter().map(String::as_str));
    for candidate in candidates {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !out.iter().any(|seen| seen == candidate) {
            out.push(candidate.to_string());
        }
    }
    out
}

pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(error) => panic!("invalid static regex {pattern:?}: {error}"),
    }
}
