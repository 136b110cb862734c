//! Output filenames for downloaded media.

use url::Url;

use crate::media::MediaType;

/// Builds `<kind>-<NN><ext>`, e.g. `image-01.jpg`.
///
/// The extension comes from the MIME type, then the URL path, then a
/// per-kind default.
#[must_use]
pub fn media_filename(kind: MediaType, index: usize, mime_type: &str, url: &str) -> String {
    let extension = extension_from_content_type(mime_type)
        .map(str::to_string)
        .or_else(|| extension_from_url(url))
        .unwrap_or_else(|| default_extension(kind).to_string());
    format!("{}-{index:02}{extension}", kind.as_str())
}

/// Extension for a known media MIME type.
pub(crate) fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    let extension = match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/avif" => ".avif",
        "image/heic" => ".heic",
        "image/svg+xml" => ".svg",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/quicktime" => ".mov",
        "application/vnd.apple.mpegurl" | "application/x-mpegurl" => ".m3u8",
        "application/pdf" => ".pdf",
        "application/msword" => ".doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.ms-powerpoint" => ".ppt",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => ".pptx",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        "application/vnd.oasis.opendocument.text" => ".odt",
        "application/vnd.oasis.opendocument.presentation" => ".odp",
        "application/vnd.oasis.opendocument.spreadsheet" => ".ods",
        _ => return None,
    };
    Some(extension)
}

/// Lowercased extension of the (percent-decoded) last path segment, if short
/// and alphanumeric.
pub(crate) fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let raw_segment = parsed.path_segments()?.next_back()?;
    let last_segment = urlencoding::decode(raw_segment).ok()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index..];
    if ext.len() <= 1 || ext.len() > 6 || !ext[1..].chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

fn default_extension(kind: MediaType) -> &'static str {
    match kind {
        MediaType::Image => ".jpg",
        MediaType::Video => ".mp4",
        MediaType::Document => ".pdf",
    }
}
