//! Media kind from the response, not the URL.
//!
//! Order: MIME type, then URL path patterns, then the caller's hint (only
//! when the MIME type is missing or generic binary).

use super::MediaError;
use crate::media::MediaType;

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.presentation",
    "application/vnd.oasis.opendocument.spreadsheet",
];

const PLAYLIST_MIME_TYPES: &[&str] = &["application/vnd.apple.mpegurl", "application/x-mpegurl"];

const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Determines the media kind of a downloaded response.
///
/// `mime_type` must already be lowercased without parameters.
///
/// # Errors
///
/// [`MediaError::NotMedia`] for HTML responses, [`MediaError::Unclassified`]
/// when nothing identifies the kind.
pub fn classify(mime_type: &str, url: &str, hint: Option<MediaType>) -> Result<MediaType, MediaError> {
    if matches!(mime_type, "text/html" | "application/xhtml+xml") {
        return Err(MediaError::not_media(url, mime_type));
    }
    if let Some(kind) = from_mime(mime_type) {
        return Ok(kind);
    }
    if let Some(kind) = MediaType::from_url(url) {
        return Ok(kind);
    }
    if (mime_type.is_empty() || GENERIC_MIME_TYPES.contains(&mime_type))
        && let Some(kind) = hint
    {
        return Ok(kind);
    }
    Err(MediaError::unclassified(url, mime_type))
}

fn from_mime(mime_type: &str) -> Option<MediaType> {
    if mime_type.starts_with("image/") {
        Some(MediaType::Image)
    } else if mime_type.starts_with("video/") || PLAYLIST_MIME_TYPES.contains(&mime_type) {
        Some(MediaType::Video)
    } else if DOCUMENT_MIME_TYPES.contains(&mime_type) {
        Some(MediaType::Document)
    } else {
        None
    }
}
