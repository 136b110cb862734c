//! Post text normalization and placeholder detection.

/// Phrases that, on their own, mean the text is page chrome rather than the post.
const PLACEHOLDER_TEXTS: &[&str] = &["sign in", "sign up", "log in", "join linkedin", "linkedin"];

/// Prefixes of login-prompt texts the platform serves to logged-out visitors.
const PLACEHOLDER_PREFIXES: &[&str] = &[
    "sign in to view",
    "sign in to see",
    "join linkedin",
    "log in to",
    "linkedin is the world",
];

/// Cleans up post text.
///
/// Converts CRLF to LF, collapses runs of spaces and tabs, trims every line,
/// collapses three or more newlines to two, and trims the result.
///
/// Entities are left alone: DOM text and attribute values arrive decoded.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    for line in unified.split('\n') {
        let collapsed = line
            .split([' ', '\t', '\u{a0}'])
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(collapsed);
    }

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Returns true if `text` is empty or a known low-value placeholder.
#[must_use]
pub fn is_placeholder_text(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    let lower = lower.trim_end_matches(['.', '!', '|', ' ']);
    if lower.is_empty() {
        return true;
    }
    PLACEHOLDER_TEXTS.contains(&lower)
        || PLACEHOLDER_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}

/// Normalizes `raw` and returns it unless it is empty or a placeholder.
#[must_use]
pub fn usable_text(raw: &str) -> Option<String> {
    let text = normalize_text(raw);
    (!is_placeholder_text(&text)).then_some(text)
}

/// Like [`usable_text`], for raw payloads (JSON-LD) that may still carry entities.
#[must_use]
pub fn usable_encoded_text(raw: &str) -> Option<String> {
    usable_text(&html_escape::decode_html_entities(raw))
}
