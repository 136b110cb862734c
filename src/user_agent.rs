//! Shared User-Agent strings for page, follow-up, and media requests.
//!
//! The post platform serves stripped-down or blocked pages to obvious bots,
//! so every request goes out with the same browser-like User-Agent.

/// Browser User-Agent sent on every platform and CDN request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Accept header for HTML page and embed-frame requests.
pub(crate) const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Accept header for manifest (JSON) requests.
pub(crate) const JSON_ACCEPT: &str = "application/json,text/plain;q=0.9,*/*;q=0.8";

/// Accept header for media downloads.
pub(crate) const MEDIA_ACCEPT: &str = "image/*,video/*,application/pdf,*/*;q=0.8";

/// Default User-Agent for all requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
