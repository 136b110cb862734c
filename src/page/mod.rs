//! Post page acquisition.
//!
//! Fetches the post page through the guarded fetcher (allow-list: the post
//! host only), maps blocked statuses and login walls to
//! [`ExtractError::PrivateOrProtected`], and hands back the raw HTML for the
//! strategy chain to parse.

use std::sync::{Arc, LazyLock};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ExtractorConfig;
use crate::extract::ExtractError;
use crate::fetch::{FetchOptions, GuardedFetcher};
use crate::user_agent::HTML_ACCEPT;

/// Platform-specific status the post host returns to suspected bots.
pub const PLATFORM_BLOCKED_STATUS: u16 = 999;

const AUTH_WALL_PHRASES: &[&str] = &["sign in", "sign up", "log in", "login", "join linkedin"];

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("title"));
static OG_TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"meta[property="og:title"]"#));

/// A fetched post page.
#[derive(Debug, Clone)]
pub struct PostPage {
    /// Final URL after redirects.
    pub url: Url,
    /// HTTP status of the final response.
    pub status: u16,
    /// Decoded HTML body.
    pub html: String,
}

impl PostPage {
    /// Origin of the page with a trailing slash, used as the first referer.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}/", self.url.origin().ascii_serialization())
    }

    /// Parses the body into a queryable document.
    ///
    /// The returned [`Html`] is not `Send`; keep it out of `.await` points.
    #[must_use]
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Fetches and screens post pages.
#[derive(Debug, Clone)]
pub struct PageAcquirer {
    fetcher: GuardedFetcher,
    config: Arc<ExtractorConfig>,
}

impl PageAcquirer {
    /// Creates an acquirer sharing `fetcher` and `config`.
    #[must_use]
    pub fn new(fetcher: GuardedFetcher, config: Arc<ExtractorConfig>) -> Self {
        Self { fetcher, config }
    }

    /// Fetches the post page at `url`.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::InvalidUrl`] if `url` fails the post URL policy
    /// - [`ExtractError::PrivateOrProtected`] on 401/403/999 or a login wall
    /// - [`ExtractError::ScrapeFailed`] on any other non-2xx status
    /// - [`ExtractError::Fetch`] if the guarded fetch fails
    #[instrument(skip(self))]
    pub async fn acquire(&self, url: &str) -> Result<PostPage, ExtractError> {
        let url = url.trim();
        if !self.config.post_policy.is_valid_post_url(url) {
            return Err(ExtractError::invalid_url(url));
        }

        let options = FetchOptions::new(self.config.fetch_timeout)
            .with_max_redirects(self.config.max_redirects)
            .with_header(ACCEPT, HTML_ACCEPT)
            .with_header(ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        let allow_list = self.config.post_policy.allow_list();

        let response = self.fetcher.fetch(url, &allow_list, &options).await?;

        if is_blocked_status(response.status) {
            warn!(status = response.status, "post host refused the request");
            return Err(ExtractError::private_or_protected(url, response.status));
        }
        if !response.is_success() {
            warn!(status = response.status, "post page fetch failed");
            return Err(ExtractError::scrape_failed(url, response.status));
        }

        let html = response.text();
        if detect_auth_wall(&html) {
            info!("post page is behind a login wall");
            return Err(ExtractError::private_or_protected(url, response.status));
        }

        debug!(final_url = %response.url, bytes = html.len(), "post page acquired");
        Ok(PostPage {
            url: response.url,
            status: response.status,
            html,
        })
    }
}

/// Returns true for statuses the post host uses to refuse access.
#[must_use]
pub fn is_blocked_status(status: u16) -> bool {
    matches!(status, 401 | 403 | PLATFORM_BLOCKED_STATUS)
}

/// Returns true if the page title or `og:title` reads like a login wall.
#[must_use]
pub fn detect_auth_wall(html: &str) -> bool {
    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>());
    let og_title = document
        .select(&OG_TITLE_SELECTOR)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(str::to_string);

    [title, og_title]
        .into_iter()
        .flatten()
        .any(|value| is_auth_wall_title(&value))
}

fn is_auth_wall_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    AUTH_WALL_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

pub(crate) fn compile_static_selector(pattern: &str) -> Selector {
    match Selector::parse(pattern) {
        Ok(selector) => selector,
        Err(error) => panic!("invalid static selector {pattern:?}: {error}"),
    }
}
