//! Embed-frame strategy: fetch `/embed/` iframes on the post host and scan them.

use std::sync::LazyLock;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::scan::scan_html;
use super::{Collected, ExtractionStrategy, FollowUp, PartialExtraction, StrategyContext};
use crate::page::compile_static_selector;
use crate::policy::normalize_host;
use crate::user_agent::HTML_ACCEPT;

static FRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("iframe[src], iframe[data-src]"));

const EMBED_PATH_MARKER: &str = "/embed/";

/// Follows embed frames and merges their media.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbedStrategy;

#[async_trait]
impl ExtractionStrategy for EmbedStrategy {
    fn name(&self) -> &'static str {
        "embed-frame"
    }

    fn collect(&self, document: &Html, ctx: &StrategyContext) -> Collected {
        let post_host = ctx.config().post_policy.host();
        let mut collected = Collected::default();

        for frame in document.select(&FRAME_SELECTOR) {
            let attrs = frame.value();
            let Some(raw) = attrs.attr("src").or_else(|| attrs.attr("data-src")) else {
                continue;
            };
            let Ok(url) = ctx.page_url().join(raw.trim()) else {
                continue;
            };
            let on_post_host = url.host_str().is_some_and(|host| normalize_host(host) == post_host);
            if !on_post_host || !url.path().contains(EMBED_PATH_MARKER) || url == *ctx.page_url() {
                continue;
            }
            let url = url.to_string();
            if collected.follow_ups.iter().any(|f| f.url == url) {
                continue;
            }
            collected.follow_ups.push(FollowUp {
                url,
                fallback: Vec::new(),
            });
        }
        collected
    }

    async fn resolve(&self, collected: Collected, ctx: &StrategyContext) -> PartialExtraction {
        let Collected {
            mut partial,
            mut follow_ups,
        } = collected;
        follow_ups.truncate(ctx.config().max_embed_fetches);

        let allow_list = ctx.config().post_policy.allow_list();
        let allow_list = &allow_list;
        let frames: Vec<PartialExtraction> = stream::iter(follow_ups)
            .map(|frame| async move {
                match ctx.fetch_with_referers(&frame.url, HTML_ACCEPT, allow_list).await {
                    Ok(response) => {
                        let found = scan_html(&response.text(), ctx);
                        debug!(url = %frame.url, media = found.media_count(), "embed frame scanned");
                        found
                    }
                    Err(error) => {
                        warn!(url = %frame.url, error = %error, "embed frame fetch failed");
                        PartialExtraction::default()
                    }
                }
            })
            .buffer_unordered(ctx.config().resolve_concurrency.max(1))
            .collect()
            .await;

        for frame in frames {
            partial.absorb_media(frame);
        }
        partial
    }
}
