//! Bounded-concurrency media downloads with referer fallback.
//!
//! # Concurrency Model
//!
//! - Each item runs in its own Tokio task
//! - A semaphore permit is acquired before spawning each task
//! - Permits are released when the task finishes (RAII)
//! - Handles are awaited in input order, so output keeps input order
//!
//! A failing item is logged and dropped; it never fails the batch.

use std::sync::Arc;

use reqwest::header::ACCEPT;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::classify::classify;
use super::filename::media_filename;
use super::{DownloadedMedia, MediaCandidate, MediaError};
use crate::config::ExtractorConfig;
use crate::fetch::{FetchOptions, GuardedFetcher, TransportResponse};
use crate::media::{self, MediaType};
use crate::user_agent::MEDIA_ACCEPT;

/// A downloaded and classified item, before filenames are assigned.
#[derive(Debug)]
struct Fetched {
    url: String,
    buffer: Vec<u8>,
    media_type: MediaType,
    mime_type: String,
}

/// Downloads media through the guarded fetcher.
///
/// Clones share one semaphore, so the concurrency limit holds across calls.
#[derive(Debug, Clone)]
pub struct MediaDownloader {
    fetcher: GuardedFetcher,
    config: Arc<ExtractorConfig>,
    semaphore: Arc<Semaphore>,
}

impl MediaDownloader {
    /// Creates a downloader allowing `config.download_concurrency` fetches at once.
    #[must_use]
    pub fn new(fetcher: GuardedFetcher, config: Arc<ExtractorConfig>) -> Self {
        let concurrency = config.download_concurrency.max(1);
        debug!(concurrency, max_downloads = config.max_downloads, "creating media downloader");
        Self {
            fetcher,
            config,
            semaphore: Arc::new(Semaphore::new(concurrency)),
        }
    }

    /// Downloads `candidates`, returning the items that succeeded in input order.
    ///
    /// Duplicates and URLs outside the media host allow-list are discarded
    /// first; at most `max_downloads` items are fetched. Each item tries its
    /// own referer, then `preferred_referer`, then the configured defaults.
    #[instrument(skip(self, candidates), fields(requested = candidates.len()))]
    pub async fn download(
        &self,
        candidates: &[MediaCandidate],
        preferred_referer: Option<&str>,
    ) -> Vec<DownloadedMedia> {
        let accepted = self.screen(candidates);
        let mut handles = Vec::with_capacity(accepted.len());

        for candidate in accepted {
            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                warn!("download semaphore closed; stopping batch");
                break;
            };

            let referers = media::referer_candidates(
                [candidate.referer.as_deref(), preferred_referer],
                &self.config.default_referers,
            );
            let fetcher = self.fetcher.clone();
            let config = Arc::clone(&self.config);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let result = download_one(&fetcher, &config, &candidate, &referers).await;
                if let Err(error) = &result {
                    warn!(url = %candidate.url, error = %error, "media download dropped");
                }
                result.ok()
            }));
        }

        let mut fetched = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(item)) => fetched.push(item),
                Ok(None) => {}
                Err(error) => warn!(error = %error, "download task panicked"),
            }
        }

        let downloaded = name_items(fetched);
        info!(
            requested = candidates.len(),
            downloaded = downloaded.len(),
            "media downloads complete"
        );
        downloaded
    }

    /// De-duplicates, applies the host allow-list, and caps the batch.
    fn screen(&self, candidates: &[MediaCandidate]) -> Vec<MediaCandidate> {
        let mut accepted: Vec<MediaCandidate> = Vec::new();
        for candidate in candidates {
            if accepted.iter().any(|seen| seen.url == candidate.url) {
                continue;
            }
            if !self.is_fetchable(&candidate.url) {
                warn!(url = %candidate.url, "media URL outside allow-list; skipping");
                continue;
            }
            accepted.push(candidate.clone());
        }
        if accepted.len() > self.config.max_downloads {
            debug!(
                accepted = accepted.len(),
                max = self.config.max_downloads,
                "capping download batch"
            );
            accepted.truncate(self.config.max_downloads);
        }
        accepted
    }

    fn is_fetchable(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let scheme_ok =
            parsed.scheme() == "https" || (!self.config.require_https && parsed.scheme() == "http");
        scheme_ok
            && parsed
                .host_str()
                .is_some_and(|host| self.config.media_policy.is_allowed_media_host(host))
    }
}

/// Fetches one item, moving to the next referer on 401/403 only.
async fn download_one(
    fetcher: &GuardedFetcher,
    config: &ExtractorConfig,
    candidate: &MediaCandidate,
    referers: &[String],
) -> Result<Fetched, MediaError> {
    let attempts: Vec<Option<&str>> = if referers.is_empty() {
        vec![None]
    } else {
        referers.iter().map(|r| Some(r.as_str())).collect()
    };

    let mut refused_status = None;
    for referer in attempts {
        let mut options = FetchOptions::new(config.download_timeout)
            .with_max_redirects(config.max_redirects)
            .with_header(ACCEPT, MEDIA_ACCEPT);
        if let Some(referer) = referer {
            options = options.with_referer(referer);
        }

        let response = fetcher
            .fetch(&candidate.url, &config.media_policy, &options)
            .await?;
        if matches!(response.status, 401 | 403) {
            debug!(url = %candidate.url, referer, status = response.status, "media refused, trying next referer");
            refused_status = Some(response.status);
            continue;
        }
        return finish(candidate, response);
    }

    Err(MediaError::http_status(
        &candidate.url,
        refused_status.unwrap_or(403),
    ))
}

fn finish(candidate: &MediaCandidate, response: TransportResponse) -> Result<Fetched, MediaError> {
    if !response.is_success() {
        return Err(MediaError::http_status(&candidate.url, response.status));
    }
    if response.body.is_empty() {
        return Err(MediaError::empty_body(&candidate.url));
    }
    let mime_type = response.mime_type();
    let media_type = classify(&mime_type, &candidate.url, Some(candidate.requested_type))?;
    Ok(Fetched {
        url: candidate.url.clone(),
        buffer: response.body,
        media_type,
        mime_type,
    })
}

/// Assigns `<kind>-<NN>` filenames, numbering each kind from 1.
fn name_items(fetched: Vec<Fetched>) -> Vec<DownloadedMedia> {
    let mut counts = [0usize; 3];
    fetched
        .into_iter()
        .map(|item| {
            let slot = match item.media_type {
                MediaType::Image => 0,
                MediaType::Video => 1,
                MediaType::Document => 2,
            };
            counts[slot] += 1;
            let filename = media_filename(item.media_type, counts[slot], &item.mime_type, &item.url);
            DownloadedMedia {
                url: item.url,
                buffer: item.buffer,
                media_type: item.media_type,
                mime_type: item.mime_type,
                filename,
            }
        })
        .collect()
}
