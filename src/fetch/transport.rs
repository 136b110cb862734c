//! HTTP transport seam and the reqwest-backed implementation.
//!
//! [`HttpTransport`] performs exactly one request/response exchange and never
//! follows redirects; redirect handling and host validation live in the
//! guarded fetcher on top of it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, ClientBuilder, Method, Proxy, redirect};
use tracing::warn;
use url::Url;

use super::FetchError;
use crate::user_agent;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// A single outgoing request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
}

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// URL that produced this response.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for statuses the guarded fetcher follows.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    /// Returns a header value as a string, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the lowercased MIME type without parameters, or an empty string.
    #[must_use]
    pub fn mime_type(&self) -> String {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs one HTTP exchange without following redirects.
///
/// # Object Safety
///
/// Uses `async_trait` so the guarded fetcher can hold `Arc<dyn HttpTransport>`
/// and tests can install an instrumented stub.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and reads the full response body.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, FetchError>;
}

/// Transport backed by a shared `reqwest::Client`.
///
/// The client is built with redirects disabled so every hop surfaces to the
/// guarded fetcher.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_body_bytes: usize,
}

impl ReqwestTransport {
    /// Builds a transport with the shared browser User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] when client construction fails.
    pub fn new(max_body_bytes: usize) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(&user_agent::default_user_agent())?,
            max_body_bytes,
        })
    }

    /// Returns the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, FetchError> {
        let url_text = request.url.to_string();
        let response = self
            .client
            .request(request.method, request.url.clone())
            .headers(request.headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::timeout(&url_text, Duration::from_secs(CONNECT_TIMEOUT_SECS))
                } else {
                    FetchError::network(&url_text, e)
                }
            })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();

        if let Some(length) = response.content_length()
            && length > self.max_body_bytes as u64
        {
            return Err(FetchError::body_too_large(&url_text, self.max_body_bytes));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(&url_text, e))?;
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::body_too_large(&url_text, self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(TransportResponse {
            url: request.url,
            status,
            headers,
            body,
        })
    }
}

/// Builds the shared HTTP client.
///
/// Some restricted sandbox environments panic when querying system proxy
/// settings; the fallback builder keeps env-proxy support while bypassing the
/// system lookup.
fn build_http_client(user_agent: &str) -> Result<Client, FetchError> {
    match try_build_client(user_agent, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(user_agent, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(FetchError::ClientBuild {
                    reason: "client construction panicked while initializing networking"
                        .to_string(),
                }),
                Err(BuildClientFailure::Build(error)) => Err(FetchError::ClientBuild {
                    reason: error.to_string(),
                }),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(FetchError::ClientBuild {
            reason: error.to_string(),
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    user_agent: &str,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let user_agent = user_agent.to_string();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(user_agent);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(user_agent: String) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(redirect::Policy::none())
        .user_agent(user_agent)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
