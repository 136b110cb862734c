//! Scripted [`HttpTransport`] that records requests and tracks concurrency.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LOCATION, REFERER};
use url::Url;

use crate::fetch::{FetchError, HttpTransport, TransportRequest, TransportResponse};

/// A canned response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
    delay: Option<Duration>,
}

impl StubResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
            delay: None,
        }
    }

    pub fn bytes(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut response = Self::status(200).with_header(CONTENT_TYPE, content_type);
        response.body = body.into();
        response
    }

    pub fn html(body: &str) -> Self {
        Self::bytes("text/html; charset=utf-8", body.as_bytes())
    }

    pub fn json(body: &str) -> Self {
        Self::bytes("application/json", body.as_bytes())
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self::status(status).with_header(LOCATION, location)
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        self.headers.insert(name, HeaderValue::from_str(value).unwrap());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One request as seen by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub referer: Option<String>,
}

/// Transport answering from a route table; unrouted URLs get 404.
///
/// Referer-specific routes win over plain routes for the same URL.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, StubResponse>>,
    referer_routes: Mutex<HashMap<(String, String), StubResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, response: StubResponse) {
        self.routes.lock().unwrap().insert(route_key(url), response);
    }

    pub fn route_with_referer(&self, url: &str, referer: &str, response: StubResponse) {
        self.referer_routes
            .lock()
            .unwrap()
            .insert((route_key(url), referer.to_string()), response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &str, referer: Option<&str>) -> StubResponse {
        if let Some(referer) = referer
            && let Some(response) = self
                .referer_routes
                .lock()
                .unwrap()
                .get(&(url.to_string(), referer.to_string()))
        {
            return response.clone();
        }
        self.routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| StubResponse::status(404))
    }
}

/// Decrements the in-flight gauge even when the request future is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, FetchError> {
        let url = request.url.to_string();
        let referer = request
            .headers
            .get(REFERER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method.clone(),
            url: url.clone(),
            referer: referer.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let response = self.lookup(&url, referer.as_deref());
        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        Ok(TransportResponse {
            url: request.url,
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}

fn route_key(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), |parsed| parsed.to_string())
}
