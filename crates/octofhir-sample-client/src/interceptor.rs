//! Request/response observers attached to a [`SearchClient`](crate::client::SearchClient).
//!
//! Both paths run in attachment order. The client applies its own
//! [`CacheControlInterceptor`] after every attached interceptor when caching is
//! disabled.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, EXPIRES, HeaderValue, PRAGMA};
use reqwest::{Method, Request, StatusCode, Url};

/// A completed HTTP exchange as seen by response interceptors.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    /// Wall-clock time from sending the request until the body was read.
    pub elapsed: Duration,
}

pub trait ClientInterceptor: Send + Sync {
    /// Called before the request is sent; may mutate it in place.
    fn intercept_request(&self, _request: &mut Request) {}

    /// Called once per completed exchange, whatever its status.
    fn intercept_response(&self, _exchange: &Exchange) {}
}

/// Ordered list of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn ClientInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn ClientInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn before_request(&self, request: &mut Request) {
        for interceptor in &self.interceptors {
            interceptor.intercept_request(request);
        }
    }

    pub fn after_response(&self, exchange: &Exchange) {
        for interceptor in &self.interceptors {
            interceptor.intercept_response(exchange);
        }
    }
}

/// Forces intermediaries and the server to bypass their caches.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheControlInterceptor;

impl ClientInterceptor for CacheControlInterceptor {
    fn intercept_request(&self, request: &mut Request) {
        let headers = request.headers_mut();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));
    }
}

/// Running count and total elapsed time of completed exchanges.
#[derive(Debug, Default)]
pub struct ResponseTimeInterceptor {
    count: AtomicU64,
    total_millis: AtomicU64,
}

impl ResponseTimeInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.total_millis.fetch_add(millis, Ordering::AcqRel);
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of exchanges recorded since creation or the last reset.
    pub fn requests(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn total_millis(&self) -> u64 {
        self.total_millis.load(Ordering::Acquire)
    }

    /// Mean elapsed milliseconds, 0 when nothing has been recorded.
    pub fn average_millis(&self) -> f64 {
        let count = self.requests();
        if count == 0 {
            return 0.0;
        }
        self.total_millis() as f64 / count as f64
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Release);
        self.total_millis.store(0, Ordering::Release);
    }
}

impl ClientInterceptor for ResponseTimeInterceptor {
    fn intercept_response(&self, exchange: &Exchange) {
        self.record(exchange.elapsed);
    }
}

/// Emits a debug event for every request and response.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterceptor;

impl ClientInterceptor for LoggingInterceptor {
    fn intercept_request(&self, request: &mut Request) {
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
    }

    fn intercept_response(&self, exchange: &Exchange) {
        tracing::debug!(
            method = %exchange.method,
            url = %exchange.url,
            status = exchange.status.as_u16(),
            elapsed_ms = exchange.elapsed.as_millis() as u64,
            "received response"
        );
    }
}
