use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;

use crate::error::{Result, SampleError};
use crate::interceptor::{CacheControlInterceptor, ClientInterceptor, Exchange, InterceptorChain};
use crate::model::Bundle;

const FHIR_JSON: &str = "application/fhir+json";

/// Whether responses may be served from caches along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachingMode {
    #[default]
    Enabled,
    Disabled,
}

impl CachingMode {
    pub fn is_disabled(self) -> bool {
        matches!(self, Self::Disabled)
    }
}

/// Search capability the batch runner depends on.
#[async_trait]
pub trait ResourceSearch: Send + Sync {
    /// Search `resource_type` for entries whose `field` equals `value`.
    async fn search(&self, resource_type: &str, field: &str, value: &str) -> Result<Bundle>;

    /// Stop using caches for every following request. There is no way back.
    fn disable_caching(&self);
}

pub struct SearchClientBuilder {
    base_url: String,
    interceptors: InterceptorChain,
    caching: CachingMode,
    timeout: Option<Duration>,
}

impl SearchClientBuilder {
    pub fn interceptor(mut self, interceptor: Arc<dyn ClientInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn caching(mut self, caching: CachingMode) -> Self {
        self.caching = caching;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SearchClient> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SampleError::config("server base URL is empty"));
        }
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        Ok(SearchClient {
            http: http.build()?,
            base_url,
            interceptors: self.interceptors,
            caching_disabled: AtomicBool::new(self.caching.is_disabled()),
        })
    }
}

/// FHIR REST search client with an interceptor chain.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    interceptors: InterceptorChain,
    caching_disabled: AtomicBool,
}

impl SearchClient {
    pub fn builder(base_url: impl Into<String>) -> SearchClientBuilder {
        SearchClientBuilder {
            base_url: base_url.into(),
            interceptors: InterceptorChain::new(),
            caching: CachingMode::Enabled,
            timeout: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn caching(&self) -> CachingMode {
        if self.caching_disabled.load(Ordering::Acquire) {
            CachingMode::Disabled
        } else {
            CachingMode::Enabled
        }
    }

    fn resource_url(&self, resource_type: &str) -> String {
        format!("{}/{}", self.base_url, resource_type)
    }

    pub async fn search(&self, resource_type: &str, field: &str, value: &str) -> Result<Bundle> {
        require_non_empty("resource type", resource_type)?;
        require_non_empty("search field", field)?;
        require_non_empty("search value", value)?;

        let mut request = self
            .http
            .get(self.resource_url(resource_type))
            .query(&[(field, value)])
            .header(ACCEPT, HeaderValue::from_static(FHIR_JSON))
            .build()?;

        self.interceptors.before_request(&mut request);
        if self.caching().is_disabled() {
            CacheControlInterceptor.intercept_request(&mut request);
        }

        let method = request.method().clone();
        let url = request.url().clone();
        let started = Instant::now();
        let resp = self.http.execute(request).await?;
        let status = resp.status();
        // Headers arrived, so the exchange is timed even if the body read fails.
        let body = resp.text().await;
        let exchange = Exchange {
            method,
            url,
            status,
            elapsed: started.elapsed(),
        };
        self.interceptors.after_response(&exchange);
        tracing::debug!(
            resource_type,
            field,
            value,
            status = status.as_u16(),
            elapsed_ms = exchange.elapsed.as_millis() as u64,
            "search completed"
        );

        handle_response(status, &body?)
    }
}

#[async_trait]
impl ResourceSearch for SearchClient {
    async fn search(&self, resource_type: &str, field: &str, value: &str) -> Result<Bundle> {
        SearchClient::search(self, resource_type, field, value).await
    }

    fn disable_caching(&self) {
        if !self.caching_disabled.swap(true, Ordering::AcqRel) {
            tracing::info!(base_url = %self.base_url, "caching disabled");
        }
    }
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SampleError::invalid_argument(format!("{what} must not be empty")));
    }
    Ok(())
}

fn handle_response(status: reqwest::StatusCode, body: &str) -> Result<Bundle> {
    if !status.is_success() {
        return Err(SampleError::ServerResponse {
            status: status.as_u16(),
            message: error_message(body),
        });
    }

    if body.is_empty() {
        return Ok(Bundle::default());
    }

    Ok(serde_json::from_str(body)?)
}

/// Diagnostics of an `OperationOutcome` body, or the raw body.
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body)
        && json.get("resourceType").and_then(|v| v.as_str()) == Some("OperationOutcome")
        && let Some(issues) = json.get("issue").and_then(|v| v.as_array())
    {
        let msgs: Vec<&str> = issues
            .iter()
            .filter_map(|i| i.get("diagnostics").and_then(|d| d.as_str()))
            .collect();
        if !msgs.is_empty() {
            return msgs.join("; ");
        }
    }
    body.to_string()
}
