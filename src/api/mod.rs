//! HTTP client for the VCloud management API.
//!
//! [`ApiClient`] is the only component that talks to the network. Every
//! request is scoped to one cluster, authenticated with the provider token
//! and retried through [`RetryPolicy`] on transport failures and 5xx
//! responses.

pub mod retry;

pub use retry::RetryPolicy;

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response};
use serde::Serialize;
use tracing::debug;

use crate::config::HttpConfig;
use crate::telemetry;
use crate::{Result, VCloudError};

/// Header carrying the provider token on every request.
pub const TOKEN_HEADER: &str = "X-Provider-Token";

/// Authenticated, cluster-scoped client for the management API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client with the default timeout (60s) and retry policy.
    pub fn new(mgmt_url: &str, cluster_id: &str, token: impl Into<String>) -> Result<Self> {
        Self::with_http_config(mgmt_url, cluster_id, token, &HttpConfig::default())
    }

    /// Create a client with explicit timeout and retry settings.
    pub fn with_http_config(
        mgmt_url: &str,
        cluster_id: &str,
        token: impl Into<String>,
        config: &HttpConfig,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                VCloudError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: cluster_base_url(mgmt_url, cluster_id),
            token: token.into(),
            retry: config.retry_policy(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Cluster-scoped base URL all paths are appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/instances/abc`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, retrying transport failures and 5xx responses.
    ///
    /// Returns the last response observed. A 5xx on the final attempt comes
    /// back as `Ok(response)`; interpreting status codes is up to the caller.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<Response> {
        let url = self.url(path);
        retry::with_retry(
            &self.retry,
            method.as_str(),
            |resp: &Response| RetryPolicy::is_retryable_status(resp.status()),
            || self.attempt(method.clone(), &url, body),
        )
        .await
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::GET, path, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.request(Method::DELETE, path, None).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let bytes = serde_json::to_vec(body)?;
        self.request(Method::POST, path, Some(&bytes)).await
    }

    pub async fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let bytes = serde_json::to_vec(body)?;
        self.request(Method::PUT, path, Some(&bytes)).await
    }

    /// One attempt: fresh request, fresh timeout.
    async fn attempt(&self, method: Method, url: &str, body: Option<&[u8]>) -> Result<Response> {
        let mut builder = self
            .http
            .request(method.clone(), url)
            .header(TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.body(body.to_vec());
        }

        let start = Instant::now();
        let result = builder.send().await;
        let elapsed = start.elapsed();
        record_attempt(&method, &result, elapsed);

        match result {
            Ok(resp) => {
                debug!(%method, url, status = resp.status().as_u16(), "API response");
                Ok(resp)
            }
            Err(e) => {
                debug!(%method, url, error = %e, "API request failed");
                Err(VCloudError::from(e))
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn record_attempt(method: &Method, result: &reqwest::Result<Response>, elapsed: Duration) {
    let status = match result {
        Ok(resp) => resp.status().as_u16().to_string(),
        Err(_) => "error".to_string(),
    };
    metrics::counter!(telemetry::API_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::API_REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

/// Join the management URL with the cluster prefix.
///
/// The `/clusters/{id}` segment is inserted once; a management URL that is
/// already cluster-scoped is used as-is.
pub fn cluster_base_url(mgmt_url: &str, cluster_id: &str) -> String {
    let base = mgmt_url.trim_end_matches('/');
    if base.contains("/clusters/") {
        base.to_string()
    } else {
        format!("{base}/clusters/{cluster_id}")
    }
}

/// Read a response body as text for error messages, never failing.
pub(crate) async fn body_text(resp: Response) -> String {
    resp.text().await.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_prefix_inserted_once() {
        assert_eq!(
            cluster_base_url("https://api.example.com", "abc"),
            "https://api.example.com/clusters/abc"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(
            cluster_base_url("https://api.example.com/", "abc"),
            "https://api.example.com/clusters/abc"
        );
    }

    #[test]
    fn cluster_scoped_url_used_verbatim() {
        assert_eq!(
            cluster_base_url("https://api.example.com/clusters/xyz", "abc"),
            "https://api.example.com/clusters/xyz"
        );
    }

    #[test]
    fn url_appends_path() {
        let client = ApiClient::new("https://api.example.com", "abc", "token").unwrap();
        assert_eq!(
            client.url("/instances/i-1"),
            "https://api.example.com/clusters/abc/instances/i-1"
        );
    }

    #[test]
    fn debug_does_not_leak_token() {
        let client = ApiClient::new("https://api.example.com", "abc", "super-secret").unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
