//! Network access for the client
//!
//! The client only needs "GET this URL and give me the body". Keeping that
//! behind a trait lets the load tester count requests with a decorator and
//! lets tests serve fixtures without a network.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::error::{RaasError, RaasResult};

/// Fetches resource bodies by URL
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one GET request and returns the body of a successful response
    async fn get(&self, url: &str) -> RaasResult<String>;
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::with_client(Client::new())
    }
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> RaasResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RaasError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }

    /// Create a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> RaasResult<String> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RaasError::network(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RaasError::network(url, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| RaasError::network(url, format!("failed to read response body: {}", e)))
    }
}

/// Decorator counting every request passed to the inner transport
#[derive(Clone)]
pub struct CountingTransport {
    inner: Arc<dyn Transport>,
    count: Arc<AtomicUsize>,
}

impl CountingTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self {
            inner,
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Requests issued since creation or the last reset
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn get(&self, url: &str) -> RaasResult<String> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.get(url).await
    }
}

/// Serves fixed bodies from memory; unknown URLs answer with a 404 error
///
/// Useful for offline runs and tests.
#[derive(Debug, Default)]
pub struct StaticTransport {
    bodies: Mutex<HashMap<String, String>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a body for a URL, replacing any previous one
    pub fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        self.bodies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), body.into());
    }

    pub fn with(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn get(&self, url: &str) -> RaasResult<String> {
        let bodies = self.bodies.lock().unwrap_or_else(|e| e.into_inner());
        bodies
            .get(url)
            .cloned()
            .ok_or_else(|| RaasError::network(url, "HTTP 404 Not Found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_transport_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"languages":{}}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).expect("client builds");
        let body = transport
            .get(&format!("{}/api/manifest.json", mock_server.uri()))
            .await
            .expect("request succeeds");

        assert_eq!(body, r#"{"languages":{}}"#);
    }

    #[tokio::test]
    async fn test_http_transport_maps_status_to_network_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::default();
        let err = transport
            .get(&format!("{}/api/manifest.json", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_network());
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_http_transport_connection_failure_is_network_error() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is not listening in test environments
        let err = transport.get("http://127.0.0.1:9/manifest.json").await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_counting_transport_counts_successes_and_failures() {
        let inner = Arc::new(StaticTransport::new().with("http://x/a", "A"));
        let counting = CountingTransport::new(inner);

        assert_eq!(counting.get("http://x/a").await.unwrap(), "A");
        assert!(counting.get("http://x/missing").await.is_err());
        assert_eq!(counting.count(), 2);

        // Clones share the counter
        let clone = counting.clone();
        clone.get("http://x/a").await.unwrap();
        assert_eq!(counting.count(), 3);

        counting.reset();
        assert_eq!(clone.count(), 0);
    }

    #[tokio::test]
    async fn test_static_transport_unknown_url() {
        let transport = StaticTransport::new();
        let err = transport.get("http://nowhere/x.json").await.unwrap_err();
        assert!(err.is_network());
    }
}
