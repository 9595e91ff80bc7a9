// HTTP health check implementation

use crate::{HealthCheckData, HealthCheckError, HealthCheckResult};
use chrono::Utc;
use http_body_util::Empty;
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// A reusable `GET` probe against one endpoint.
///
/// Liveness, not correctness: the backend is considered up as soon as it
/// answers at all, whatever the status code.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    endpoint: String,
    uri: Uri,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> HealthCheckResult<Self> {
        let endpoint = endpoint.into();
        let uri: Uri = endpoint.parse().map_err(|e| HealthCheckError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: format!("Invalid URI: {}", e),
        })?;

        if uri.scheme_str() != Some("http") || uri.host().is_none() {
            return Err(HealthCheckError::InvalidEndpoint {
                endpoint,
                reason: "expected an absolute http:// URL".to_string(),
            });
        }

        Ok(Self {
            endpoint,
            uri,
            timeout: request_timeout,
        })
    }

    /// `http://localhost:<port><path>`
    pub fn localhost(port: u16, path: &str, request_timeout: Duration) -> HealthCheckResult<Self> {
        Self::new(format!("http://localhost:{}{}", port, path), request_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One attempt. Connection failures and timeouts come back as unhealthy
    /// data, not errors.
    pub async fn check(&self) -> HealthCheckResult<HealthCheckData> {
        let start_time = Instant::now();

        let client = Client::builder(TokioExecutor::new()).build_http();

        let request = Request::builder()
            .method(Method::GET)
            .uri(self.uri.clone())
            .header("User-Agent", "tradebotctl/0.1")
            .body(Empty::<Bytes>::new())
            .map_err(|e| HealthCheckError::InvalidRequest {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let response = match timeout(self.timeout, client.request(request)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                debug!("HTTP health check connection failed: {} - {}", self.endpoint, e);
                return Ok(HealthCheckData {
                    is_healthy: false,
                    checked_at: Utc::now(),
                    status_code: None,
                    response_time_ms: Some(start_time.elapsed().as_millis() as u64),
                    error_message: Some(format!("Connection failed: {}", e)),
                });
            }
            Err(_) => {
                debug!("HTTP health check timeout: {}", self.endpoint);
                return Ok(HealthCheckData {
                    is_healthy: false,
                    checked_at: Utc::now(),
                    status_code: None,
                    response_time_ms: Some(self.timeout.as_millis() as u64),
                    error_message: Some("Timeout".to_string()),
                });
            }
        };

        let status = response.status();
        let elapsed = start_time.elapsed().as_millis() as u64;

        debug!(
            "HTTP health check complete: {} - status={} time={}ms",
            self.endpoint, status, elapsed
        );

        Ok(HealthCheckData {
            is_healthy: true,
            checked_at: Utc::now(),
            status_code: Some(status.as_u16()),
            response_time_ms: Some(elapsed),
            error_message: None,
        })
    }
}

/// Perform a single HTTP health check.
pub async fn check_http_health(
    endpoint: &str,
    check_timeout: Duration,
) -> HealthCheckResult<HealthCheckData> {
    HttpHealthProbe::new(endpoint, check_timeout)?.check().await
}
