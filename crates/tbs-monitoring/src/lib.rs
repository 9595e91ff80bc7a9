//! # TBS Monitoring
//!
//! Health and readiness detection for supervised processes.
//!
//! This crate provides:
//! - HTTP health probes (any response counts as healthy)
//! - Bounded retry budgets with a fatal or soft timeout policy
//! - Readiness detection from captured log output

pub mod http;
pub mod readiness;
pub mod wait;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::{check_http_health, HttpHealthProbe};
pub use readiness::{ReadinessScanner, ReadinessSignal};
pub use wait::{poll_until, TimeoutPolicy, WaitBudget, WaitOutcome};

/// Health check error types.
///
/// A refused connection or a timeout is not an error: it is an unhealthy
/// [`HealthCheckData`]. Errors are reserved for probes that can never work.
#[derive(Error, Debug)]
pub enum HealthCheckError {
    #[error("Health check endpoint invalid: {endpoint} - {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Health check request could not be built: {endpoint} - {reason}")]
    InvalidRequest { endpoint: String, reason: String },
}

/// Result type for health check operations.
pub type HealthCheckResult<T> = Result<T, HealthCheckError>;

/// Health check result data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckData {
    pub is_healthy: bool,
    pub checked_at: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub error_message: Option<String>,
}
