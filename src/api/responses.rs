//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic message response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
        }
    }

    /// Create an ok response
    pub fn ok(message: String) -> Self {
        Self::new("ok".to_string(), message)
    }
}

/// Response for the simulated work endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkResponse {
    pub elapsed_ms: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Query parameters for the simulated work endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkParams {
    /// How long the request should stay in flight
    pub ms: Option<u64>,
}
