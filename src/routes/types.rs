use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: usize = 50;

/// Largest page a client may request.
pub const MAX_LIMIT: usize = 100;

/// Query parameters for listing documents
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Liveness payload served at `/`
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub allowed_origins: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub environment: String,
    pub uptime_seconds: i64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
