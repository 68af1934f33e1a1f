use serde::Deserialize;
use url::Url;

/// Wildcard allow-list entry admitting every origin.
pub const WILDCARD_ORIGIN: &str = "*";

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins in configuration order (`*` admits every origin)
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Whether the allow-list contains the wildcard entry.
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == WILDCARD_ORIGIN)
    }

    /// Entries that do not look like a `scheme://host[:port]` origin.
    pub fn invalid_origins(&self) -> Vec<&str> {
        self.allowed_origins
            .iter()
            .filter(|o| o.as_str() != WILDCARD_ORIGIN)
            .filter(|o| match Url::parse(o) {
                Ok(url) => url.host_str().is_none(),
                Err(_) => true,
            })
            .map(String::as_str)
            .collect()
    }
}

/// Split a comma-separated `FRONTEND_URL` value, trimming each entry.
pub fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
