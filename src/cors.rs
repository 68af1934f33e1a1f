//! Origin admission policy and the CORS layer built on top of it.
//!
//! The policy is a pure decision over the request's `Origin` header, the
//! configured allow-list and the environment mode. The same decision drives
//! both the enforcement middleware (which rejects denied origins) and the
//! `tower-http` CORS layer (which emits response headers and answers
//! preflight requests).

use crate::config::{CorsConfig, Environment};
use crate::error::{AppError, AppResult};
use axum::http::{header, HeaderName, HeaderValue, Method};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Methods a cross-origin caller may use.
pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// How long browsers may cache a preflight answer (24 hours).
pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

static LOOPBACK_ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(localhost|127\.0\.0\.1)(:\d{1,5})?$").expect("valid loopback pattern")
});

static PRIVATE_LAN_ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://192\.168\.\d{1,3}\.\d{1,3}(:\d{1,5})?$")
        .expect("valid private LAN pattern")
});

/// `http(s)://localhost` or `http(s)://127.0.0.1`, with an optional port.
pub fn is_loopback_origin(origin: &str) -> bool {
    LOOPBACK_ORIGIN.is_match(origin)
}

/// `http(s)://192.168.x.x`, with an optional port.
pub fn is_private_lan_origin(origin: &str) -> bool {
    PRIVATE_LAN_ORIGIN.is_match(origin)
}

/// Outcome of evaluating one request origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header: curl, server-to-server, same-process tooling.
    NoOrigin,
    /// The allow-list contains `*`.
    Wildcard,
    /// The origin appears verbatim in the allow-list.
    Listed,
    /// Loopback origin admitted outside production.
    DevLoopback,
    /// Private LAN origin admitted outside production.
    DevLan,
    Denied,
}

impl OriginDecision {
    pub fn is_allowed(self) -> bool {
        !matches!(self, OriginDecision::Denied)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OriginDecision::NoOrigin => "no-origin",
            OriginDecision::Wildcard => "wildcard",
            OriginDecision::Listed => "listed",
            OriginDecision::DevLoopback => "dev-loopback",
            OriginDecision::DevLan => "dev-lan",
            OriginDecision::Denied => "denied",
        }
    }
}

/// Origin admission policy, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: Vec<String>,
    environment: Environment,
    allows_any: bool,
}

impl OriginPolicy {
    pub fn new(cors: &CorsConfig, environment: Environment) -> Self {
        Self {
            allowed_origins: cors.allowed_origins.clone(),
            allows_any: cors.allows_any(),
            environment,
        }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Decide whether `origin` may call the API. Pure; never logs.
    pub fn evaluate(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return OriginDecision::NoOrigin;
        };

        if self.allows_any {
            return OriginDecision::Wildcard;
        }

        if self.allowed_origins.iter().any(|o| o == origin) {
            return OriginDecision::Listed;
        }

        if !self.environment.is_production() {
            if is_loopback_origin(origin) {
                return OriginDecision::DevLoopback;
            }
            if is_private_lan_origin(origin) {
                return OriginDecision::DevLan;
            }
        }

        OriginDecision::Denied
    }

    /// Evaluate and log the decision, turning a denial into an error.
    pub fn check(&self, origin: Option<&str>) -> AppResult<OriginDecision> {
        let decision = self.evaluate(origin);
        let allowed = self.allowed_origins.join(",");

        match (decision, origin) {
            (OriginDecision::NoOrigin, _) | (_, None) => {
                tracing::debug!("CORS allow: request without origin");
                Ok(decision)
            }
            (OriginDecision::Denied, Some(origin)) => {
                tracing::warn!(
                    origin = %origin,
                    allowed = %allowed,
                    "CORS blocked: {}. Allowed: {}",
                    origin,
                    allowed
                );
                Err(AppError::CorsDenied(origin.to_string()))
            }
            (decision, Some(origin)) => {
                tracing::info!(
                    origin = %origin,
                    reason = decision.as_str(),
                    allowed = %allowed,
                    "CORS allow: {}",
                    origin
                );
                Ok(decision)
            }
        }
    }
}

/// Build the credentials-enabled CORS layer driven by `policy`.
///
/// The allowed origin is always echoed back; `*` is never sent because
/// credentials are enabled. Preflight requests are answered by this layer and
/// never reach the routers.
pub fn cors_layer(policy: Arc<OriginPolicy>) -> CorsLayer {
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts| {
        origin
            .to_str()
            .map(|o| policy.evaluate(Some(o)).is_allowed())
            .unwrap_or(false)
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(PREFLIGHT_MAX_AGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(origins: &[&str], env: &str) -> OriginPolicy {
        let cors = CorsConfig {
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
        };
        OriginPolicy::new(&cors, Environment::from_label(env))
    }

    #[test]
    fn test_absent_origin_always_allowed() {
        assert_eq!(policy(&[], "production").evaluate(None), OriginDecision::NoOrigin);
        assert_eq!(
            policy(&["https://a.com"], "development").evaluate(None),
            OriginDecision::NoOrigin
        );
    }

    #[test]
    fn test_listed_origin_allowed() {
        let p = policy(&["https://a.com", "https://b.com"], "production");
        assert_eq!(p.evaluate(Some("https://b.com")), OriginDecision::Listed);
        assert_eq!(p.evaluate(Some("https://c.com")), OriginDecision::Denied);
    }

    #[test]
    fn test_wildcard_admits_everything() {
        let p = policy(&["*"], "production");
        assert_eq!(p.evaluate(Some("https://anything.example")), OriginDecision::Wildcard);
    }

    #[test]
    fn test_dev_origins_outside_production() {
        let p = policy(&[], "development");
        assert_eq!(p.evaluate(Some("http://localhost:3000")), OriginDecision::DevLoopback);
        assert_eq!(p.evaluate(Some("http://127.0.0.1:8080")), OriginDecision::DevLoopback);
        assert_eq!(p.evaluate(Some("http://192.168.1.5:4000")), OriginDecision::DevLan);
    }

    #[test]
    fn test_dev_origins_denied_in_production() {
        let p = policy(&["https://a.com"], "production");
        for origin in ["http://localhost:3000", "http://127.0.0.1:8080", "http://192.168.1.5:4000"] {
            assert_eq!(p.evaluate(Some(origin)), OriginDecision::Denied, "{}", origin);
        }

        let listed = policy(&["http://localhost:3000"], "production");
        assert_eq!(listed.evaluate(Some("http://localhost:3000")), OriginDecision::Listed);
    }

    #[test]
    fn test_loopback_predicate() {
        assert!(is_loopback_origin("http://localhost"));
        assert!(is_loopback_origin("https://localhost:5173"));
        assert!(is_loopback_origin("http://127.0.0.1"));
        assert!(!is_loopback_origin("http://localhost.evil.com"));
        assert!(!is_loopback_origin("ftp://localhost"));
        assert!(!is_loopback_origin("http://127.0.0.2:3000"));
    }

    #[test]
    fn test_private_lan_predicate() {
        assert!(is_private_lan_origin("http://192.168.0.10"));
        assert!(is_private_lan_origin("https://192.168.1.5:4000"));
        assert!(!is_private_lan_origin("http://10.0.0.5:4000"));
        assert!(!is_private_lan_origin("http://192.168.1.5.evil.com"));
    }

    #[test]
    fn test_check_rejects_denied_origin() {
        let p = policy(&["https://a.com"], "production");
        let err = p.check(Some("https://evil.com")).unwrap_err();
        assert!(matches!(err, AppError::CorsDenied(ref o) if o == "https://evil.com"));
        assert_eq!(p.check(Some("https://a.com")).unwrap(), OriginDecision::Listed);
    }
}
