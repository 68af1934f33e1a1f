use crate::cors::{OriginDecision, OriginPolicy};
use crate::error::AppResult;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Tag used in logs when a request carries no `Origin` header.
pub const NO_ORIGIN: &str = "no-origin";

/// Request ID wrapper for use in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Declared origin of a request, or `None` for non-browser callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub Option<String>);

impl RequestOrigin {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self(headers.get(header::ORIGIN).map(|value| {
            value
                .to_str()
                .map(str::to_string)
                .unwrap_or_else(|_| String::from_utf8_lossy(value.as_bytes()).into_owned())
        }))
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Origin string for logging, with the `no-origin` sentinel.
    pub fn label(&self) -> &str {
        self.0.as_deref().unwrap_or(NO_ORIGIN)
    }
}

/// Request context containing request metadata
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub origin: RequestOrigin,
    pub client_ip: String,
    pub user_agent: Option<String>,
    /// Filled in by the origin policy stage.
    pub decision: Option<OriginDecision>,
}

impl RequestContext {
    pub fn new(
        request_id: String,
        origin: RequestOrigin,
        client_ip: String,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            request_id,
            origin,
            client_ip,
            user_agent,
            decision: None,
        }
    }

    pub fn with_decision(mut self, decision: OriginDecision) -> Self {
        self.decision = Some(decision);
        self
    }
}

/// Extract client IP address from headers
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    // Check for X-Forwarded-For header (proxy/load balancer)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                return first_ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            return real_ip_str.to_string();
        }
    }

    "unknown".to_string()
}

/// Extract user agent from headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id: String = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Request context middleware - tags each request with its origin
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let headers = req.headers();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let origin = RequestOrigin::from_headers(headers);
    let client_ip = extract_client_ip(headers);
    let user_agent = extract_user_agent(headers);

    tracing::info!(
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        origin = %origin.label(),
        "Incoming request"
    );

    let context = RequestContext::new(request_id, origin, client_ip, user_agent);
    req.extensions_mut().insert(context);

    next.run(req).await
}

/// Origin policy middleware - rejects denied origins before any route runs
pub async fn origin_policy_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let origin = match req.extensions().get::<RequestContext>() {
        Some(context) => context.origin.clone(),
        None => RequestOrigin::from_headers(req.headers()),
    };

    let decision = policy.check(origin.as_deref())?;

    if let Some(context) = req.extensions_mut().remove::<RequestContext>() {
        req.extensions_mut().insert(context.with_decision(decision));
    }
    req.extensions_mut().insert(decision);

    Ok(next.run(req).await)
}
