//! Request body parsing for handler groups.
//!
//! Accepts JSON and URL-encoded bodies and normalizes both into a JSON object.
//! Every failure maps to a client error; nothing here can take the process down.

use crate::error::AppError;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{header, StatusCode};
use serde_json::{Map, Value};

/// Parsed request body as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct Payload(pub Map<String, Value>);

#[derive(Debug, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Unknown(String),
}

fn body_kind(content_type: Option<&str>) -> BodyKind {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::UrlEncoded
    } else {
        BodyKind::Unknown(mime)
    }
}

/// Parse a JSON body that must be an object.
pub fn parse_json(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::MalformedBody(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::MalformedBody(e.to_string())),
    }
}

/// Parse a URL-encoded body; repeated keys keep the last value.
pub fn parse_urlencoded(bytes: &[u8]) -> Map<String, Value> {
    url::form_urlencoded::parse(bytes)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = body_kind(
            req.headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge
            } else {
                AppError::MalformedBody(rejection.body_text())
            }
        })?;

        if bytes.is_empty() {
            return Ok(Payload::default());
        }

        match kind {
            BodyKind::Json => parse_json(&bytes).map(Payload),
            BodyKind::UrlEncoded => Ok(Payload(parse_urlencoded(&bytes))),
            BodyKind::Unknown(mime) if mime.is_empty() => Err(AppError::UnsupportedMediaType(
                "missing Content-Type".to_string(),
            )),
            BodyKind::Unknown(mime) => Err(AppError::UnsupportedMediaType(mime)),
        }
    }
}
