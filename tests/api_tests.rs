//! Integration tests for the school API pipeline.
//!
//! These drive the fully assembled router in-process, without binding a
//! socket, and check origin admission, preflight handling, body parsing,
//! dispatch and the terminal error handler.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Router};
use http_body_util::BodyExt;
use schoolapi::config::Config;
use schoolapi::db::MemoryStore;
use schoolapi::middleware_impls::RequestContext;
use schoolapi::routes::{create_router, RouteTable};
use schoolapi::state::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

fn config(origins: &str, env: &str, body_limit: Option<&str>) -> Config {
    let origins = origins.to_string();
    let env = env.to_string();
    let body_limit = body_limit.map(str::to_string);

    Config::from_lookup(move |key| match key {
        "FRONTEND_URL" => Some(origins.clone()),
        "NODE_ENV" => Some(env.clone()),
        "BODY_LIMIT_BYTES" => body_limit.clone(),
        _ => None,
    })
    .unwrap()
}

fn build(config: &Config, table: RouteTable) -> Router {
    let state = Arc::new(AppState::new(config, Arc::new(MemoryStore::new())));
    create_router(state, table, config.server.body_limit_bytes)
}

fn school_app(origins: &str, env: &str) -> Router {
    build(&config(origins, env, None), RouteTable::school().unwrap())
}

fn request(method: Method, uri: &str, origin: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match origin {
        Some(origin) => builder.header(header::ORIGIN, origin),
        None => builder,
    }
}

async fn send(app: Router, req: Request<Body>) -> Response {
    app.oneshot(req).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

mod liveness_tests {
    use super::*;

    #[tokio::test]
    async fn test_root_reports_running() {
        let app = school_app("https://a.com, https://b.com", "production");
        let response = send(app, request(Method::GET, "/", None).body(Body::empty()).unwrap()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "API is running");
        assert_eq!(body["allowed_origins"], json!(["https://a.com", "https://b.com"]));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_health_reports_environment() {
        let app = school_app("", "production");
        let response =
            send(app, request(Method::GET, "/health", None).body(Body::empty()).unwrap()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "production");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let app = school_app("", "development");
        let response = send(
            app,
            request(Method::GET, "/", None)
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(header_str(response.headers(), "x-request-id"), Some("req-123"));
    }
}

mod origin_tests {
    use super::*;

    #[tokio::test]
    async fn test_listed_origin_gets_credentialed_headers() {
        let app = school_app("https://a.com", "production");
        let response = send(
            app,
            request(Method::GET, "/", Some("https://a.com")).body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            header_str(headers, "access-control-allow-origin"),
            Some("https://a.com")
        );
        assert_eq!(header_str(headers, "access-control-allow-credentials"), Some("true"));
        assert!(header_str(headers, "access-control-expose-headers")
            .unwrap()
            .contains("x-request-id"));
    }

    #[tokio::test]
    async fn test_wildcard_echoes_origin() {
        let app = school_app("*", "production");
        let response = send(
            app,
            request(Method::GET, "/", Some("https://anyone.example"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_str(response.headers(), "access-control-allow-origin"),
            Some("https://anyone.example")
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_is_rejected() {
        let app = school_app("https://a.com", "production");
        let response = send(
            app,
            request(Method::GET, "/api/v1/students", Some("https://evil.com"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get("access-control-allow-origin").is_none());
        let body = body_json(response).await;
        assert_eq!(body["error"], "CORS_DENIED");
        assert!(body["message"].as_str().unwrap().contains("https://evil.com"));
    }

    #[tokio::test]
    async fn test_dev_origins_follow_environment() {
        for origin in ["http://localhost:3000", "http://127.0.0.1:8080", "http://192.168.1.5:4000"] {
            let dev = send(
                school_app("https://a.com", "development"),
                request(Method::GET, "/", Some(origin)).body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(dev.status(), StatusCode::OK, "{}", origin);
            assert_eq!(header_str(dev.headers(), "access-control-allow-origin"), Some(origin));

            let prod = send(
                school_app("https://a.com", "production"),
                request(Method::GET, "/", Some(origin)).body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(prod.status(), StatusCode::FORBIDDEN, "{}", origin);
        }
    }

    #[tokio::test]
    async fn test_context_records_decision() {
        async fn decision(Extension(ctx): Extension<RequestContext>) -> String {
            format!(
                "{}:{}",
                ctx.origin.label(),
                ctx.decision.map(|d| d.as_str()).unwrap_or("none")
            )
        }

        let config = config("https://a.com", "production", None);
        let table = RouteTable::new()
            .mount("/api/v1/probe", Router::new().route("/", get(decision)))
            .unwrap();

        let listed = send(
            build(&config, table),
            request(Method::GET, "/api/v1/probe", Some("https://a.com"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let bytes = listed.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"https://a.com:listed");

        let table = RouteTable::new()
            .mount("/api/v1/probe", Router::new().route("/", get(decision)))
            .unwrap();
        let anonymous = send(
            build(&config, table),
            request(Method::GET, "/api/v1/probe", None).body(Body::empty()).unwrap(),
        )
        .await;
        let bytes = anonymous.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"no-origin:no-origin");
    }
}

mod preflight_tests {
    use super::*;

    fn probe_table(hits: Arc<AtomicUsize>) -> RouteTable {
        let probe = Router::new().route(
            "/",
            post(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        );
        RouteTable::new().mount("/api/v1/probe", probe).unwrap()
    }

    fn preflight(origin: &str) -> Request<Body> {
        request(Method::OPTIONS, "/api/v1/probe", Some(origin))
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_is_answered_without_routing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let config = config("https://a.com", "production", None);
        let app = build(&config, probe_table(hits.clone()));

        let response = send(app, preflight("https://a.com")).await;

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(
            header_str(headers, "access-control-allow-origin"),
            Some("https://a.com")
        );
        assert_eq!(header_str(headers, "access-control-max-age"), Some("86400"));
        let methods = header_str(headers, "access-control-allow-methods").unwrap();
        for method in ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"] {
            assert!(methods.contains(method), "{} missing from {}", method, methods);
        }
        assert!(header_str(headers, "access-control-allow-headers")
            .unwrap()
            .contains("content-type"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preflight_from_denied_origin() {
        let hits = Arc::new(AtomicUsize::new(0));
        let config = config("https://a.com", "production", None);
        let app = build(&config, probe_table(hits.clone()));

        let response = send(app, preflight("https://evil.com")).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_actual_request_reaches_router() {
        let hits = Arc::new(AtomicUsize::new(0));
        let config = config("https://a.com", "production", None);
        let app = build(&config, probe_table(hits.clone()));

        let response = send(
            app,
            request(Method::POST, "/api/v1/probe", Some("https://a.com"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

mod resource_tests {
    use super::*;

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        request(method, uri, None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let app = school_app("", "development");

        let created = send(
            app.clone(),
            json_request(Method::POST, "/api/v1/students", json!({"name": "Ada", "grade": 5})),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body_json(created).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["collection"], "students");
        let uri = format!("/api/v1/students/{}", id);

        let patched = send(
            app.clone(),
            json_request(Method::PATCH, &uri, json!({"grade": 6})),
        )
        .await;
        assert_eq!(patched.status(), StatusCode::OK);
        let patched = body_json(patched).await;
        assert_eq!(patched["data"]["name"], "Ada");
        assert_eq!(patched["data"]["grade"], 6);

        let listed = send(
            app.clone(),
            request(Method::GET, "/api/v1/students?limit=10", None)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let listed = body_json(listed).await;
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["limit"], 10);

        let deleted = send(
            app.clone(),
            request(Method::DELETE, &uri, None).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = send(app, request(Method::GET, &uri, None).body(Body::empty()).unwrap()).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(missing).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_teacher_prefixes_share_collection() {
        let app = school_app("", "development");

        let created = send(
            app.clone(),
            json_request(Method::POST, "/api/teacher", json!({"name": "Grace"})),
        )
        .await;
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let fetched = send(
            app,
            request(Method::GET, &format!("/api/v1/teachers/{}", id), None)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(body_json(fetched).await["data"]["name"], "Grace");
    }

    #[tokio::test]
    async fn test_urlencoded_body() {
        let app = school_app("", "development");
        let response = send(
            app,
            request(Method::POST, "/api/v1/events", None)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("title=Science+Fair&day=3"))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["title"], "Science Fair");
        assert_eq!(body["data"]["day"], "3");
    }

    #[tokio::test]
    async fn test_malformed_json_is_client_error() {
        let app = school_app("", "development");
        let response = send(
            app,
            request(Method::POST, "/api/v1/exam", None)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"subject\": "))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "MALFORMED_BODY");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let config = config("", "development", Some("16"));
        let app = build(&config, RouteTable::school().unwrap());

        let response = send(
            app,
            json_request(
                Method::POST,
                "/api/v1/library",
                json!({"title": "A very long book title indeed"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["error"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_found() {
        let app = school_app("", "development");
        let response = send(
            app,
            request(Method::GET, "/api/v1/users/not-a-uuid", None)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod error_handler_tests {
    use super::*;

    async fn explode() -> StatusCode {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_unknown_route_is_structured() {
        let app = school_app("", "development");
        let response = send(
            app,
            request(Method::GET, "/api/v2/nothing", None).body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "ROUTE_NOT_FOUND");
        assert!(body["message"].as_str().unwrap().contains("/api/v2/nothing"));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let config = config("", "development", None);
        let table = RouteTable::new()
            .mount("/api/v1/broken", Router::new().route("/", get(explode)))
            .unwrap();
        let app = build(&config, table);

        let response = send(
            app.clone(),
            request(Method::GET, "/api/v1/broken", None).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("boom"));

        let after = send(app, request(Method::GET, "/", None).body(Body::empty()).unwrap()).await;
        assert_eq!(after.status(), StatusCode::OK);
    }
}
