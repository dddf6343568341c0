//! Middleware stack behaviour with purpose-built routes.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use callback_service::config::ServiceConfig;
use callback_service::http::{with_middleware, X_REQUEST_ID};
use callback_service::web::{respond, ApiError, Error, ResultExt, Values};

mod common;

use common::Capture;

async fn panicking_handler() -> &'static str {
    panic!("boom: callback table corrupted");
}

async fn resumed_panic() -> &'static str {
    std::panic::resume_unwind(Box::new("resumed: worker gone"))
}

async fn public_failure() -> Result<Response, Error> {
    Err(Error::public(
        StatusCode::PAYMENT_REQUIRED,
        ApiError::new("quota_exceeded", "upgrade your plan"),
    ))
}

async fn internal_failure() -> Result<Response, Error> {
    let _ = "not-a-number".parse::<u32>().internal()?;
    unreachable!()
}

async fn created(values: Values) -> Result<Response, Error> {
    Ok(respond(&values, &serde_json::json!({"ok": true}), StatusCode::CREATED)?)
}

async fn echo_trace_id(values: Values) -> String {
    values.trace_id().to_string()
}

fn app(config: &ServiceConfig) -> Router {
    let routes = Router::new()
        .route("/panic", get(panicking_handler))
        .route("/resumed", get(resumed_panic))
        .route("/public", get(public_failure))
        .route("/internal", get(internal_failure))
        .route("/created", get(created))
        .route("/trace", get(echo_trace_id));
    with_middleware(routes, config)
}

#[tokio::test]
async fn test_panic_is_recovered_and_logged() {
    let capture = Capture::default();
    let _guard = capture.install();

    let request = Request::builder()
        .uri("/panic")
        .header(X_REQUEST_ID, "trace-panic-1")
        .body(Body::empty())
        .unwrap();
    let response = common::send(app(&ServiceConfig::default()), request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    assert!(common::body_bytes(response).await.is_empty());

    let messages = capture.messages();
    assert!(messages
        .iter()
        .any(|m| m == "panic: boom: callback table corrupted"));

    let stack = messages
        .iter()
        .find(|m| m.starts_with("trace-panic-1 :\n"))
        .expect("stack trace logged with trace id");
    assert!(stack.len() > "trace-panic-1 :\n".len());

    let stack_event = capture
        .events()
        .into_iter()
        .find(|e| e.message().starts_with("trace-panic-1 :\n"))
        .unwrap();
    assert_eq!(stack_event.fields.get("backtrace_origin"), Some("panic_site"));

    let completed = capture
        .events()
        .into_iter()
        .find(|e| e.message() == "Request completed")
        .expect("request still logged");
    assert_eq!(completed.fields.get("status"), Some("500"));
}

#[tokio::test]
async fn test_earlier_panic_backtrace_is_not_reported() {
    let capture = Capture::default();
    let _guard = capture.install();

    let router = app(&ServiceConfig::default());

    // Leaves a backtrace on this thread that has nothing to do with the request.
    let earlier = std::panic::catch_unwind(|| panic!("unrelated panic"));
    assert!(earlier.is_err());

    let request = Request::builder()
        .uri("/resumed")
        .header(X_REQUEST_ID, "trace-resumed")
        .body(Body::empty())
        .unwrap();
    let response = common::send(router, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert!(capture
        .messages()
        .iter()
        .any(|m| m == "panic: resumed: worker gone"));

    let stack_event = capture
        .events()
        .into_iter()
        .find(|e| e.message().starts_with("trace-resumed :\n"))
        .expect("stack trace logged with trace id");
    assert_eq!(stack_event.fields.get("backtrace_origin"), Some("recovery"));
}

#[tokio::test]
async fn test_server_keeps_serving_after_panic() {
    let router = app(&ServiceConfig::default());

    let first = common::send(router.clone(), common::get("/panic")).await;
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let second = common::send(router, common::get("/created")).await;
    assert_eq!(second.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_public_error_keeps_status() {
    let response = common::send(app(&ServiceConfig::default()), common::get("/public")).await;

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json; charset=utf-8"
    );
    assert_eq!(
        common::body_json(response).await,
        serde_json::json!({"error": "quota_exceeded", "message": "upgrade your plan"})
    );
}

#[tokio::test]
async fn test_internal_error_is_opaque() {
    let capture = Capture::default();
    let _guard = capture.install();

    let response = common::send(app(&ServiceConfig::default()), common::get("/internal")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        common::body_json(response).await,
        serde_json::json!({"error": "Internal Server Error", "message": ""})
    );

    let failed = capture
        .events()
        .into_iter()
        .find(|e| e.message() == "Request failed")
        .expect("internal error logged");
    assert_eq!(failed.level, tracing::Level::ERROR);
    assert!(failed.fields.get("error").unwrap().contains("invalid digit"));
}

#[tokio::test]
async fn test_request_logger_reports_recorded_status() {
    let capture = Capture::default();
    let _guard = capture.install();

    let response = common::send(app(&ServiceConfig::default()), common::get("/created")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let completed = capture
        .events()
        .into_iter()
        .find(|e| e.message() == "Request completed")
        .unwrap();
    assert_eq!(completed.fields.get("status"), Some("201"));
    assert_eq!(completed.fields.get("path"), Some("/created"));
    assert_eq!(completed.fields.get("method"), Some("GET"));
}

#[tokio::test]
async fn test_trace_id_reaches_handler_and_client() {
    let request = Request::builder()
        .uri("/trace")
        .header(X_REQUEST_ID, "client-supplied-42")
        .body(Body::empty())
        .unwrap();
    let response = common::send(app(&ServiceConfig::default()), request).await;

    assert_eq!(
        response.headers().get(X_REQUEST_ID).unwrap(),
        "client-supplied-42"
    );
    assert_eq!(common::body_bytes(response).await, b"client-supplied-42");
}

#[tokio::test]
async fn test_untrusted_request_id_is_replaced() {
    let mut config = ServiceConfig::default();
    config.web.trust_request_id = false;

    let request = Request::builder()
        .uri("/trace")
        .header(X_REQUEST_ID, "client-supplied-42")
        .body(Body::empty())
        .unwrap();
    let response = common::send(app(&config), request).await;

    let header = response
        .headers()
        .get(X_REQUEST_ID)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_ne!(header, "client-supplied-42");
    assert_eq!(common::body_bytes(response).await, header.as_bytes());
}
