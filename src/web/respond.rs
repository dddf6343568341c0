//! JSON responses and error translation.
//!
//! # Responsibilities
//! - Serialize handler output to JSON with the right status and headers
//! - Record the chosen status in the request values
//! - Map errors to public envelopes or a generic 500
//! - Tag the active span so failed requests stand out in traces
//!
//! # Design Decisions
//! - 204 responses carry neither body nor content type
//! - Serialization and build failures go back to the caller untouched
//! - Internal errors never leak their message; the caller's status is
//!   ignored for them

use axum::{
    body::Body,
    http::{self, header, StatusCode},
    response::Response,
};
use serde::Serialize;
use tracing::{field, Span};

use crate::web::error::{Cause, Error, ErrorResponse};
use crate::web::values::Values;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Error code put on spans for errors that are not public.
pub const SERVER_ERROR_CODE: &str = "server_error";

/// Failure while producing a response.
#[derive(Debug, thiserror::Error)]
pub enum RespondError {
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build response: {0}")]
    Build(#[from] http::Error),
}

impl From<RespondError> for Error {
    fn from(err: RespondError) -> Self {
        Error::internal(err)
    }
}

/// Serialize `data` as JSON and answer with `status`.
pub fn respond<T>(values: &Values, data: &T, status: StatusCode) -> Result<Response, RespondError>
where
    T: Serialize + ?Sized,
{
    values.set_status_code(status);

    if status == StatusCode::NO_CONTENT {
        let response = http::Response::builder()
            .status(status)
            .body(Body::empty())?;
        return Ok(response);
    }

    let body = serde_json::to_vec(data)?;

    let response = http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(Body::from(body))?;
    Ok(response)
}

/// Answer with the error envelope for `err`.
///
/// Public errors keep `status`; anything else becomes a bare 500.
pub fn respond_error(
    values: &Values,
    err: &Error,
    status: StatusCode,
) -> Result<Response, RespondError> {
    let span = tracing::info_span!(
        "web.respond_error",
        trace_id = %values.trace_id(),
        error = field::Empty,
        message = field::Empty,
        http.status_code = field::Empty,
        otel.status_code = field::Empty,
    );
    let _enter = span.enter();

    match err.root_cause() {
        Cause::Public(public) => {
            set_error_on_span(&span, public.code(), public.detail(), status);
            let body = ErrorResponse {
                error: public.code().to_string(),
                message: public.detail().to_string(),
            };
            respond(values, &body, status)
        }
        Cause::Internal(_) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            set_error_on_span(&span, SERVER_ERROR_CODE, "", status);
            let body = ErrorResponse {
                error: status.canonical_reason().unwrap_or_default().to_string(),
                message: String::new(),
            };
            respond(values, &body, status)
        }
    }
}

/// Mark the span as failed so trace UIs render it as an error.
fn set_error_on_span(span: &Span, code: &str, detail: &str, status: StatusCode) {
    span.record("error", code);
    if !detail.is_empty() {
        span.record("message", detail);
    }
    span.record("http.status_code", status.as_u16());
    span.record("otel.status_code", "ERROR");
}
