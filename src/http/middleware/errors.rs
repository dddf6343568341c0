//! Error translation middleware.
//!
//! Handlers return `Result<_, web::Error>`. The error travels out of the
//! handler inside the response extensions and is turned into the JSON error
//! envelope here, where the request values are available.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::web::{self, respond_error, values};

#[derive(Clone)]
struct ErrorSlot(Arc<web::Error>);

impl IntoResponse for web::Error {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(ErrorSlot(Arc::new(self)));
        response
    }
}

pub async fn errors(request: Request, next: Next) -> Response {
    let values = values::require(request.extensions());

    let mut response = next.run(request).await;
    let Some(ErrorSlot(err)) = response.extensions_mut().remove::<ErrorSlot>() else {
        return response;
    };

    match err.as_public() {
        Some(public) => {
            tracing::warn!(
                trace_id = %values.trace_id(),
                code = public.code(),
                error = %err,
                "Request rejected"
            );
            metrics::record_error_response("public");
        }
        None => {
            tracing::error!(
                trace_id = %values.trace_id(),
                error = %err,
                "Request failed"
            );
            metrics::record_error_response("internal");
        }
    }

    match respond_error(&values, &err, err.status()) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                trace_id = %values.trace_id(),
                error = %e,
                "Failed to write error response"
            );
            values.set_status_code(StatusCode::INTERNAL_SERVER_ERROR);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
