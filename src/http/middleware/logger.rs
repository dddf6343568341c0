//! Request values and request logging.
//!
//! # Responsibilities
//! - Attach `Values` (trace ID, start time) to every request
//! - Reuse an incoming X-Request-ID when configured to trust it
//! - Echo the trace ID back to the client
//! - Log and count each completed request with its final status
//!
//! # Design Decisions
//! - Must be the outermost of the service middlewares: everything below it
//!   requires the values
//! - The status recorded by the responder wins over the response status

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::observability::metrics;
use crate::web::Values;

pub const X_REQUEST_ID: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Where trace IDs come from.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdPolicy {
    /// Accept the client's X-Request-ID instead of generating one.
    pub trust_header: bool,
}

impl RequestIdPolicy {
    fn trace_id_for(&self, request: &Request) -> String {
        if self.trust_header {
            let incoming = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .filter(|v| is_valid_request_id(v));
            if let Some(id) = incoming {
                return id.to_string();
            }
        }
        Uuid::new_v4().to_string()
    }
}

fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic())
}

pub async fn values_middleware(
    State(policy): State<RequestIdPolicy>,
    mut request: Request,
    next: Next,
) -> Response {
    let values = Values::new(policy.trace_id_for(&request));
    request.extensions_mut().insert(values.clone());

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    if let Ok(header) = HeaderValue::from_str(values.trace_id()) {
        response.headers_mut().insert(X_REQUEST_ID, header);
    }

    let status: StatusCode = values.status_code().unwrap_or_else(|| response.status());
    let elapsed = values.started().elapsed();

    tracing::info!(
        trace_id = %values.trace_id(),
        method = %method,
        path = %path,
        status = status.as_u16(),
        latency_ms = elapsed.as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(method.as_str(), status.as_u16(), elapsed);

    response
}
