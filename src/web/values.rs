//! Request-scoped values.
//!
//! # Responsibilities
//! - Carry the trace ID and start time of a request
//! - Record the status code chosen by the responder for the request logger
//! - Treat a request without values as a wiring defect
//!
//! # Design Decisions
//! - One `Values` per request, shared by clone between the middleware that
//!   created it and the handler; the status is an atomic so no lock is needed
//! - Missing values terminate the process: they mean the middleware stack
//!   was assembled wrong, not that one request went bad

use std::convert::Infallible;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions, StatusCode},
};

/// Message logged right before the process exits on missing values.
pub const MISSING_VALUES: &str = "web value missing from context";

#[derive(Debug)]
struct Inner {
    trace_id: String,
    started: Instant,
    status_code: AtomicU16,
}

/// State attached to every request by the values middleware.
#[derive(Debug, Clone)]
pub struct Values {
    inner: Arc<Inner>,
}

impl Values {
    /// Create values for a request that starts now.
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                trace_id: trace_id.into(),
                started: Instant::now(),
                status_code: AtomicU16::new(0),
            }),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.inner.trace_id
    }

    pub fn started(&self) -> Instant {
        self.inner.started
    }

    /// Status recorded by the responder, if any response was produced yet.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self.inner.status_code.load(Ordering::Acquire) {
            0 => None,
            code => StatusCode::from_u16(code).ok(),
        }
    }

    pub fn set_status_code(&self, status: StatusCode) {
        self.inner
            .status_code
            .store(status.as_u16(), Ordering::Release);
    }
}

/// Fetch the values attached to a request, exiting the process if absent.
pub fn require(extensions: &Extensions) -> Values {
    match extensions.get::<Values>() {
        Some(values) => values.clone(),
        None => fatal_missing(),
    }
}

fn fatal_missing() -> ! {
    tracing::error!("{}", MISSING_VALUES);
    std::process::exit(1)
}

impl<S> FromRequestParts<S> for Values
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(require(&parts.extensions))
    }
}
