//! Panic recovery middleware.
//!
//! # Responsibilities
//! - Run the downstream handler under `catch_unwind`
//! - Log the panic payload and the panic-site backtrace with the trace ID
//! - Keep the server task alive after a handler panic
//!
//! # Design Decisions
//! - The backtrace is captured by a panic hook on the panicking thread;
//!   after unwinding the stack of the handler is gone
//! - The slot is cleared before every poll of the handler, so a backtrace
//!   left by an unrelated panic on the same thread is never reported
//! - Panics that bypass the hook (`resume_unwind`) are logged with a
//!   backtrace of the recovery site, marked `backtrace_origin = "recovery"`
//! - No JSON body is produced for a panic, only an empty 500

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::future::{poll_fn, Future};
use std::panic::{self, AssertUnwindSafe};
use std::pin::pin;
use std::sync::Once;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use tracing::{field, Instrument, Span};

use crate::observability::metrics;
use crate::web::values::{self, Values};

thread_local! {
    static PANIC_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the panic hook that keeps the backtrace of the last panic on
/// each thread. Idempotent; the previously installed hook still runs.
pub fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture();
            let _ = PANIC_BACKTRACE.try_with(|slot| slot.replace(Some(backtrace)));
            previous(info);
        }));
    });
}

fn take_backtrace() -> Option<Backtrace> {
    PANIC_BACKTRACE
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()
}

/// Best effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

/// Middleware that turns a handler panic into logs and an empty 500.
pub async fn panics(request: Request, next: Next) -> Response {
    let span = tracing::info_span!("middleware.panics", trace_id = field::Empty);

    async move {
        let values = values::require(request.extensions());
        Span::current().record("trace_id", values.trace_id());

        let mut downstream = pin!(next.run(request));
        let guarded = poll_fn(move |cx| {
            // Stale backtrace from an earlier panic on this thread.
            take_backtrace();
            downstream.as_mut().poll(cx)
        });

        match AssertUnwindSafe(guarded).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => {
                recover(&values, &*payload);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

fn recover(values: &Values, payload: &(dyn Any + Send)) {
    let (backtrace, origin) = match take_backtrace() {
        Some(backtrace) => (backtrace, "panic_site"),
        None => (Backtrace::force_capture(), "recovery"),
    };

    tracing::error!(
        trace_id = %values.trace_id(),
        "panic: {}",
        panic_message(payload)
    );
    tracing::error!(
        trace_id = %values.trace_id(),
        backtrace_origin = origin,
        "{} :\n{}",
        values.trace_id(),
        backtrace
    );

    values.set_status_code(StatusCode::INTERNAL_SERVER_ERROR);
    metrics::record_panic();
}
