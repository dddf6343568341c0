//! Route handlers.
//!
//! Every handler answers through `web::respond` and fails with `web::Error`,
//! so clients only ever see JSON bodies or empty 204s.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::callbacks::{Callback, NewCallback};
use crate::http::server::AppState;
use crate::web::{respond, ApiError, Error, ResultExt, Values};

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

pub async fn health(values: Values) -> Result<Response, Error> {
    let health = Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    };
    respond(&values, &health, StatusCode::OK).context("responding to health check")
}

pub async fn create_callback(
    State(state): State<AppState>,
    values: Values,
    body: Bytes,
) -> Result<Response, Error> {
    let new: NewCallback = serde_json::from_slice(&body).map_err(|e| {
        Error::public(
            StatusCode::BAD_REQUEST,
            ApiError::new("invalid_json", e.to_string()),
        )
    })?;
    let callback = new.validate()?;

    tracing::info!(
        trace_id = %values.trace_id(),
        callback_id = %callback.id,
        url = %callback.url,
        "Callback registered"
    );
    state.callbacks.insert(callback.clone());

    respond(&values, &callback, StatusCode::CREATED).context("responding with new callback")
}

pub async fn get_callback(
    State(state): State<AppState>,
    values: Values,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let callback = find(&state, &id)?;
    respond(&values, &callback, StatusCode::OK).context("responding with callback")
}

pub async fn delete_callback(
    State(state): State<AppState>,
    values: Values,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let callback = find(&state, &id)?;
    state.callbacks.remove(&callback.id);

    tracing::info!(
        trace_id = %values.trace_id(),
        callback_id = %callback.id,
        "Callback removed"
    );
    respond(&values, &(), StatusCode::NO_CONTENT).context("responding to delete")
}

fn find(state: &AppState, id: &str) -> Result<Callback, Error> {
    let id = Uuid::parse_str(id).map_err(|_| {
        Error::public(
            StatusCode::BAD_REQUEST,
            ApiError::new("invalid_id", format!("'{}' is not a valid callback id", id)),
        )
    })?;

    state.callbacks.get(&id).ok_or_else(|| {
        Error::public(
            StatusCode::NOT_FOUND,
            ApiError::new("not_found", format!("callback {} does not exist", id)),
        )
    })
}
