//! Registered callbacks.
//!
//! Callbacks are validated on the way in and kept in memory for the
//! lifetime of the process.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::web::PublicError;

/// Body of a callback registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCallback {
    pub url: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    pub id: Uuid,
    pub url: String,
    pub payload: serde_json::Value,
}

/// Rejected callback registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCallback {
    detail: String,
}

impl InvalidCallback {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for InvalidCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid callback: {}", self.detail)
    }
}

impl PublicError for InvalidCallback {
    fn code(&self) -> &str {
        "invalid_callback"
    }

    fn detail(&self) -> &str {
        &self.detail
    }
}

impl NewCallback {
    /// Check the target URL and assign an ID.
    pub fn validate(self) -> Result<Callback, InvalidCallback> {
        let url = Url::parse(&self.url)
            .map_err(|e| InvalidCallback::new(format!("url: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(InvalidCallback::new(format!(
                "url: unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(InvalidCallback::new("url: missing host"));
        }

        Ok(Callback {
            id: Uuid::new_v4(),
            url: url.to_string(),
            payload: self.payload,
        })
    }
}

/// Thread-safe in-memory callback registry.
#[derive(Clone, Default)]
pub struct CallbackStore {
    inner: Arc<DashMap<Uuid, Callback>>,
}

impl CallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, callback: Callback) {
        self.inner.insert(callback.id, callback);
    }

    pub fn get(&self, id: &Uuid) -> Option<Callback> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    pub fn remove(&self, id: &Uuid) -> Option<Callback> {
        self.inner.remove(id).map(|(_, callback)| callback)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
