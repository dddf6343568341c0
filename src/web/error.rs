//! Error classification for API responses.
//!
//! # Responsibilities
//! - Define the public error capability (stable code + detail)
//! - Wrap handler errors with context while keeping their root cause
//! - Define the JSON error envelope sent to clients
//!
//! # Design Decisions
//! - Public errors are recognised by capability (`PublicError`), not by type
//! - `?` on a public error keeps it public, whatever else it implements
//! - Internal errors are opted into with `Error::internal` or
//!   `ResultExt::internal` and never leak detail to the client

use std::error::Error as StdError;
use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// An error whose code and detail can be shown to API users.
pub trait PublicError: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Stable machine-readable code, e.g. `not_found`.
    fn code(&self) -> &str;

    /// Human-readable detail. May be empty.
    fn detail(&self) -> &str;

    /// Status answered when the error is converted with `?`.
    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// General purpose public error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    code: String,
    detail: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.detail)
        }
    }
}

impl PublicError for ApiError {
    fn code(&self) -> &str {
        &self.code
    }

    fn detail(&self) -> &str {
        &self.detail
    }
}

/// Root cause of an [`Error`].
#[derive(Debug)]
pub enum Cause {
    Public(Box<dyn PublicError>),
    Internal(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Public(e) => write!(f, "{}", e),
            Cause::Internal(e) => write!(f, "{}", e),
        }
    }
}

/// Error returned by handlers.
///
/// Context added with [`Error::context`] is kept for logs only; the
/// response is decided by the root cause.
#[derive(Debug)]
pub struct Error {
    cause: Cause,
    /// Innermost first.
    context: Vec<String>,
    status: StatusCode,
}

impl Error {
    /// A public error answered with `status`.
    pub fn public(status: StatusCode, err: impl PublicError) -> Self {
        Self {
            cause: Cause::Public(Box::new(err)),
            context: Vec::new(),
            status,
        }
    }

    /// An internal error. Always answered with 500.
    pub fn internal(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            cause: Cause::Internal(err.into()),
            context: Vec::new(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wrap the error with a message describing what was being done.
    pub fn context(mut self, msg: impl Into<String>) -> Self {
        self.context.push(msg.into());
        self
    }

    pub fn root_cause(&self) -> &Cause {
        &self.cause
    }

    /// The root cause, if it is a public error.
    pub fn as_public(&self) -> Option<&dyn PublicError> {
        match &self.cause {
            Cause::Public(e) => Some(e.as_ref()),
            Cause::Internal(_) => None,
        }
    }

    /// Status requested by whoever raised the error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for msg in self.context.iter().rev() {
            write!(f, "{}: ", msg)?;
        }
        write!(f, "{}", self.cause)
    }
}

impl<P: PublicError> From<P> for Error {
    fn from(err: P) -> Self {
        let status = err.status();
        Error::public(status, err)
    }
}

/// Conversions from arbitrary results into [`Error`].
pub trait ResultExt<T, E> {
    /// Wrap the error with context. Public errors stay public.
    fn context(self, msg: impl Into<String>) -> Result<T, Error>
    where
        E: Into<Error>;

    /// Treat the error as internal: logged, answered with a bare 500.
    fn internal(self) -> Result<T, Error>
    where
        E: Into<Box<dyn StdError + Send + Sync>>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> Result<T, Error>
    where
        E: Into<Error>,
    {
        self.map_err(|e| e.into().context(msg))
    }

    fn internal(self) -> Result<T, Error>
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        self.map_err(Error::internal)
    }
}

/// JSON body sent on failure paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
