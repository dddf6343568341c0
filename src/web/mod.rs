//! Response layer shared by all handlers.
//!
//! # Data Flow
//! ```text
//! values middleware attaches Values
//!     → handler returns data or web::Error
//!     → respond.rs (JSON encode, record status)
//!     → respond.rs respond_error (classify root cause, tag span)
//!     → request logger reads recorded status
//! ```

pub mod error;
pub mod respond;
pub mod values;

pub use error::{ApiError, Cause, Error, ErrorResponse, PublicError, ResultExt};
pub use respond::{respond, respond_error, RespondError, JSON_CONTENT_TYPE};
pub use values::Values;
