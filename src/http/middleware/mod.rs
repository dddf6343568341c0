//! Service middleware stack.
//!
//! # Data Flow
//! ```text
//! request
//!     → logger.rs (attach Values, log on the way out)
//!     → panics.rs (recover handler panics)
//!     → errors.rs (translate web::Error into JSON envelopes)
//!     → handler
//! ```

pub mod errors;
pub mod logger;
pub mod panics;

pub use errors::errors;
pub use logger::{values_middleware, RequestIdPolicy, X_REQUEST_ID};
pub use panics::{install_hook, panics};
