//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (values, panic recovery, error translation)
//!     → handlers.rs (callback routes)
//!     → web::respond (JSON out)
//! ```

pub mod handlers;
pub mod middleware;
pub mod server;

pub use middleware::X_REQUEST_ID;
pub use server::{build_router, with_middleware, AppState, HttpServer};
