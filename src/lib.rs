//! Callback service library.

pub mod callbacks;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod web;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
