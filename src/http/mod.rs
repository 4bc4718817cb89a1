//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, request context)
//!     → proxy dispatch for proxied prefixes, else
//!     → api.rs (JSON API routes | presentation pipeline)
//!     → response.rs (HTML pages, JSON errors)
//!     → Send to client
//! ```

pub mod api;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
