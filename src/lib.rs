//! Content presenter library.
//!
//! Maps presented URLs to content IDs across domains, fetches documents and
//! layouts from the backend services, and renders the result.

pub mod backend;
pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod presentation;
pub mod proxy;
pub mod routing;

pub use config::schema::PresenterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::ContentRouter;
