//! Backend gateway subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline / API handler
//!     → mapping.rs  GET {mapping}/at/{presented}
//!     → content.rs  GET {content}/content/{id} | /assets | /search | /control
//!     → layout.rs   GET {layout}/{presented}/{key} | /error/{presented}/{code}
//!     → client.rs   timeouts, duration recording, error classification
//!     → BackendError: Unmapped | Upstream | ServiceUnavailable | ...
//! ```
//!
//! # Design Decisions
//! - Stateless: every call gets its request context passed in
//! - Callers never see raw transport errors
//! - 404 from search and control is an empty answer, not an error

pub mod client;
pub mod content;
pub mod error;
pub mod layout;
pub mod mapping;

pub use client::BackendClient;
pub use content::{ContentDoc, ContentOptions, SearchHit, SearchQuery, SearchResults};
pub use error::{BackendError, BackendResult, UpstreamBody};
pub use layout::Layout;
