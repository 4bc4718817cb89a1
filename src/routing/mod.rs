//! Content routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host, path)
//!     → target.rs (host override, staging decode)
//!     → resolver.rs (load table snapshot)
//!     → table.rs (longest prefix match)
//!     → revision.rs (apply revision in staging)
//!     → ResolutionResult: Unmapped | EmptyEnvelope | ContentId
//!
//! Content ID (links, search results)
//!     → resolver.rs (strip revision in staging)
//!     → table.rs (lazy Mapping iterator over domains/prefixes)
//!     → url.rs (absolute site URL)
//! ```
//!
//! # Design Decisions
//! - Routing table loaded wholesale, immutable at runtime, swapped on reload
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always resolves the same way

pub mod resolver;
pub mod revision;
pub mod table;
pub mod target;
pub mod url;

pub use resolver::ContentRouter;
pub use revision::RevisionId;
pub use table::{DomainConfig, Mapping, ResolutionResult, RoutingTable, SiteProxies};
pub use target::RequestTarget;
