//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! presenter.toml + environment
//!     → loader.rs (parse, deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → PresenterConfig (validated, immutable)
//!
//! routing table file (JSON/TOML)
//!     → loader.rs (parse into RoutingTable)
//!     → validation.rs (prefix and upstream checks)
//!     → ContentRouter (atomic swap on reload)
//!
//! On change / SIGHUP:
//!     watcher.rs detects change
//!     → loader.rs loads new routing table
//!     → validation.rs validates
//!     → ArcSwap::store of the new table
//! ```
//!
//! # Design Decisions
//! - Process config is immutable once loaded; only the routing table reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_routing_table, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, PresentationConfig, PresenterConfig,
    RoutingConfig, ServicesConfig, TemplatesConfig, TimeoutConfig,
};
