//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → routing table + store built once at startup
//!
//! On store import change:
//!     watcher.rs detects change
//!     → store::import parses the document
//!     → MemoryStore snapshot swapped atomically
//!     → stages observe new values on their next lookup
//! ```
//!
//! # Design Decisions
//! - Route table is immutable once loaded; changes require a restart
//! - Store values may change at runtime, which is why stages look them up
//!   per request
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_store, parse_config, ConfigError};
pub use schema::{
    AllowedMethods, BehaviorConfig, DefaultBehaviorConfig, EdgeConfig, ErrorResponseConfig,
    ListenerConfig, ObservabilityConfig, OriginConfig, RequestStageConfig, ResponseStageConfig,
    StoreConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
