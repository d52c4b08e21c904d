//! Configuration key-value store.
//!
//! # Data Flow
//! ```text
//! Deployment (import JSON / inline config entries)
//!     → import.rs (parse {"data": [{key, value}]})
//!     → memory.rs (atomic snapshot swap)
//!     → stages read via KeyValueStore::get
//! ```
//!
//! # Design Decisions
//! - Read-only from the point of view of stages; the only write path is
//!   `MemoryStore::replace`, driven by startup and the reload watcher
//! - Empty values are reported as absent
//! - Lookups never fail; callers apply their own fallback

pub mod import;
pub mod keys;
pub mod memory;

pub use import::{ConfigEntry, StoreError};
pub use memory::MemoryStore;

/// Read access to deployment-time configuration values.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Returns the configured value for `key`, or `None` when the key is
    /// unknown or its value is empty.
    fn get(&self, key: &str) -> Option<String>;
}
