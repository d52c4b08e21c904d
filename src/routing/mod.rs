//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming viewer request (method, path, headers)
//!     → router.rs (behavior lookup, first match wins)
//!     → matcher.rs (evaluate path pattern)
//!     → behavior's viewer-request chain
//!     → Evaluation: Forward to origin, or Respond directly
//!
//! Route Compilation (at startup):
//!     BehaviorConfig[] + DefaultBehaviorConfig
//!     → Compile path patterns
//!     → Build stage chains against the shared store
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (wildcard matching only)
//! - Deterministic: same input always matches same behavior
//! - Declaration order is priority; the default behavior is the fallback

pub mod matcher;
pub mod router;

pub use matcher::{PathPattern, PatternError};
pub use router::{Behavior, ErrorResponse, Evaluation, Router, RoutingError};
