//! Edge HTTP service.
//!
//! # Data Flow
//! ```text
//! Viewer connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → request.rs (HTTP head → edge Request)
//!     → routing::Router (behavior lookup + viewer-request chain)
//!     → synthetic response, or origin fetch
//!     → custom error page substitution
//!     → response.rs (viewer-response chain applied to the head)
//!     → Send to viewer
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeEdgeRequestId, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
