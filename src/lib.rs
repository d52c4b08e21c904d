//! Edge request rewrite engine.
//!
//! Viewer requests are matched to a behavior, passed through that behavior's
//! rewrite stages, and either answered directly or forwarded to an origin.

pub mod config;
pub mod functions;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::schema::EdgeConfig;
pub use functions::{Outcome, Request, Response};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Router;
pub use store::{KeyValueStore, MemoryStore};
