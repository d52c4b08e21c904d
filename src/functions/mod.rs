//! Edge rewrite functions.
//!
//! # Data Flow
//! ```text
//! Viewer request
//!     → chain.rs (RequestChain, in route order)
//!         → fixed_object.rs | strip_prefix.rs | static_content.rs | root_redirect.rs
//!     → Forward(Request)  → origin fetch
//!     → Respond(Response) → short-circuit, nothing downstream runs
//!
//! Origin response
//!     → chain.rs (ResponseChain)
//!         → status_code.rs | security_headers.rs
//!     → Viewer
//! ```
//!
//! # Design Decisions
//! - Every stage is a pure function of (input, store snapshot)
//! - Stages never fail; degraded cases are reported as an `Anomaly`
//!   alongside a usable outcome
//! - Stages do not log; the chain records anomalies

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub mod chain;
pub mod event;
pub mod fixed_object;
pub mod root_redirect;
pub mod security_headers;
pub mod static_content;
pub mod status_code;
pub mod strip_prefix;

pub use chain::{ChainOutput, RequestChain, ResponseChain, StageAnomaly};
pub use event::{EdgeEvent, Header, Headers, Request, Response};
pub use fixed_object::FixedObjectRewrite;
pub use root_redirect::RootRedirect;
pub use security_headers::{SecurityHeaders, SecurityHeadersPolicy};
pub use static_content::{StaticContentRewrite, VersionTag, NOT_FOUND_PATH};
pub use status_code::StatusCodeRewrite;
pub use strip_prefix::StripPrefixRewrite;

/// Result of a request-phase stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Continue with the (possibly rewritten) request.
    Forward(Request),
    /// Answer the viewer directly.
    Respond(Response),
}

impl Outcome {
    pub fn request(&self) -> Option<&Request> {
        match self {
            Outcome::Forward(r) => Some(r),
            Outcome::Respond(_) => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::Forward(_) => None,
            Outcome::Respond(r) => Some(r),
        }
    }
}

/// Degraded-but-handled condition observed by a stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    #[error("store key `{key}` is missing or empty")]
    MissingConfig { key: String },

    #[error("prefix `{prefix}` not found in `{uri}`")]
    PrefixAbsent { prefix: String, uri: String },

    #[error("base path `{base_path}` not found in `{uri}`")]
    BasePathAbsent { base_path: String, uri: String },

    #[error("malformed uri `{uri}`")]
    MalformedUri { uri: String },

    #[error("no version tag in `{uri}` and no current version configured")]
    VersionUnavailable { uri: String },
}

impl Anomaly {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Anomaly::MissingConfig { .. } => "missing_config",
            Anomaly::PrefixAbsent { .. } => "prefix_absent",
            Anomaly::BasePathAbsent { .. } => "base_path_absent",
            Anomaly::MalformedUri { .. } => "malformed_uri",
            Anomaly::VersionUnavailable { .. } => "version_unavailable",
        }
    }
}

/// Outcome of one request stage plus anything worth flagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub outcome: Outcome,
    pub anomaly: Option<Anomaly>,
}

impl StageOutput {
    pub fn forward(request: Request) -> Self {
        Self {
            outcome: Outcome::Forward(request),
            anomaly: None,
        }
    }

    pub fn respond(response: Response) -> Self {
        Self {
            outcome: Outcome::Respond(response),
            anomaly: None,
        }
    }

    pub fn with_anomaly(mut self, anomaly: Anomaly) -> Self {
        self.anomaly = Some(anomaly);
        self
    }
}

/// A viewer-request function.
pub trait RequestStage: Send + Sync + fmt::Debug {
    /// Stage kind, used in logs and metrics.
    fn name(&self) -> &'static str;

    fn on_request(&self, request: Request) -> StageOutput;
}

/// A viewer-response function.
pub trait ResponseStage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn on_response(&self, response: Response) -> Response;
}
