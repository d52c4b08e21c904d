//! Behavior lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled behaviors and their stage chains
//! - Look up the behavior for a request path
//! - Run the viewer-request and viewer-response chains
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) pattern scan in declaration order (route tables are small)
//! - Explicit default behavior rather than a silent no-match

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::{
    AllowedMethods, EdgeConfig, ErrorResponseConfig, RequestStageConfig, ResponseStageConfig,
};
use crate::functions::{
    FixedObjectRewrite, Outcome, Request, RequestChain, RequestStage, Response, ResponseChain,
    ResponseStage, RootRedirect, SecurityHeaders, StageAnomaly, StaticContentRewrite,
    StatusCodeRewrite, StripPrefixRewrite,
};
use crate::routing::matcher::{PathPattern, PatternError};
use crate::store::KeyValueStore;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("behavior `{behavior}`: {source}")]
    Pattern {
        behavior: String,
        #[source]
        source: PatternError,
    },
}

/// A compiled behavior.
#[derive(Debug)]
pub struct Behavior {
    pub name: String,
    /// `None` for the default behavior.
    pub pattern: Option<PathPattern>,
    pub origin: String,
    pub allowed_methods: AllowedMethods,
    pub viewer_request: RequestChain,
    pub viewer_response: ResponseChain,
}

/// Custom error page mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub http_status: u16,
    pub response_status: u16,
    pub response_page_path: String,
}

impl From<&ErrorResponseConfig> for ErrorResponse {
    fn from(config: &ErrorResponseConfig) -> Self {
        Self {
            http_status: config.http_status,
            response_status: config.response_status,
            response_page_path: config.response_page_path.clone(),
        }
    }
}

/// Result of routing one viewer request.
#[derive(Debug)]
pub struct Evaluation<'a> {
    pub behavior: &'a Behavior,
    pub outcome: Outcome,
    pub anomalies: Vec<StageAnomaly>,
}

/// The edge route table.
#[derive(Debug)]
pub struct Router {
    behaviors: Vec<Behavior>,
    default: Behavior,
    error_responses: Vec<ErrorResponse>,
}

pub const DEFAULT_BEHAVIOR: &str = "default";

impl Router {
    /// Compile the route table. Every stage shares `store`.
    pub fn from_config(
        config: &EdgeConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, RoutingError> {
        let behaviors = config
            .behaviors
            .iter()
            .map(|b| {
                let name = b.display_name().to_string();
                let pattern = PathPattern::parse(&b.path_pattern).map_err(|source| {
                    RoutingError::Pattern {
                        behavior: name.clone(),
                        source,
                    }
                })?;
                Ok(Behavior {
                    name,
                    pattern: Some(pattern),
                    origin: b.origin.clone(),
                    allowed_methods: b.allowed_methods,
                    viewer_request: request_chain(&b.viewer_request, &store),
                    viewer_response: response_chain(&b.viewer_response),
                })
            })
            .collect::<Result<Vec<_>, RoutingError>>()?;

        let d = &config.default_behavior;
        let default = Behavior {
            name: DEFAULT_BEHAVIOR.to_string(),
            pattern: None,
            origin: d.origin.clone(),
            allowed_methods: d.allowed_methods,
            viewer_request: request_chain(&d.viewer_request, &store),
            viewer_response: response_chain(&d.viewer_response),
        };

        tracing::debug!(
            behaviors = behaviors.len(),
            error_responses = config.error_responses.len(),
            "Route table compiled"
        );

        Ok(Self {
            behaviors,
            default,
            error_responses: config.error_responses.iter().map(ErrorResponse::from).collect(),
        })
    }

    /// First behavior whose pattern matches `path`, else the default.
    pub fn match_path(&self, path: &str) -> &Behavior {
        self.behaviors
            .iter()
            .find(|b| b.pattern.as_ref().is_some_and(|p| p.matches(path)))
            .unwrap_or(&self.default)
    }

    /// Route a viewer request and run its viewer-request chain.
    pub fn evaluate(&self, request: Request) -> Evaluation<'_> {
        let behavior = self.match_path(&request.uri);

        if !behavior.allowed_methods.allows(&request.method) {
            tracing::debug!(
                behavior = %behavior.name,
                method = %request.method,
                "Method not allowed by behavior"
            );
            return Evaluation {
                behavior,
                outcome: Outcome::Respond(Response::new(403, "Forbidden")),
                anomalies: Vec::new(),
            };
        }

        let output = behavior.viewer_request.run(request);
        Evaluation {
            behavior,
            outcome: output.outcome,
            anomalies: output.anomalies,
        }
    }

    /// Run the behavior's viewer-response chain.
    pub fn respond(&self, behavior: &Behavior, response: Response) -> Response {
        behavior.viewer_response.run(response)
    }

    /// Custom error page configured for an origin status.
    pub fn error_response(&self, status: u16) -> Option<&ErrorResponse> {
        self.error_responses.iter().find(|e| e.http_status == status)
    }

    /// All behaviors in evaluation order, default last.
    pub fn behaviors(&self) -> impl Iterator<Item = &Behavior> {
        self.behaviors.iter().chain(std::iter::once(&self.default))
    }
}

fn request_chain(configs: &[RequestStageConfig], store: &Arc<dyn KeyValueStore>) -> RequestChain {
    let stages = configs
        .iter()
        .map(|config| -> Box<dyn RequestStage> {
            match config {
                RequestStageConfig::FixedObject { object_key } => {
                    Box::new(FixedObjectRewrite::new(store.clone(), object_key.clone()))
                }
                RequestStageConfig::StripPrefix { prefix_key } => {
                    Box::new(StripPrefixRewrite::new(store.clone(), prefix_key.clone()))
                }
                RequestStageConfig::StaticContent {
                    base_path_key,
                    version_key,
                } => Box::new(StaticContentRewrite::new(
                    store.clone(),
                    base_path_key.clone(),
                    version_key.clone(),
                )),
                RequestStageConfig::RootRedirect { base_path_key } => {
                    Box::new(RootRedirect::new(store.clone(), base_path_key.clone()))
                }
            }
        })
        .collect();
    RequestChain::new(stages)
}

fn response_chain(configs: &[ResponseStageConfig]) -> ResponseChain {
    let stages = configs
        .iter()
        .map(|config| -> Box<dyn ResponseStage> {
            match config {
                ResponseStageConfig::StatusCode {
                    status,
                    description,
                } => {
                    let description = if description.is_empty() {
                        StatusCode::from_u16(*status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or_default()
                            .to_string()
                    } else {
                        description.clone()
                    };
                    Box::new(StatusCodeRewrite::new(*status, description))
                }
                ResponseStageConfig::SecurityHeaders(policy) => {
                    Box::new(SecurityHeaders::new(policy.clone()))
                }
            }
        })
        .collect();
    ResponseChain::new(stages)
}
