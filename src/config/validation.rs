//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (behaviors reference existing origins)
//! - Validate value ranges (timeouts > 0, status codes, addresses)
//! - Reject path patterns the router cannot compile
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{EdgeConfig, RequestStageConfig, ResponseStageConfig};
use crate::routing::router::DEFAULT_BEHAVIOR;
use crate::routing::PathPattern;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("duplicate origin `{0}`")]
    DuplicateOrigin(String),

    #[error("origin `{name}` has invalid url `{url}`: {reason}")]
    InvalidOriginUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("behavior `{behavior}` references unknown origin `{origin}`")]
    UnknownOrigin { behavior: String, origin: String },

    #[error("duplicate behavior `{0}`")]
    DuplicateBehavior(String),

    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPathPattern { pattern: String, reason: String },

    #[error("{context}: invalid status code {status}")]
    InvalidStatus { context: String, status: u16 },

    #[error("{context}: stage references an empty store key")]
    EmptyStoreKey { context: String },

    #[error("error page path `{0}` must start with `/`")]
    InvalidErrorPagePath(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    let mut origins = HashSet::new();
    for origin in &config.origins {
        if !origins.insert(origin.name.as_str()) {
            errors.push(ValidationError::DuplicateOrigin(origin.name.clone()));
        }
        match Url::parse(&origin.url) {
            Ok(url) if matches!(url.scheme(), "http") && url.host().is_some() => {}
            Ok(url) => errors.push(ValidationError::InvalidOriginUrl {
                name: origin.name.clone(),
                url: origin.url.clone(),
                reason: format!("unsupported scheme `{}` or missing host", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidOriginUrl {
                name: origin.name.clone(),
                url: origin.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let mut behaviors = HashSet::new();
    for behavior in &config.behaviors {
        let name = behavior.display_name();
        if !behaviors.insert(name) {
            errors.push(ValidationError::DuplicateBehavior(name.to_string()));
        }
        if let Err(e) = PathPattern::parse(&behavior.path_pattern) {
            errors.push(ValidationError::InvalidPathPattern {
                pattern: behavior.path_pattern.clone(),
                reason: e.to_string(),
            });
        }
        check_origin(name, &behavior.origin, &origins, &mut errors);
        check_stages(name, &behavior.viewer_request, &behavior.viewer_response, &mut errors);
    }

    let default = &config.default_behavior;
    check_origin(DEFAULT_BEHAVIOR, &default.origin, &origins, &mut errors);
    check_stages(DEFAULT_BEHAVIOR, &default.viewer_request, &default.viewer_response, &mut errors);

    for page in &config.error_responses {
        let context = format!("error response {}", page.http_status);
        for status in [page.http_status, page.response_status] {
            if !is_valid_status(status) {
                errors.push(ValidationError::InvalidStatus {
                    context: context.clone(),
                    status,
                });
            }
        }
        if !page.response_page_path.starts_with('/') {
            errors.push(ValidationError::InvalidErrorPagePath(page.response_page_path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_status(status: u16) -> bool {
    (100..=599).contains(&status)
}

fn check_origin(
    behavior: &str,
    origin: &str,
    origins: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    if !origins.contains(origin) {
        errors.push(ValidationError::UnknownOrigin {
            behavior: behavior.to_string(),
            origin: origin.to_string(),
        });
    }
}

fn check_stages(
    behavior: &str,
    request: &[RequestStageConfig],
    response: &[ResponseStageConfig],
    errors: &mut Vec<ValidationError>,
) {
    let context = || format!("behavior `{}`", behavior);

    for stage in request {
        let keys: Vec<&str> = match stage {
            RequestStageConfig::FixedObject { object_key } => vec![object_key.as_str()],
            RequestStageConfig::StripPrefix { prefix_key } => vec![prefix_key.as_str()],
            RequestStageConfig::StaticContent {
                base_path_key,
                version_key,
            } => vec![base_path_key.as_str(), version_key.as_str()],
            RequestStageConfig::RootRedirect { base_path_key } => vec![base_path_key.as_str()],
        };
        if keys.iter().any(|k| k.is_empty()) {
            errors.push(ValidationError::EmptyStoreKey { context: context() });
        }
    }

    for stage in response {
        if let ResponseStageConfig::StatusCode { status, .. } = stage {
            if !is_valid_status(*status) {
                errors.push(ValidationError::InvalidStatus {
                    context: context(),
                    status: *status,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{BehaviorConfig, OriginConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&EdgeConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EdgeConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.connect_secs = 0;
        config.origins.push(OriginConfig {
            name: "static".into(),
            url: "ftp://bucket".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: "not-an-address".into()
        }));
        assert!(errors.contains(&ValidationError::ZeroTimeout("connect_secs")));
        assert!(errors.contains(&ValidationError::DuplicateOrigin("static".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidOriginUrl { name, .. } if name == "static")));
    }

    #[test]
    fn test_behavior_checks() {
        let mut config = EdgeConfig::default();
        config.behaviors.push(BehaviorConfig {
            path_pattern: "".into(),
            name: Some("broken".into()),
            origin: "missing".into(),
            allowed_methods: Default::default(),
            viewer_request: vec![RequestStageConfig::StripPrefix {
                prefix_key: String::new(),
            }],
            viewer_response: vec![ResponseStageConfig::StatusCode {
                status: 99,
                description: String::new(),
            }],
        });
        config.behaviors.push(config.behaviors[0].clone());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateBehavior("/site*".into())));
        assert!(errors.contains(&ValidationError::UnknownOrigin {
            behavior: "broken".into(),
            origin: "missing".into()
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPathPattern { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::EmptyStoreKey { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidStatus { status: 99, .. })));
    }

    #[test]
    fn test_error_page_path() {
        let mut config = EdgeConfig::default();
        config.error_responses[0].response_page_path = "404.html".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidErrorPagePath("404.html".into())]);
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = EdgeConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
