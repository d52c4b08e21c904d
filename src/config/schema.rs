//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.
//! The defaults reproduce the deployed distribution: the same store seed,
//! route table and error responses.

use serde::{Deserialize, Serialize};

use crate::functions::SecurityHeadersPolicy;
use crate::store::{import, keys, ConfigEntry};

/// Root configuration for the edge service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Key-value store contents.
    pub store: StoreConfig,

    /// Origins requests are forwarded to.
    pub origins: Vec<OriginConfig>,

    /// Path-pattern behaviors, evaluated in order.
    pub behaviors: Vec<BehaviorConfig>,

    /// Behavior used when no path pattern matches.
    pub default_behavior: DefaultBehaviorConfig,

    /// Custom error pages keyed by origin status.
    pub error_responses: Vec<ErrorResponseConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            store: StoreConfig::default(),
            origins: default_origins(),
            behaviors: default_behaviors(),
            default_behavior: DefaultBehaviorConfig::default(),
            error_responses: vec![ErrorResponseConfig {
                http_status: 404,
                response_status: 404,
                response_page_path: "/404.html".to_string(),
            }],
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Key-value store contents.
///
/// Inline entries are applied first, then the import file; the file wins on
/// duplicate keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Inline entries.
    pub entries: Vec<ConfigEntry>,

    /// Optional import document (`{"data": [{"key", "value"}]}`).
    pub import_path: Option<String>,

    /// Reload the import document when it changes on disk.
    pub watch: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            entries: import::default_entries(),
            import_path: None,
            watch: false,
        }
    }
}

/// Origin definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Unique origin name referenced by behaviors.
    pub name: String,

    /// Base URL, e.g. "http://127.0.0.1:9000".
    pub url: String,
}

/// Methods a behavior accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedMethods {
    GetHead,
    #[default]
    GetHeadOptions,
    All,
}

impl AllowedMethods {
    pub fn allows(&self, method: &str) -> bool {
        match self {
            AllowedMethods::GetHead => matches!(method, "GET" | "HEAD"),
            AllowedMethods::GetHeadOptions => matches!(method, "GET" | "HEAD" | "OPTIONS"),
            AllowedMethods::All => true,
        }
    }
}

/// Viewer-request stage definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestStageConfig {
    /// Serve one object for every path.
    FixedObject { object_key: String },

    /// Remove a viewer path prefix.
    StripPrefix { prefix_key: String },

    /// Resolve versioned static site paths.
    StaticContent {
        #[serde(default = "default_base_path_key")]
        base_path_key: String,
        #[serde(default = "default_version_key")]
        version_key: String,
    },

    /// Redirect top-level paths into the site.
    RootRedirect {
        #[serde(default = "default_base_path_key")]
        base_path_key: String,
    },
}

/// Viewer-response stage definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseStageConfig {
    /// Overwrite the status code. An empty description uses the canonical
    /// reason phrase.
    StatusCode {
        status: u16,
        #[serde(default)]
        description: String,
    },

    /// Apply the security headers policy.
    SecurityHeaders(SecurityHeadersPolicy),
}

fn default_base_path_key() -> String {
    keys::SITE_BASE_PATH.to_string()
}

fn default_version_key() -> String {
    keys::SITE_VERSION.to_string()
}

/// Path-pattern behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BehaviorConfig {
    /// Path pattern (`*` any run, `?` one character).
    pub path_pattern: String,

    /// Name for logs and metrics. Defaults to the path pattern.
    #[serde(default)]
    pub name: Option<String>,

    /// Origin name to forward to.
    pub origin: String,

    #[serde(default)]
    pub allowed_methods: AllowedMethods,

    #[serde(default)]
    pub viewer_request: Vec<RequestStageConfig>,

    #[serde(default)]
    pub viewer_response: Vec<ResponseStageConfig>,
}

impl BehaviorConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path_pattern)
    }
}

/// Behavior used when nothing else matches.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultBehaviorConfig {
    pub origin: String,

    #[serde(default)]
    pub allowed_methods: AllowedMethods,

    #[serde(default)]
    pub viewer_request: Vec<RequestStageConfig>,

    #[serde(default)]
    pub viewer_response: Vec<ResponseStageConfig>,
}

impl Default for DefaultBehaviorConfig {
    fn default() -> Self {
        Self {
            origin: STATIC_ORIGIN.to_string(),
            allowed_methods: AllowedMethods::GetHeadOptions,
            viewer_request: vec![RequestStageConfig::FixedObject {
                object_key: keys::NOT_FOUND_OBJECT.to_string(),
            }],
            viewer_response: vec![ResponseStageConfig::StatusCode {
                status: 404,
                description: "Not Found".to_string(),
            }],
        }
    }
}

/// Custom error page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponseConfig {
    /// Origin status that triggers the page.
    pub http_status: u16,

    /// Status returned to the viewer.
    pub response_status: u16,

    /// Viewer path of the page, routed like any other request.
    pub response_page_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin connection timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

pub const STATIC_ORIGIN: &str = "static";
pub const API_ORIGIN: &str = "api";
pub const OAUTH2_ORIGIN: &str = "oauth2";

fn default_origins() -> Vec<OriginConfig> {
    vec![
        OriginConfig {
            name: STATIC_ORIGIN.to_string(),
            url: "http://127.0.0.1:9000".to_string(),
        },
        OriginConfig {
            name: API_ORIGIN.to_string(),
            url: "http://127.0.0.1:3000".to_string(),
        },
        OriginConfig {
            name: OAUTH2_ORIGIN.to_string(),
            url: "http://127.0.0.1:4180".to_string(),
        },
    ]
}

fn static_behavior(path_pattern: &str, viewer_request: Vec<RequestStageConfig>) -> BehaviorConfig {
    BehaviorConfig {
        path_pattern: path_pattern.to_string(),
        name: None,
        origin: STATIC_ORIGIN.to_string(),
        allowed_methods: AllowedMethods::GetHeadOptions,
        viewer_request,
        viewer_response: vec![ResponseStageConfig::SecurityHeaders(SecurityHeadersPolicy::default())],
    }
}

fn proxy_behavior(path_pattern: &str, origin: &str, prefix_key: &str) -> BehaviorConfig {
    BehaviorConfig {
        path_pattern: path_pattern.to_string(),
        name: None,
        origin: origin.to_string(),
        allowed_methods: AllowedMethods::All,
        viewer_request: vec![RequestStageConfig::StripPrefix {
            prefix_key: prefix_key.to_string(),
        }],
        viewer_response: Vec::new(),
    }
}

fn default_behaviors() -> Vec<BehaviorConfig> {
    let fixed = |object_key: &str| {
        vec![RequestStageConfig::FixedObject {
            object_key: object_key.to_string(),
        }]
    };

    let mut not_found = static_behavior("/404.html", fixed(keys::NOT_FOUND_OBJECT));
    not_found.viewer_response.insert(
        0,
        ResponseStageConfig::StatusCode {
            status: 404,
            description: "Not Found".to_string(),
        },
    );

    vec![
        static_behavior(
            "/site*",
            vec![RequestStageConfig::StaticContent {
                base_path_key: default_base_path_key(),
                version_key: default_version_key(),
            }],
        ),
        proxy_behavior("/api/*", API_ORIGIN, keys::API_PATH),
        proxy_behavior("/oauth2/*", OAUTH2_ORIGIN, keys::OAUTH2_PROXY_PATH),
        static_behavior("/jwks/*", fixed(keys::JWKS_OBJECT)),
        static_behavior("/500.html", fixed(keys::SERVER_ERROR_OBJECT)),
        not_found,
        static_behavior("/404.css", Vec::new()),
        // Must stay last: it matches every path.
        static_behavior(
            "/*",
            vec![RequestStageConfig::RootRedirect {
                base_path_key: default_base_path_key(),
            }],
        ),
    ]
}
