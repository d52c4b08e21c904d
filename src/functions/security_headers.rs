//! Security response headers.
//!
//! # Responsibilities
//! - Strip storage encryption headers leaked by the bucket origin
//! - Override CSP, HSTS, framing, sniffing, referrer and XSS headers
//! - Add a restrictive `permissions-policy`
//!
//! Every header is overridden even when the origin already set one.

use serde::{Deserialize, Serialize};

use crate::functions::{Header, Response, ResponseStage};

const DEFAULT_CSP: &str = "default-src 'self'; \
    script-src 'self' https://assets.nhs.uk; \
    style-src 'self' 'unsafe-inline' https://assets.nhs.uk; \
    font-src 'self' https://assets.nhs.uk; \
    img-src 'self' data: https://assets.nhs.uk; \
    object-src 'none'; \
    base-uri 'self'; \
    frame-ancestors 'none';";

const DEFAULT_PERMISSIONS_POLICY: &str = "accelerometer=(), ambient-light-sensor=(), autoplay=(), \
    battery=(), camera=(), cross-origin-isolated=(), display-capture=(), document-domain=(), \
    encrypted-media=(), execution-while-not-rendered=(), execution-while-out-of-viewport=(), \
    gamepad=(), geolocation=(), gyroscope=(), hid=(), idle-detection=(), keyboard-map=(), \
    magnetometer=(), microphone=(), midi=(), otp-credentials=(), payment=(), \
    picture-in-picture=(), publickey-credentials-get=(), screen-wake-lock=(), serial=(), \
    speaker-selection=(), sync-xhr=(), usb=(), vertical-scroll=(), web-share=(), \
    window-placement=(), xr-spatial-tracking=()";

/// Header policy applied on the response path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityHeadersPolicy {
    pub content_security_policy: String,

    /// HSTS max-age in seconds.
    pub hsts_max_age_secs: u64,
    pub hsts_include_subdomains: bool,
    pub hsts_preload: bool,

    pub frame_options: String,
    pub referrer_policy: String,
    pub permissions_policy: String,

    /// Headers removed from origin responses.
    pub remove_headers: Vec<String>,
}

impl Default for SecurityHeadersPolicy {
    fn default() -> Self {
        Self {
            content_security_policy: DEFAULT_CSP.to_string(),
            hsts_max_age_secs: 365 * 24 * 60 * 60,
            hsts_include_subdomains: true,
            hsts_preload: true,
            frame_options: "DENY".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            permissions_policy: DEFAULT_PERMISSIONS_POLICY.to_string(),
            remove_headers: vec![
                "x-amz-server-side-encryption".to_string(),
                "x-amz-server-side-encryption-aws-kms-key-id".to_string(),
                "x-amz-server-side-encryption-bucket-key-enabled".to_string(),
            ],
        }
    }
}

impl SecurityHeadersPolicy {
    fn strict_transport_security(&self) -> String {
        let mut value = format!("max-age={}", self.hsts_max_age_secs);
        if self.hsts_include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.hsts_preload {
            value.push_str("; preload");
        }
        value
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    policy: SecurityHeadersPolicy,
}

impl SecurityHeaders {
    pub fn new(policy: SecurityHeadersPolicy) -> Self {
        Self { policy }
    }
}

impl ResponseStage for SecurityHeaders {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn on_response(&self, mut response: Response) -> Response {
        for name in &self.policy.remove_headers {
            response.headers.remove(&name.to_ascii_lowercase());
        }

        let policy = &self.policy;
        let overrides = [
            ("content-security-policy", policy.content_security_policy.clone()),
            ("strict-transport-security", policy.strict_transport_security()),
            ("x-content-type-options", "nosniff".to_string()),
            ("x-frame-options", policy.frame_options.clone()),
            ("referrer-policy", policy.referrer_policy.clone()),
            ("x-xss-protection", "1; mode=block".to_string()),
            ("permissions-policy", policy.permissions_policy.clone()),
        ];
        for (name, value) in overrides {
            response.headers.insert(name.to_string(), Header::new(value));
        }
        response
    }
}
