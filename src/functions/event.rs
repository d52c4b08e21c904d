//! Viewer event model.
//!
//! Field names follow the CDN function event shape so that events can be
//! read from and written to JSON unchanged (`statusCode`, `statusDescription`,
//! `headers.<name>.value`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Single-valued header as seen by edge functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub value: String,
}

impl Header {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Header map keyed by lowercase header name.
pub type Headers = BTreeMap<String, Header>;

/// Viewer request handed to request-phase stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    /// Absolute path, always starting with `/`, never carrying a query string.
    pub uri: String,
    #[serde(default)]
    pub headers: Headers,
}

impl Request {
    /// Create a request with no headers.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Headers::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new("GET", uri)
    }

    /// Set a header, normalising the name to lowercase.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), Header::new(value));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|h| h.value.as_str())
    }
}

/// Response produced by the origin or synthesised by a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    #[serde(default)]
    pub status_description: String,
    #[serde(default)]
    pub headers: Headers,
}

impl Response {
    pub fn new(status_code: u16, status_description: impl Into<String>) -> Self {
        Self {
            status_code,
            status_description: status_description.into(),
            headers: Headers::new(),
        }
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(302, "Found").with_header("location", location)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), Header::new(value));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|h| h.value.as_str())
    }

    /// Redirect target, if this response carries one.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}

/// Inbound event: `request` for viewer-request stages, `response` for
/// viewer-response stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
}
