//! Viewer request handling.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) for every viewer request
//! - Convert the HTTP request head into the edge `Request` model
//! - Prepare forwarded headers for the origin
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Edge functions see one value per header, lowercase names; the original
//!   header map (all values) is what gets forwarded
//! - Hop-by-hop headers are never forwarded

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request as HttpRequest, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::functions::{Header, Request};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Issues a fresh UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeEdgeRequestId;

impl MakeRequestId for MakeEdgeRequestId {
    fn make_request_id<B>(&mut self, _request: &HttpRequest<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID carried by `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Build the edge view of a viewer request.
///
/// The first value wins for repeated headers; values that are not valid
/// UTF-8 are not visible to edge functions.
pub fn to_edge_request(method: &Method, uri: &Uri, headers: &HeaderMap) -> Request {
    let mut request = Request::new(method.as_str(), uri.path());
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request
                .headers
                .entry(name.as_str().to_string())
                .or_insert_with(|| Header::new(value));
        }
    }
    request
}

/// Headers to send to the origin.
pub fn forwarded_headers(headers: &HeaderMap, request_id: &str) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len() + 1);
    for (name, value) in headers {
        if !HOP_BY_HOP.contains(&name.as_str()) {
            forwarded.append(name.clone(), value.clone());
        }
    }
    if let Ok(value) = HeaderValue::from_str(request_id) {
        forwarded.insert(X_REQUEST_ID, value);
    }
    forwarded
}
