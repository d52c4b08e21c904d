//! Response handling and transformation.
//!
//! # Responsibilities
//! - Convert origin response heads into the edge `Response` model
//! - Write edge results back onto the HTTP response
//! - Build viewer responses for synthetic results
//!
//! # Design Decisions
//! - Origin bodies are streamed untouched; only the head is rewritten
//! - Headers an edge function did not change keep all their original values

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};

use crate::functions::{Header, Headers, Response};

/// Build the edge view of a response head.
pub fn to_edge_response(status: StatusCode, headers: &HeaderMap) -> Response {
    let mut response = Response::new(status.as_u16(), status.canonical_reason().unwrap_or_default());
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            response
                .headers
                .entry(name.as_str().to_string())
                .or_insert_with(|| Header::new(value));
        }
    }
    response
}

/// Apply the changes an edge function made (`before` → `after`) to the
/// original header map.
pub fn merge_headers(mut original: HeaderMap, before: &Headers, after: &Headers) -> HeaderMap {
    for name in before.keys().filter(|name| !after.contains_key(*name)) {
        original.remove(name.as_str());
    }

    for (name, header) in after {
        if before.get(name) == Some(header) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&header.value),
        ) {
            (Ok(name), Ok(value)) => {
                original.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid header set by edge function"),
        }
    }
    original
}

/// Status to send for an edge status code. Out-of-range codes become 500.
pub fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Viewer response for a result synthesised by an edge function.
pub fn synthetic_response(response: Response) -> HttpResponse {
    let headers = merge_headers(HeaderMap::new(), &Headers::new(), &response.headers);
    let mut http = (status_code(response.status_code), Body::empty()).into_response();
    http.headers_mut().extend(headers);
    http
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_redirect() {
        let http = synthetic_response(Response::redirect("/site/page"));
        assert_eq!(http.status(), StatusCode::FOUND);
        assert_eq!(http.headers().get("location").unwrap(), "/site/page");
    }

    #[test]
    fn test_merge_keeps_untouched_multi_values() {
        let mut original = HeaderMap::new();
        original.append("set-cookie", HeaderValue::from_static("a=1"));
        original.append("set-cookie", HeaderValue::from_static("b=2"));
        original.insert("x-amz-server-side-encryption", HeaderValue::from_static("aws:kms"));

        let before = to_edge_response(StatusCode::OK, &original);
        let mut after = before.clone();
        after.headers.remove("x-amz-server-side-encryption");
        after
            .headers
            .insert("x-frame-options".into(), Header::new("DENY"));

        let merged = merge_headers(original, &before.headers, &after.headers);
        assert_eq!(merged.get_all("set-cookie").iter().count(), 2);
        assert!(merged.get("x-amz-server-side-encryption").is_none());
        assert_eq!(merged.get("x-frame-options").unwrap(), "DENY");
    }

    #[test]
    fn test_invalid_header_dropped() {
        let mut after = Headers::new();
        after.insert("bad header".into(), Header::new("x"));
        let merged = merge_headers(HeaderMap::new(), &Headers::new(), &after);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_status_code_fallback() {
        assert_eq!(status_code(404), StatusCode::NOT_FOUND);
        assert_eq!(status_code(1000), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
