//! Redirects top-level viewer paths into the static site.

use std::sync::Arc;

use crate::functions::{Anomaly, Request, RequestStage, Response, StageOutput};
use crate::store::KeyValueStore;

/// Catch-all stage for paths outside the site base path.
///
/// - already under the base path → unchanged
/// - `/` → `302` to the base path
/// - a single segment such as `/page` → `302` to `<base path>/page`
/// - anything deeper → unchanged, left to other behaviors
#[derive(Debug)]
pub struct RootRedirect {
    store: Arc<dyn KeyValueStore>,
    base_path_key: String,
}

impl RootRedirect {
    pub fn new(store: Arc<dyn KeyValueStore>, base_path_key: impl Into<String>) -> Self {
        Self {
            store,
            base_path_key: base_path_key.into(),
        }
    }
}

/// `^/[^/]+$` without a regex.
fn is_single_segment(uri: &str) -> bool {
    uri.strip_prefix('/')
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

impl RequestStage for RootRedirect {
    fn name(&self) -> &'static str {
        "root_redirect"
    }

    fn on_request(&self, request: Request) -> StageOutput {
        let Some(base_path) = self.store.get(&self.base_path_key) else {
            return StageOutput::forward(request).with_anomaly(Anomaly::MissingConfig {
                key: self.base_path_key.clone(),
            });
        };

        if request.uri.starts_with(&base_path) {
            return StageOutput::forward(request);
        }

        if request.uri == "/" {
            return StageOutput::respond(Response::redirect(base_path));
        }

        if is_single_segment(&request.uri) {
            return StageOutput::respond(Response::redirect(format!("{}{}", base_path, request.uri)));
        }

        StageOutput::forward(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::Outcome;
    use crate::store::{keys, MemoryStore};

    fn stage() -> RootRedirect {
        let store = Arc::new(MemoryStore::from_pairs([(keys::SITE_BASE_PATH, "/site")]));
        RootRedirect::new(store, keys::SITE_BASE_PATH)
    }

    fn location(uri: &str) -> Option<String> {
        match stage().on_request(Request::get(uri)).outcome {
            Outcome::Respond(response) => {
                assert_eq!(response.status_code, 302);
                assert_eq!(response.status_description, "Found");
                response.location().map(str::to_string)
            }
            Outcome::Forward(_) => None,
        }
    }

    #[test]
    fn test_root_redirects_to_base_path() {
        assert_eq!(location("/").as_deref(), Some("/site"));
    }

    #[test]
    fn test_single_segment_redirects() {
        assert_eq!(location("/page").as_deref(), Some("/site/page"));
        assert_eq!(location("/favicon.ico").as_deref(), Some("/site/favicon.ico"));
    }

    #[test]
    fn test_passthrough() {
        for uri in ["/site", "/site/page", "/sitemap.xml", "/foo/bar", "/page/"] {
            let output = stage().on_request(Request::get(uri));
            assert_eq!(output.outcome, Outcome::Forward(Request::get(uri)), "uri {}", uri);
            assert!(output.anomaly.is_none());
        }
    }

    #[test]
    fn test_missing_base_path_passes_through() {
        let store = Arc::new(MemoryStore::from_pairs([(keys::API_PATH, "/api")]));
        let output = RootRedirect::new(store, keys::SITE_BASE_PATH).on_request(Request::get("/"));
        assert_eq!(output.outcome, Outcome::Forward(Request::get("/")));
        assert_eq!(output.anomaly.unwrap().kind(), "missing_config");
    }

    #[test]
    fn test_single_segment_detection() {
        assert!(is_single_segment("/a"));
        assert!(!is_single_segment("/"));
        assert!(!is_single_segment("/a/"));
        assert!(!is_single_segment("a"));
    }
}
