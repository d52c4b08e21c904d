//! Versioned static site resolution.
//!
//! Maps a viewer path under the site base path to a version-qualified
//! object path in the content bucket.
//!
//! ```text
//! /site                      → /<current>/index.html
//! /site/page/                → /<current>/index.html
//! /site/v0.9.9/files/a.css   → /v0.9.9/files/a.css
//! /site/pr-1234              → /pr-1234/index.html
//! /sitepage                  → /404.html
//! ```
//!
//! # Resolution order
//! 1. Exactly one release tag (`vMAJOR.MINOR.PATCH`) in the tail selects it.
//! 2. Otherwise exactly one preview tag (`pr-N`) selects it.
//! 3. Otherwise the current version applies and the tail is kept whole.
//!    This includes tails with several tags of the same kind.
//!
//! The remainder after the tag must be empty or start with `/`. A remainder
//! containing a `.` names a file; anything else is a route served by the
//! version's `index.html`.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::functions::{Anomaly, Outcome, Request, RequestStage, StageOutput};
use crate::store::KeyValueStore;

/// Object path served for URIs that cannot be resolved.
pub const NOT_FOUND_PATH: &str = "/404.html";

static RELEASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v\d+\.\d+\.\d+").expect("Invalid release tag regex"));

static PREVIEW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pr-\d+").expect("Invalid preview tag regex"));

/// Version selector embedded in a site path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "tag", rename_all = "snake_case")]
pub enum VersionTag {
    /// Released build, e.g. `v1.2.3`.
    Release(String),
    /// Pull request preview build, e.g. `pr-1234`.
    Preview(String),
}

impl VersionTag {
    pub fn as_str(&self) -> &str {
        match self {
            VersionTag::Release(tag) | VersionTag::Preview(tag) => tag,
        }
    }

    /// Locate the single unambiguous tag in `tail`.
    ///
    /// Returns the tag and everything after it. Text before the tag is
    /// dropped; routing only sends paths where the tag directly follows the
    /// base path.
    pub fn find(tail: &str) -> Option<(VersionTag, &str)> {
        if let Some(m) = single_match(&RELEASE_PATTERN, tail) {
            return Some((VersionTag::Release(m.as_str().to_string()), &tail[m.end()..]));
        }
        if let Some(m) = single_match(&PREVIEW_PATTERN, tail) {
            return Some((VersionTag::Preview(m.as_str().to_string()), &tail[m.end()..]));
        }
        None
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn single_match<'t>(pattern: &Regex, haystack: &'t str) -> Option<regex::Match<'t>> {
    let mut matches = pattern.find_iter(haystack);
    match (matches.next(), matches.next()) {
        (Some(m), None) => Some(m),
        _ => None,
    }
}

fn is_well_formed(remaining: &str) -> bool {
    remaining.is_empty() || remaining.starts_with('/')
}

/// Origin path for `remaining` under `version`, or `None` when the
/// remainder is malformed.
pub fn origin_path(version: &str, remaining: &str) -> Option<String> {
    if !is_well_formed(remaining) {
        None
    } else if remaining.contains('.') {
        Some(format!("/{}{}", version, remaining))
    } else {
        Some(format!("/{}/index.html", version))
    }
}

/// Request stage resolving site paths to versioned objects.
#[derive(Debug)]
pub struct StaticContentRewrite {
    store: Arc<dyn KeyValueStore>,
    base_path_key: String,
    version_key: String,
}

impl StaticContentRewrite {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        base_path_key: impl Into<String>,
        version_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            base_path_key: base_path_key.into(),
            version_key: version_key.into(),
        }
    }

    fn resolve(&self, uri: &str) -> (String, Option<Anomaly>) {
        let Some(base_path) = self.store.get(&self.base_path_key) else {
            return (
                uri.to_string(),
                Some(Anomaly::MissingConfig {
                    key: self.base_path_key.clone(),
                }),
            );
        };

        let Some(start) = uri.find(&base_path) else {
            return (
                NOT_FOUND_PATH.to_string(),
                Some(Anomaly::BasePathAbsent {
                    base_path,
                    uri: uri.to_string(),
                }),
            );
        };
        let tail = &uri[start + base_path.len()..];

        let (version, remaining) = match VersionTag::find(tail) {
            Some((tag, remaining)) => (Some(tag.as_str().to_string()), remaining),
            None => (self.store.get(&self.version_key), tail),
        };

        let Some(version) = version else {
            let anomaly = if is_well_formed(remaining) {
                Anomaly::VersionUnavailable {
                    uri: uri.to_string(),
                }
            } else {
                Anomaly::MalformedUri {
                    uri: uri.to_string(),
                }
            };
            return (NOT_FOUND_PATH.to_string(), Some(anomaly));
        };

        match origin_path(&version, remaining) {
            Some(path) => (path, None),
            None => (
                NOT_FOUND_PATH.to_string(),
                Some(Anomaly::MalformedUri {
                    uri: uri.to_string(),
                }),
            ),
        }
    }
}

impl RequestStage for StaticContentRewrite {
    fn name(&self) -> &'static str {
        "static_content"
    }

    fn on_request(&self, mut request: Request) -> StageOutput {
        let (uri, anomaly) = self.resolve(&request.uri);
        request.uri = uri;
        StageOutput {
            outcome: Outcome::Forward(request),
            anomaly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{keys, MemoryStore};

    fn stage_with(pairs: &[(&str, &str)]) -> StaticContentRewrite {
        let store = Arc::new(MemoryStore::from_pairs(pairs.iter().copied()));
        StaticContentRewrite::new(store, keys::SITE_BASE_PATH, keys::SITE_VERSION)
    }

    fn stage() -> StaticContentRewrite {
        stage_with(&[(keys::SITE_BASE_PATH, "/site"), (keys::SITE_VERSION, "v1.0.0")])
    }

    fn rewrite(uri: &str) -> String {
        stage()
            .on_request(Request::get(uri))
            .outcome
            .request()
            .unwrap()
            .uri
            .clone()
    }

    #[test]
    fn test_current_version_routes() {
        let cases = [
            "/site",
            "/site/",
            "/site/page",
            "/site/page/",
            "/site/area1/area2/page",
            "/site/area1/area2/page/",
        ];
        for uri in cases {
            assert_eq!(rewrite(uri), "/v1.0.0/index.html", "uri {}", uri);
        }
    }

    #[test]
    fn test_release_tag_routes() {
        let cases = [
            "/site/v0.9.9",
            "/site/v0.9.9/",
            "/site/v0.9.9/page",
            "/site/v0.9.9/page/",
            "/site/v0.9.9/area1/area2/page",
            "/site/v0.9.9/area1/area2/page/",
        ];
        for uri in cases {
            assert_eq!(rewrite(uri), "/v0.9.9/index.html", "uri {}", uri);
        }
    }

    #[test]
    fn test_preview_tag_routes() {
        let cases = [
            "/site/pr-1234",
            "/site/pr-1234/",
            "/site/pr-1234/page",
            "/site/pr-1234/page/",
            "/site/pr-1234/area1/area2/page",
            "/site/pr-1234/area1/area2/page/",
        ];
        for uri in cases {
            assert_eq!(rewrite(uri), "/pr-1234/index.html", "uri {}", uri);
        }
    }

    #[test]
    fn test_static_files() {
        assert_eq!(rewrite("/site/file.ext"), "/v1.0.0/file.ext");
        assert_eq!(rewrite("/site/files/file.ext"), "/v1.0.0/files/file.ext");
        assert_eq!(rewrite("/site/v0.9.9/file.ext"), "/v0.9.9/file.ext");
        assert_eq!(rewrite("/site/v0.9.9/files/file.ext"), "/v0.9.9/files/file.ext");
        assert_eq!(rewrite("/site/pr-1234/file.ext"), "/pr-1234/file.ext");
        assert_eq!(rewrite("/site/pr-1234/files/file.ext"), "/pr-1234/files/file.ext");
    }

    #[test]
    fn test_malformed() {
        for uri in ["/sitepage", "/site/v0.9.9page", "/site/pr-1234page"] {
            let output = stage().on_request(Request::get(uri));
            assert_eq!(output.outcome.request().unwrap().uri, NOT_FOUND_PATH, "uri {}", uri);
            assert_eq!(output.anomaly.unwrap().kind(), "malformed_uri");
        }
    }

    #[test]
    fn test_release_tag_wins_over_preview_tag() {
        assert_eq!(rewrite("/site/v2.0.0/pr-7/app.js"), "/v2.0.0/pr-7/app.js");
    }

    // Several tags of the same kind are treated as no tag at all. The intent
    // behind this fallback is not established; these cases pin current behavior.
    #[test]
    fn test_ambiguous_tags_fall_back_to_current_version() {
        assert_eq!(rewrite("/site/pr-1/pr-2/page"), "/v1.0.0/index.html");
        // The dots inside the leftover tags count as a file extension.
        assert_eq!(rewrite("/site/v0.9.9/v0.9.8/page"), "/v1.0.0/v0.9.9/v0.9.8/page");
        assert_eq!(rewrite("/site/v0.9.9/v0.9.8/app.js"), "/v1.0.0/v0.9.9/v0.9.8/app.js");
    }

    #[test]
    fn test_two_releases_one_preview_uses_preview() {
        assert_eq!(rewrite("/site/pr-5/v1.0.0/v1.0.1"), "/pr-5/v1.0.0/v1.0.1");
        assert_eq!(rewrite("/site/pr-5/v1/v2"), "/pr-5/index.html");
    }

    #[test]
    fn test_tags_inside_base_path_ignored() {
        let stage = stage_with(&[(keys::SITE_BASE_PATH, "/v9.9.9"), (keys::SITE_VERSION, "v1.0.0")]);
        let output = stage.on_request(Request::get("/v9.9.9/page"));
        assert_eq!(output.outcome.request().unwrap().uri, "/v1.0.0/index.html");
    }

    #[test]
    fn test_missing_base_path_passes_through() {
        let stage = stage_with(&[(keys::SITE_VERSION, "v1.0.0")]);
        let output = stage.on_request(Request::get("/site/page"));
        assert_eq!(output.outcome.request().unwrap().uri, "/site/page");
        assert_eq!(output.anomaly.unwrap().kind(), "missing_config");
    }

    #[test]
    fn test_missing_current_version() {
        let stage = stage_with(&[(keys::SITE_BASE_PATH, "/site")]);

        let untagged = stage.on_request(Request::get("/site/page"));
        assert_eq!(untagged.outcome.request().unwrap().uri, NOT_FOUND_PATH);
        assert_eq!(untagged.anomaly.unwrap().kind(), "version_unavailable");

        let tagged = stage.on_request(Request::get("/site/v0.9.9/page"));
        assert_eq!(tagged.outcome.request().unwrap().uri, "/v0.9.9/index.html");
        assert!(tagged.anomaly.is_none());
    }

    #[test]
    fn test_base_path_absent_from_uri() {
        let output = stage().on_request(Request::get("/other"));
        assert_eq!(output.outcome.request().unwrap().uri, NOT_FOUND_PATH);
        assert_eq!(output.anomaly.unwrap().kind(), "base_path_absent");
    }

    #[test]
    fn test_version_tag_find() {
        let (tag, rest) = VersionTag::find("/v1.2.3/a").unwrap();
        assert_eq!(tag, VersionTag::Release("v1.2.3".into()));
        assert_eq!(rest, "/a");

        let (tag, rest) = VersionTag::find("/pr-42").unwrap();
        assert_eq!(tag.to_string(), "pr-42");
        assert_eq!(rest, "");

        assert!(VersionTag::find("/v1.2/a").is_none());
        assert!(VersionTag::find("/page").is_none());
    }

    #[test]
    fn test_origin_path() {
        assert_eq!(origin_path("v1.0.0", "").as_deref(), Some("/v1.0.0/index.html"));
        assert_eq!(origin_path("v1.0.0", "/a/b.js").as_deref(), Some("/v1.0.0/a/b.js"));
        assert_eq!(origin_path("v1.0.0", "a"), None);
    }
}
