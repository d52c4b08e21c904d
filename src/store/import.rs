//! Store import documents.
//!
//! The import format is the one the CDN key-value store accepts at creation
//! time:
//!
//! ```json
//! {"data": [{"key": "site_basePath", "value": "/site"}]}
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::keys;

/// A single store entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct ImportDocument {
    data: Vec<ConfigEntry>,
}

/// Errors raised while loading store contents.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store import {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid store import document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("store entry has an empty key")]
    EmptyKey,
}

/// Parse an import document.
pub fn parse_import(content: &str) -> Result<Vec<ConfigEntry>, StoreError> {
    let doc: ImportDocument = serde_json::from_str(content)?;
    if doc.data.iter().any(|e| e.key.is_empty()) {
        return Err(StoreError::EmptyKey);
    }
    Ok(doc.data)
}

/// Read and parse an import document from disk.
pub fn load_import(path: &Path) -> Result<Vec<ConfigEntry>, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_import(&content)
}

/// Render entries as an import document.
pub fn to_import(entries: &[ConfigEntry]) -> Result<String, StoreError> {
    let doc = ImportDocument {
        data: entries.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Entries seeded at deployment. The site version is absent on purpose: the
/// release process writes it once artifacts are uploaded.
pub fn default_entries() -> Vec<ConfigEntry> {
    vec![
        ConfigEntry::new(keys::NOT_FOUND_OBJECT, "404.html"),
        ConfigEntry::new(keys::SERVER_ERROR_OBJECT, "500.html"),
        ConfigEntry::new(keys::SITE_BASE_PATH, "/site"),
        ConfigEntry::new(keys::API_PATH, "/api"),
        ConfigEntry::new(keys::OAUTH2_PROXY_PATH, "/oauth2"),
        ConfigEntry::new(keys::JWKS_OBJECT, "jwks.json"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import() {
        let entries = parse_import(
            r#"{"data": [
                {"key": "site_basePath", "value": "/site"},
                {"key": "site_version", "value": "v1.0.0"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], ConfigEntry::new("site_version", "v1.0.0"));
    }

    #[test]
    fn test_parse_import_rejects_empty_key() {
        let err = parse_import(r#"{"data": [{"key": "", "value": "x"}]}"#).unwrap_err();
        assert!(matches!(err, StoreError::EmptyKey));
    }

    #[test]
    fn test_parse_import_rejects_wrong_shape() {
        assert!(matches!(
            parse_import(r#"[{"key": "a", "value": "b"}]"#),
            Err(StoreError::Parse(_))
        ));
    }

    #[test]
    fn test_default_entries_round_trip_through_import() {
        let rendered = to_import(&default_entries()).unwrap();
        assert_eq!(parse_import(&rendered).unwrap(), default_entries());
    }

    #[test]
    fn test_load_import_missing_file() {
        let err = load_import(Path::new("/nonexistent/kvs.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kvs.json"));
    }
}
