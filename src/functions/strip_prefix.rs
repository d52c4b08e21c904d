//! Viewer path prefix removal ahead of API-style origins.

use std::sync::Arc;

use crate::functions::{Anomaly, Request, RequestStage, StageOutput};
use crate::store::KeyValueStore;

/// Replaces the URI with everything after the first occurrence of the
/// configured prefix.
#[derive(Debug)]
pub struct StripPrefixRewrite {
    store: Arc<dyn KeyValueStore>,
    prefix_key: String,
}

impl StripPrefixRewrite {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix_key: impl Into<String>) -> Self {
        Self {
            store,
            prefix_key: prefix_key.into(),
        }
    }
}

impl RequestStage for StripPrefixRewrite {
    fn name(&self) -> &'static str {
        "strip_prefix"
    }

    fn on_request(&self, mut request: Request) -> StageOutput {
        let Some(prefix) = self.store.get(&self.prefix_key) else {
            return StageOutput::forward(request).with_anomaly(Anomaly::MissingConfig {
                key: self.prefix_key.clone(),
            });
        };

        let Some(start) = request.uri.find(&prefix) else {
            let anomaly = Anomaly::PrefixAbsent {
                prefix,
                uri: request.uri.clone(),
            };
            return StageOutput::forward(request).with_anomaly(anomaly);
        };

        let rest = &request.uri[start + prefix.len()..];
        // The forwarded URI must stay absolute.
        request.uri = if rest.is_empty() { "/".to_string() } else { rest.to_string() };
        StageOutput::forward(request)
    }
}
