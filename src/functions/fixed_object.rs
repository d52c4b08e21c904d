//! Fixed object rewrite.
//!
//! Every request routed here is served by one backing object, whatever
//! path the viewer asked for (error pages, the JWKS document).

use std::sync::Arc;

use crate::functions::{Anomaly, Request, RequestStage, StageOutput};
use crate::store::KeyValueStore;

#[derive(Debug)]
pub struct FixedObjectRewrite {
    store: Arc<dyn KeyValueStore>,
    object_key: String,
}

impl FixedObjectRewrite {
    /// `object_key` names the store entry holding the object name.
    pub fn new(store: Arc<dyn KeyValueStore>, object_key: impl Into<String>) -> Self {
        Self {
            store,
            object_key: object_key.into(),
        }
    }
}

impl RequestStage for FixedObjectRewrite {
    fn name(&self) -> &'static str {
        "fixed_object"
    }

    fn on_request(&self, mut request: Request) -> StageOutput {
        match self.store.get(&self.object_key) {
            Some(object) => {
                request.uri = format!("/{}", object);
                StageOutput::forward(request)
            }
            None => {
                // Degraded: serve the origin root rather than fail the request.
                request.uri = "/".to_string();
                StageOutput::forward(request).with_anomaly(Anomaly::MissingConfig {
                    key: self.object_key.clone(),
                })
            }
        }
    }
}
