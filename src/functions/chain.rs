//! Ordered stage chains.

use serde::Serialize;

use crate::functions::{Anomaly, Outcome, Request, RequestStage, Response, ResponseStage};
use crate::observability::metrics;

/// Anomaly tagged with the stage that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageAnomaly {
    pub stage: &'static str,
    #[serde(flatten)]
    pub anomaly: Anomaly,
}

/// Result of running a request chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    pub outcome: Outcome,
    pub anomalies: Vec<StageAnomaly>,
}

/// Viewer-request stages in execution order.
#[derive(Debug, Default)]
pub struct RequestChain {
    stages: Vec<Box<dyn RequestStage>>,
}

impl RequestChain {
    pub fn new(stages: Vec<Box<dyn RequestStage>>) -> Self {
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order. The first `Respond` ends the chain.
    pub fn run(&self, request: Request) -> ChainOutput {
        let mut anomalies = Vec::new();
        let mut request = request;

        for stage in &self.stages {
            let output = stage.on_request(request);

            if let Some(anomaly) = output.anomaly {
                tracing::warn!(stage = stage.name(), kind = anomaly.kind(), "{}", anomaly);
                metrics::record_anomaly(stage.name(), anomaly.kind());
                anomalies.push(StageAnomaly {
                    stage: stage.name(),
                    anomaly,
                });
            }

            match output.outcome {
                Outcome::Forward(next) => {
                    tracing::trace!(stage = stage.name(), uri = %next.uri, "Stage forwarded request");
                    request = next;
                }
                Outcome::Respond(response) => {
                    tracing::debug!(
                        stage = stage.name(),
                        status = response.status_code,
                        "Stage produced response"
                    );
                    return ChainOutput {
                        outcome: Outcome::Respond(response),
                        anomalies,
                    };
                }
            }
        }

        ChainOutput {
            outcome: Outcome::Forward(request),
            anomalies,
        }
    }
}

/// Viewer-response stages in execution order.
#[derive(Debug, Default)]
pub struct ResponseChain {
    stages: Vec<Box<dyn ResponseStage>>,
}

impl ResponseChain {
    pub fn new(stages: Vec<Box<dyn ResponseStage>>) -> Self {
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, response: Response) -> Response {
        self.stages
            .iter()
            .fold(response, |response, stage| stage.on_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{RootRedirect, StageOutput, StatusCodeRewrite, StripPrefixRewrite};
    use crate::store::{keys, MemoryStore};
    use std::sync::Arc;

    #[derive(Debug)]
    struct AppendSuffix(&'static str);

    impl RequestStage for AppendSuffix {
        fn name(&self) -> &'static str {
            "append_suffix"
        }

        fn on_request(&self, mut request: Request) -> StageOutput {
            request.uri.push_str(self.0);
            StageOutput::forward(request)
        }
    }

    #[test]
    fn test_stages_run_in_order() {
        let chain = RequestChain::new(vec![Box::new(AppendSuffix("/a")), Box::new(AppendSuffix("/b"))]);
        let output = chain.run(Request::get("/x"));
        assert_eq!(output.outcome.request().unwrap().uri, "/x/a/b");
        assert!(output.anomalies.is_empty());
    }

    #[test]
    fn test_respond_short_circuits() {
        let store = Arc::new(MemoryStore::from_pairs([(keys::SITE_BASE_PATH, "/site")]));
        let chain = RequestChain::new(vec![
            Box::new(RootRedirect::new(store, keys::SITE_BASE_PATH)),
            Box::new(AppendSuffix("/never")),
        ]);

        let output = chain.run(Request::get("/"));
        assert_eq!(output.outcome.response().unwrap().location(), Some("/site"));
    }

    #[test]
    fn test_anomalies_are_collected() {
        let store = Arc::new(MemoryStore::from_pairs([(keys::API_PATH, "/api")]));
        let chain = RequestChain::new(vec![Box::new(StripPrefixRewrite::new(store, keys::API_PATH))]);

        let output = chain.run(Request::get("/other/path"));
        assert_eq!(output.outcome.request().unwrap().uri, "/other/path");
        assert_eq!(output.anomalies.len(), 1);
        assert_eq!(output.anomalies[0].stage, "strip_prefix");
        assert_eq!(output.anomalies[0].anomaly.kind(), "prefix_absent");
    }

    #[test]
    fn test_empty_chain_forwards_unchanged() {
        let output = RequestChain::default().run(Request::get("/404.css"));
        assert_eq!(output.outcome, Outcome::Forward(Request::get("/404.css")));
    }

    #[test]
    fn test_response_chain() {
        let chain = ResponseChain::new(vec![Box::new(StatusCodeRewrite::not_found())]);
        let response = chain.run(Response::new(200, "OK"));
        assert_eq!(response.status_code, 404);
        assert_eq!(response.status_description, "Not Found");
    }
}
