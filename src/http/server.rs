//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (request ID, tracing, timeout)
//! - Run the viewer-request chain of the matched behavior
//! - Answer synthetic results directly
//! - Forward everything else to the behavior's origin
//! - Substitute custom error pages for configured origin statuses
//! - Run the viewer-response chain on origin responses
//! - Graceful shutdown on the broadcast signal

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, HeaderMap, Method, Request as HttpRequest, StatusCode, Uri},
    response::{IntoResponse, Response as HttpResponse},
    routing::any,
    Router,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::functions::{Headers, Outcome, Request};
use crate::http::request::{self, MakeEdgeRequestId};
use crate::http::response;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{Behavior, ErrorResponse, Router as EdgeRouter, RoutingError};
use crate::store::KeyValueStore;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("origin `{name}` has an invalid url `{url}`")]
    InvalidOrigin { name: String, url: String },

    #[error("behavior `{behavior}` references unknown origin `{origin}`")]
    UnknownOrigin { behavior: String, origin: String },
}

#[derive(Debug, Error)]
enum ForwardError {
    #[error("building origin request: {0}")]
    Request(#[from] axum::http::Error),

    #[error(transparent)]
    Client(#[from] hyper_util::client::legacy::Error),
}

/// Where a behavior's requests are sent.
#[derive(Debug, Clone)]
pub struct Origin {
    pub name: String,
    authority: String,
    /// Prepended to every forwarded path, without a trailing slash.
    path_prefix: String,
}

impl Origin {
    fn parse(name: &str, url: &str) -> Result<Self, ServerError> {
        let invalid = || ServerError::InvalidOrigin {
            name: name.to_string(),
            url: url.to_string(),
        };
        let uri: Uri = url.parse().map_err(|_| invalid())?;
        let authority = uri.authority().ok_or_else(invalid)?.to_string();

        Ok(Self {
            name: name.to_string(),
            authority,
            path_prefix: uri.path().trim_end_matches('/').to_string(),
        })
    }

    fn target(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("http://{}{}{}?{}", self.authority, self.path_prefix, path, query),
            None => format!("http://{}{}{}", self.authority, self.path_prefix, path),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EdgeRouter>,
    pub origins: Arc<HashMap<String, Origin>>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server fronting the configured origins.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Compile the route table and build the service. Every stage reads from `store`.
    pub fn new(config: &EdgeConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ServerError> {
        let edge_router = EdgeRouter::from_config(config, store)?;

        let origins = config
            .origins
            .iter()
            .map(|o| Ok((o.name.clone(), Origin::parse(&o.name, &o.url)?)))
            .collect::<Result<HashMap<_, _>, ServerError>>()?;

        if let Some(behavior) = edge_router
            .behaviors()
            .find(|b| !origins.contains_key(&b.origin))
        {
            return Err(ServerError::UnknownOrigin {
                behavior: behavior.name.clone(),
                origin: behavior.origin.clone(),
            });
        }

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            router: Arc::new(edge_router),
            origins: Arc::new(origins),
            client,
        };

        Ok(Self {
            router: Self::build_router(config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeEdgeRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The service, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Runs the matched behavior for every viewer request.
async fn edge_handler(State(state): State<AppState>, request: HttpRequest<Body>) -> HttpResponse {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request::request_id(&parts.headers);

    let viewer = request::to_edge_request(&parts.method, &parts.uri, &parts.headers);
    let viewer_headers = viewer.headers.clone();
    let evaluation = state.router.evaluate(viewer);
    let behavior = evaluation.behavior;

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        behavior = %behavior.name,
        anomalies = evaluation.anomalies.len(),
        "Viewer request evaluated"
    );

    let response = match evaluation.outcome {
        Outcome::Respond(synthetic) => response::synthetic_response(synthetic),
        Outcome::Forward(forwarded) => {
            forward(&state, behavior, &parts, &viewer_headers, forwarded, body, &request_id).await
        }
    };

    metrics::record_request(&behavior.name, response.status().as_u16(), start);
    response
}

async fn forward(
    state: &AppState,
    behavior: &Behavior,
    parts: &Parts,
    viewer_headers: &Headers,
    forwarded: Request,
    body: Body,
    request_id: &str,
) -> HttpResponse {
    let Some(origin) = state.origins.get(&behavior.origin) else {
        tracing::error!(request_id = %request_id, origin = %behavior.origin, "Origin not configured");
        return (StatusCode::BAD_GATEWAY, "Origin not configured").into_response();
    };

    let headers = response::merge_headers(
        request::forwarded_headers(&parts.headers, request_id),
        viewer_headers,
        &forwarded.headers,
    );

    tracing::debug!(
        request_id = %request_id,
        origin = %origin.name,
        uri = %forwarded.uri,
        "Forwarding to origin"
    );

    let upstream = match fetch(
        state,
        origin,
        parts.method.clone(),
        &forwarded.uri,
        parts.uri.query(),
        headers,
        body,
    )
    .await
    {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(request_id = %request_id, origin = %origin.name, error = %e, "Origin request failed");
            metrics::record_origin_error(&origin.name);
            return (StatusCode::BAD_GATEWAY, "Origin request failed").into_response();
        }
    };

    if let Some(error) = state.router.error_response(upstream.status().as_u16()) {
        if let Some(page) = error_page(state, error, parts, request_id).await {
            return page;
        }
    }

    finish(state, behavior, upstream, None)
}

async fn fetch(
    state: &AppState,
    origin: &Origin,
    method: Method,
    path: &str,
    query: Option<&str>,
    headers: HeaderMap,
    body: Body,
) -> Result<axum::http::Response<Incoming>, ForwardError> {
    let mut request = HttpRequest::builder()
        .method(method)
        .uri(origin.target(path, query))
        .body(body)?;
    *request.headers_mut() = headers;
    Ok(state.client.request(request).await?)
}

/// Fetch the custom error page through its own behavior. `None` keeps the
/// origin's response.
async fn error_page(
    state: &AppState,
    error: &ErrorResponse,
    parts: &Parts,
    request_id: &str,
) -> Option<HttpResponse> {
    let mut page = Request::get(&error.response_page_path);
    page.headers = request::to_edge_request(&parts.method, &parts.uri, &parts.headers).headers;

    let evaluation = state.router.evaluate(page);
    let Outcome::Forward(forwarded) = evaluation.outcome else {
        tracing::warn!(
            request_id = %request_id,
            page = %error.response_page_path,
            "Error page answered by its viewer-request chain, keeping origin response"
        );
        return None;
    };
    let origin = state.origins.get(&evaluation.behavior.origin)?;

    let headers = request::forwarded_headers(&parts.headers, request_id);
    match fetch(state, origin, Method::GET, &forwarded.uri, None, headers, Body::empty()).await {
        Ok(upstream) if upstream.status().is_success() => {
            tracing::debug!(
                request_id = %request_id,
                http_status = error.http_status,
                page = %error.response_page_path,
                "Serving custom error page"
            );
            Some(finish(
                state,
                evaluation.behavior,
                upstream,
                Some(response::status_code(error.response_status)),
            ))
        }
        Ok(upstream) => {
            tracing::warn!(
                request_id = %request_id,
                page = %error.response_page_path,
                status = %upstream.status(),
                "Error page unavailable, keeping origin response"
            );
            None
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, origin = %origin.name, error = %e, "Error page fetch failed");
            metrics::record_origin_error(&origin.name);
            None
        }
    }
}

/// Run the viewer-response chain over an origin response and stream its body.
fn finish(
    state: &AppState,
    behavior: &Behavior,
    upstream: axum::http::Response<Incoming>,
    status: Option<StatusCode>,
) -> HttpResponse {
    let (mut parts, body) = upstream.into_parts();
    if let Some(status) = status {
        parts.status = status;
    }

    let before = response::to_edge_response(parts.status, &parts.headers);
    let after = state.router.respond(behavior, before.clone());

    parts.status = response::status_code(after.status_code);
    parts.headers = response::merge_headers(parts.headers, &before.headers, &after.headers);
    HttpResponse::from_parts(parts, Body::new(body))
}
