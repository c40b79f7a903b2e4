//! HTTP gateway hosting the cache worker.
//!
//! The gateway plays the role the browser plays for a service worker:
//! every client request becomes a fetch event dispatched to the worker.
//! `Respond` decisions are converted to HTTP responses; `PassThrough`
//! requests (non-GET verbs, foreign origins) are proxied verbatim to
//! their destination and relayed uncached.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::Response;
use reqwest::Url;
use shelter_client::{FetchClient, canonicalize};
use shelter_core::{AppConfig, Error};

use crate::error::GatewayError;
use crate::events::{FetchDecision, FetchEvent, ServedResponse, Worker};

/// Shared state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    worker: Arc<Worker<FetchClient>>,
    origin: Url,
    proxy: reqwest::Client,
    max_bytes: usize,
}

impl GatewayState {
    pub fn new(worker: Arc<Worker<FetchClient>>, origin: Url, config: &AppConfig) -> Result<Self, Error> {
        let proxy = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Network(format!("failed to build proxy client: {e}")))?;

        Ok(Self { worker, origin, proxy, max_bytes: config.max_bytes })
    }
}

/// Run the gateway until the listener fails.
pub async fn serve(addr: SocketAddr, state: GatewayState) -> anyhow::Result<()> {
    let app = Router::new().fallback(handle).with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle(State(state): State<GatewayState>, req: Request) -> Result<Response, GatewayError> {
    let (parts, body) = req.into_parts();
    let url = request_url(&state.origin, &parts.uri)?;

    let event = FetchEvent { method: parts.method.clone(), url: url.clone() };

    match state.worker.handle_fetch(&event).await? {
        FetchDecision::Respond(served) => served_response(served),
        FetchDecision::PassThrough => pass_through(&state, parts.method, url, &parts.headers, body).await,
    }
}

/// Absolute URL for an incoming request.
///
/// Origin-form request targets (the normal case) are resolved against
/// the configured upstream origin. Absolute-form targets (proxy-style
/// requests) are canonicalized, which is how a cross-origin request
/// reaches the worker's filter: host case and fragments must not make
/// two spellings of one resource look distinct.
fn request_url(origin: &Url, uri: &Uri) -> Result<Url, GatewayError> {
    if uri.scheme().is_some() {
        return canonicalize(&uri.to_string())
            .map_err(|e| GatewayError(Error::InvalidUrl(format!("{uri}: {e}"))));
    }

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    origin
        .join(path_and_query)
        .map_err(|e| GatewayError(Error::InvalidUrl(format!("{path_and_query}: {e}"))))
}

fn served_response(served: ServedResponse) -> Result<Response, GatewayError> {
    let mut builder = Response::builder().status(served.status);

    if let Some(content_type) = &served.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    builder
        .body(Body::from(served.body))
        .map_err(|e| GatewayError(Error::InvalidInput(format!("failed to build response: {e}"))))
}

/// Default network path for requests the worker declined to intercept.
async fn pass_through(
    state: &GatewayState, method: axum::http::Method, url: Url, headers: &axum::http::HeaderMap, body: Body,
) -> Result<Response, GatewayError> {
    let bytes = axum::body::to_bytes(body, state.max_bytes)
        .await
        .map_err(|e| GatewayError(Error::FetchTooLarge(e.to_string())))?;

    let mut request = state.proxy.request(method, url).body(bytes);
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        request = request.header(header::CONTENT_TYPE, content_type);
    }

    let upstream = request
        .send()
        .await
        .map_err(|e| GatewayError(Error::Network(format!("pass-through failed: {e}"))))?;

    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = upstream
        .bytes()
        .await
        .map_err(|e| GatewayError(Error::Network(format!("failed to read upstream body: {e}"))))?;

    let mut builder = Response::builder().status(StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY));
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    builder
        .body(Body::from(body))
        .map_err(|e| GatewayError(Error::InvalidInput(format!("failed to build response: {e}"))))
}
