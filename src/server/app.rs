use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{extract::FromRef, http::StatusCode, routing::get, Router};
use prometheus::{Encoder, TextEncoder};
use routes::{articles_router, auth_router, events_router, pages_router};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::backend::BackendClient;
use crate::config::Settings;
use crate::telemetry::record_proxy_request;

#[derive(FromRef, Clone)]
pub struct AppState {
    backend: BackendClient,
}

impl AppState {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .merge(articles_router(state.clone()))
        .merge(events_router(state.clone()))
        .merge(auth_router(state.clone()))
        .layer(middleware::from_fn(count_proxy_requests));

    let mut app = Router::new()
        .route("/metrics", get(metrics))
        .merge(api)
        .merge(pages_router(state));
    if let Some(static_dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }
    app.fallback(|| async {
        tracing::info!("Fallback");
        StatusCode::NOT_FOUND
    })
    .layer(TraceLayer::new_for_http())
}

pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let addr = settings.server.addr()?;
    let backend = BackendClient::new(&settings.backend)?;
    tracing::info!("Forwarding to backend at {}", backend.base_url());
    let app = router(AppState::new(backend), settings.server.static_dir.clone());

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Serving on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn count_proxy_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let response = next.run(request).await;
    record_proxy_request(&route, response.status().as_u16());
    response
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = vec![];
    if let Err(e) = encoder.encode(&metrics, &mut buf) {
        tracing::error!("Failed to encode metrics: {e}");
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::empty())
            .unwrap_or_default();
    }
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(Body::from(buf))
        .unwrap_or_default()
}
