use axum::{extract::State, routing::get, Json, Router};

use crate::backend::BackendClient;
use crate::models::Event;
use crate::server::{app::AppState, error::ApiError};

use super::ApiResponse;

async fn list_events(State(backend): State<BackendClient>) -> ApiResponse<Json<Vec<Event>>> {
    let events = backend
        .events()
        .await
        .map_err(|e| ApiError::from_backend(e, "Failed to fetch events."))?;
    Ok(Json(events))
}

pub fn events_router(state: AppState) -> Router {
    Router::new()
        .route("/api/events", get(list_events))
        .with_state(state)
}
