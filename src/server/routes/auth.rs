use axum::{body::Bytes, extract::State, routing::post, Json, Router};

use crate::backend::BackendClient;
use crate::models::{Credentials, LoginResponse, Message, Signup};
use crate::server::{app::AppState, error::ApiError};

use super::{json_body, require, ApiResponse};

async fn login(
    State(backend): State<BackendClient>,
    body: Bytes,
) -> ApiResponse<Json<LoginResponse>> {
    let credentials: Credentials = json_body(&body)?;
    require("email", &credentials.email)?;
    require("password", &credentials.password)?;

    let response = backend
        .login(&credentials)
        .await
        .map_err(|e| ApiError::from_backend(e, "Invalid email or password."))?;
    tracing::info!(username = %response.user.username, "Login forwarded");
    Ok(Json(response))
}

async fn signup(State(backend): State<BackendClient>, body: Bytes) -> ApiResponse<Json<Message>> {
    let signup: Signup = json_body(&body)?;
    require("email", &signup.email)?;
    require("password", &signup.password)?;
    require("username", &signup.username)?;

    let message = backend
        .signup(&signup)
        .await
        .map_err(|e| ApiError::from_backend(e, "Failed to create the account."))?;
    Ok(Json(message))
}

pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .with_state(state)
}
