mod articles;
mod auth;
mod events;
mod pages;

use axum::http::{header, HeaderMap};
use secrecy::SecretString;
use serde::de::DeserializeOwned;

pub use articles::articles_router;
pub use auth::auth_router;
pub use events::events_router;
pub use pages::pages_router;

use super::error::ApiError;

pub type ApiResponse<T> = Result<T, ApiError>;

/// Reads `Authorization: Bearer <token>`. A header without the scheme is
/// taken as the bare token.
fn bearer_token(headers: &HeaderMap) -> Result<SecretString, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token.".to_owned()))?;
    Ok(SecretString::from(token.to_owned()))
}

fn json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {e}");
        ApiError::validation("Invalid request body.")
    })
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("Field `{field}` is required.")));
    }
    Ok(())
}
