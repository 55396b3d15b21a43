use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};

use crate::backend::BackendClient;
use crate::models::{sort_most_recent_first, Article, ArticleUpdate, Message, NewArticle};
use crate::server::{app::AppState, error::ApiError};

use super::{bearer_token, json_body, require, ApiResponse};

fn article_id(raw: &str) -> Result<i64, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::validation("Article id is required."));
    }
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid article id `{raw}`.")))
}

async fn list_articles(State(backend): State<BackendClient>) -> ApiResponse<Json<Vec<Article>>> {
    let articles = backend
        .articles()
        .await
        .map_err(|e| ApiError::from_backend(e, "Failed to fetch articles."))?;
    Ok(Json(articles))
}

async fn recent_articles(
    State(backend): State<BackendClient>,
) -> ApiResponse<Json<Vec<Article>>> {
    let mut articles = backend
        .articles()
        .await
        .map_err(|e| ApiError::from_backend(e, "Failed to fetch articles."))?;
    sort_most_recent_first(&mut articles);
    Ok(Json(articles))
}

async fn create_article(
    State(backend): State<BackendClient>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse<(StatusCode, Json<Article>)> {
    let article: NewArticle = json_body(&body)?;
    require("title", &article.title)?;
    require("content", &article.content)?;
    let token = bearer_token(&headers)?;

    let created = backend
        .create_article(&token, &article)
        .await
        .map_err(|e| ApiError::from_backend(e, "Failed to create the article."))?;
    tracing::info!(id = created.id, author = %created.username, "Article created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_article(
    State(backend): State<BackendClient>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse<Json<Message>> {
    let id = article_id(&id)?;
    let update: ArticleUpdate = json_body(&body)?;
    require("title", &update.title)?;
    require("content", &update.content)?;
    let token = bearer_token(&headers)?;

    backend
        .update_article(&token, id, &update)
        .await
        .map_err(|e| ApiError::from_backend(e, "Failed to update the article."))?;
    tracing::info!(id, "Article updated");
    Ok(Json(Message::new("Article updated.")))
}

async fn delete_article(
    State(backend): State<BackendClient>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResponse<Json<Message>> {
    let id = article_id(&id)?;
    let token = bearer_token(&headers)?;

    backend
        .delete_article(&token, id)
        .await
        .map_err(|e| ApiError::from_backend(e, "Failed to delete the article."))?;
    tracing::info!(id, "Article deleted");
    Ok(Json(Message::new("Article deleted.")))
}

async fn missing_article_id() -> ApiError {
    ApiError::validation("Article id is required.")
}

pub fn articles_router(state: AppState) -> Router {
    Router::new()
        .route("/api/articles", get(list_articles))
        .route("/api/articles/recent", get(recent_articles))
        .route("/api/articles/create", post(create_article))
        .route(
            "/api/articles/",
            put(missing_article_id).delete(missing_article_id),
        )
        .route(
            "/api/articles/{id}",
            put(update_article).delete(delete_article),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12", 12)]
    #[case(" 7 ", 7)]
    fn valid_ids(#[case] raw: &str, #[case] expected: i64) {
        assert_eq!(article_id(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("abc")]
    #[case("1.5")]
    fn invalid_ids(#[case] raw: &str) {
        assert!(matches!(article_id(raw), Err(ApiError::Validation(_))));
    }
}
