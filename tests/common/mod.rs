//! An in-process stand-in for the parish backend, plus helpers to run the
//! portal in front of it.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use parish_portal::backend::BackendClient;
use parish_portal::client::ApiClient;
use parish_portal::config::ClientSettings;
use parish_portal::models::{
    Article, ArticleUpdate, Credentials, Event, LoginResponse, LoginUser, NewArticle,
};
use parish_portal::server::app::{router, AppState};
use parish_portal::session::{Identity, Role, Session};
use secrecy::SecretString;
use serde_json::json;
use tokio::net::TcpListener;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const MEMBER_TOKEN: &str = "member-token";

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub articles: Arc<Mutex<Vec<Article>>>,
    pub events: Arc<Mutex<Vec<Event>>>,
    pub hits: Arc<AtomicUsize>,
    pub last_authorization: Arc<Mutex<Option<String>>>,
}

pub fn article(id: i64, title: &str, author: &str, category: &str, day: u32) -> Article {
    Article {
        id,
        title: title.to_owned(),
        content: format!("{title} content"),
        image_url: String::new(),
        published_at: Utc.with_ymd_and_hms(2024, 12, day, 9, 0, 0).unwrap(),
        username: author.to_owned(),
        category_name: category.to_owned(),
    }
}

pub fn sample_articles() -> Vec<Article> {
    vec![
        article(1, "Messe de Noël", "curé", "Bible", 20),
        article(2, "Kermesse", "marie", "Vie paroissiale", 24),
        article(3, "Catéchisme", "luc", "Bible", 22),
    ]
}

pub fn session(username: &str, token: &str, role: &str) -> Session {
    Session::Authenticated(Identity {
        username: username.to_owned(),
        token: SecretString::from(token.to_owned()),
        role: Role::from(role),
    })
}

pub fn admin() -> Session {
    session("curé", ADMIN_TOKEN, "admin")
}

pub fn member() -> Session {
    session("marie", MEMBER_TOKEN, "member")
}

impl FakeBackend {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        let backend = Self::default();
        *backend.articles.lock().unwrap() = articles;
        backend
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.last_authorization.lock().unwrap().clone()
    }

    fn hit(&self, headers: &HeaderMap) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self.last_authorization.lock().unwrap() = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/articles", get(list_articles).post(create_article))
            .route(
                "/api/articles/{id}",
                put(update_article).delete(delete_article),
            )
            .route("/api/events", get(list_events))
            .route("/api/auth/login", post(login))
            .route("/api/auth/signup", post(signup))
            .with_state(self.clone())
    }

    /// Serves the fake backend on an ephemeral port and returns its base URL.
    pub async fn start(&self) -> String {
        format!("http://{}", serve(self.router()).await)
    }
}

pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn portal(backend_url: &str) -> Router {
    let backend = BackendClient::with_client(reqwest::Client::new(), backend_url);
    router(AppState::new(backend), None)
}

pub fn client(portal_url: &str) -> ApiClient {
    ApiClient::new(&ClientSettings {
        portal_url: portal_url.to_owned(),
        timeout_secs: 5,
    })
    .unwrap()
}

/// Runs the portal against `backend` and returns the portal base URL.
pub async fn start_portal(backend: &FakeBackend) -> String {
    let backend_url = backend.start().await;
    format!("http://{}", serve(portal(&backend_url)).await)
}

fn caller(headers: &HeaderMap) -> Result<(&'static str, &'static str), Response> {
    match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        None => Err((StatusCode::UNAUTHORIZED, "Token manquant\n").into_response()),
        Some(ADMIN_TOKEN) => Ok(("curé", "admin")),
        Some(MEMBER_TOKEN) => Ok(("marie", "member")),
        Some(_) => Err((StatusCode::UNAUTHORIZED, "Token invalide\n").into_response()),
    }
}

async fn list_articles(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    backend.hit(&headers);
    let articles = backend.articles.lock().unwrap().clone();
    if articles.is_empty() {
        return Json(serde_json::Value::Null).into_response();
    }
    Json(articles).into_response()
}

async fn create_article(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(new): Json<NewArticle>,
) -> Response {
    backend.hit(&headers);
    let mut articles = backend.articles.lock().unwrap();
    let id = articles.iter().map(|a| a.id).max().unwrap_or(0) + 1;
    let article = Article {
        id,
        title: new.title,
        content: new.content,
        image_url: new.image_url,
        published_at: new.published_at,
        username: new.username,
        category_name: new.category_name,
    };
    articles.push(article.clone());
    (StatusCode::CREATED, Json(article)).into_response()
}

async fn update_article(
    State(backend): State<FakeBackend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(update): Json<ArticleUpdate>,
) -> Response {
    backend.hit(&headers);
    let (username, role) = match caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let mut articles = backend.articles.lock().unwrap();
    let Some(article) = articles.iter_mut().find(|a| a.id == id) else {
        return (StatusCode::NOT_FOUND, "Article non trouvé\n").into_response();
    };
    if role != "admin" && article.username != username {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "not your article"})),
        )
            .into_response();
    }
    article.title = update.title;
    article.content = update.content;
    Json(json!({"message": "Article mis à jour avec succès"})).into_response()
}

async fn delete_article(
    State(backend): State<FakeBackend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    backend.hit(&headers);
    let (_, role) = match caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    if role != "admin" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "admins only"})),
        )
            .into_response();
    }
    let mut articles = backend.articles.lock().unwrap();
    let before = articles.len();
    articles.retain(|a| a.id != id);
    if articles.len() == before {
        return (StatusCode::NOT_FOUND, "Article non trouvé\n").into_response();
    }
    Json(json!({"message": "Article supprimé avec succès"})).into_response()
}

async fn list_events(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    backend.hit(&headers);
    Json(backend.events.lock().unwrap().clone()).into_response()
}

async fn login(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> Response {
    backend.hit(&headers);
    if credentials.email != "cure@paroisse.fr" || credentials.password != "secret" {
        return (
            StatusCode::UNAUTHORIZED,
            "Email ou mot de passe incorrect\n",
        )
            .into_response();
    }
    Json(LoginResponse {
        message: "Connexion réussie".to_owned(),
        token: ADMIN_TOKEN.to_owned(),
        user: LoginUser {
            id: 1,
            username: "curé".to_owned(),
            email: credentials.email,
            role: "admin".to_owned(),
        },
    })
    .into_response()
}

async fn signup(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    backend.hit(&headers);
    Json(json!({"message": "Utilisateur créé avec succès"})).into_response()
}
