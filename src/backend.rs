//! HTTP client for the parish backend service.

use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::BackendSettings;
use crate::models::{
    Article, ArticleUpdate, Credentials, ErrorBody, Event, LoginResponse, Message, NewArticle,
    Signup,
};

#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend answered with a non-2xx status. `message` is the `error`
    /// field of its JSON body, when it sent one.
    #[error("backend responded with {status}")]
    Status { status: u16, message: Option<String> },
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self::with_client(http, &settings.base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The backend validates the raw token it issued, so the `Bearer` scheme
    /// is not forwarded.
    fn authorized(request: RequestBuilder, token: &SecretString) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, token.expose_secret())
    }

    pub async fn articles(&self) -> Result<Vec<Article>, BackendError> {
        let response = self.http.get(self.url("/api/articles")).send().await?;
        // an empty table is encoded as `null`
        let articles: Option<Vec<Article>> = decode(response).await?;
        Ok(articles.unwrap_or_default())
    }

    pub async fn create_article(
        &self,
        token: &SecretString,
        article: &NewArticle,
    ) -> Result<Article, BackendError> {
        let request = self.http.post(self.url("/api/articles")).json(article);
        decode(Self::authorized(request, token).send().await?).await
    }

    pub async fn update_article(
        &self,
        token: &SecretString,
        id: i64,
        update: &ArticleUpdate,
    ) -> Result<Message, BackendError> {
        let request = self
            .http
            .put(self.url(&format!("/api/articles/{id}")))
            .json(update);
        decode(Self::authorized(request, token).send().await?).await
    }

    pub async fn delete_article(
        &self,
        token: &SecretString,
        id: i64,
    ) -> Result<Message, BackendError> {
        let request = self.http.delete(self.url(&format!("/api/articles/{id}")));
        decode(Self::authorized(request, token).send().await?).await
    }

    pub async fn events(&self) -> Result<Vec<Event>, BackendError> {
        let response = self.http.get(self.url("/api/events")).send().await?;
        let events: Option<Vec<Event>> = decode(response).await?;
        Ok(events.unwrap_or_default())
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError> {
        let request = self.http.post(self.url("/api/auth/login")).json(credentials);
        decode(request.send().await?).await
    }

    pub async fn signup(&self, signup: &Signup) -> Result<Message, BackendError> {
        let request = self.http.post(self.url("/api/auth/signup")).json(signup);
        decode(request.send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.is_empty());
    tracing::warn!(
        status = status.as_u16(),
        body = %String::from_utf8_lossy(&body),
        "Backend returned an error"
    );
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}
