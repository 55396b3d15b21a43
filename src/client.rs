//! Client for the portal's own `/api` routes, used by the presentational
//! components and the `portal` command.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ClientSettings;
use crate::models::{
    Article, Credentials, ErrorBody, Event, LoginResponse, Message, NewArticle, Signup,
};
use crate::session::{bearer_header, Session};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{message} ({status})")]
    Api { status: StatusCode, message: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request was cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::Cancelled => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self::with_client(http, &settings.portal_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(request: RequestBuilder, session: &Session) -> RequestBuilder {
        match session.token() {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, bearer_header(token)),
            None => request,
        }
    }

    pub async fn articles(&self) -> Result<Vec<Article>, ClientError> {
        decode(self.http.get(self.url("/api/articles")).send().await?).await
    }

    pub async fn recent_articles(&self) -> Result<Vec<Article>, ClientError> {
        decode(self.http.get(self.url("/api/articles/recent")).send().await?).await
    }

    pub async fn events(&self) -> Result<Vec<Event>, ClientError> {
        decode(self.http.get(self.url("/api/events")).send().await?).await
    }

    pub async fn create_article(
        &self,
        session: &Session,
        article: &NewArticle,
    ) -> Result<Article, ClientError> {
        let request = self
            .http
            .post(self.url("/api/articles/create"))
            .json(article);
        decode(Self::authorized(request, session).send().await?).await
    }

    /// Sends the whole draft; the route keeps only title and content.
    pub async fn update_article(
        &self,
        session: &Session,
        draft: &Article,
    ) -> Result<Message, ClientError> {
        let request = self
            .http
            .put(self.url(&format!("/api/articles/{}", draft.id)))
            .json(draft);
        decode(Self::authorized(request, session).send().await?).await
    }

    pub async fn delete_article(&self, session: &Session, id: i64) -> Result<Message, ClientError> {
        let request = self.http.delete(self.url(&format!("/api/articles/{id}")));
        decode(Self::authorized(request, session).send().await?).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        let request = self.http.post(self.url("/api/auth/login")).json(credentials);
        decode(request.send().await?).await
    }

    pub async fn signup(&self, signup: &Signup) -> Result<Message, ClientError> {
        let request = self.http.post(self.url("/api/auth/signup")).json(signup);
        decode(request.send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_owned(),
    };
    Err(ClientError::Api { status, message })
}
