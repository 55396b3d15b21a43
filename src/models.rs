use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    pub published_at: DateTime<Utc>,
    pub username: String,
    #[serde(default)]
    pub category_name: String,
}

impl Article {
    pub fn published_on(&self) -> String {
        self.published_at.format("%d/%m/%Y").to_string()
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} [{}] by {} on {}",
            self.id,
            self.title,
            self.category_name,
            self.username,
            self.published_on()
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub img: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    pub published_at: DateTime<Utc>,
    pub username: String,
    #[serde(default)]
    pub category_name: String,
}

/// Body accepted by the article update route. Clients may send a whole
/// article draft; everything except `title` and `content` is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ArticleUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl From<&Article> for ArticleUpdate {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            content: article.content.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Signup {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoginUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub token: String,
    pub user: LoginUser,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error envelope shared by every proxy route.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

/// Orders articles most recent first. `sort_by` is stable, so articles
/// published at the same instant keep their backend order.
pub fn sort_most_recent_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
