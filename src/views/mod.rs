//! Presentational components: each one fetches its own data when mounted,
//! exposes a single [`ViewState`], and gates its affordances on the
//! [`Session`](crate::session::Session) it is handed.

mod board;
mod feed;

use std::future::Future;

use itertools::Itertools;
use tokio::task::JoinHandle;

use crate::client::ClientError;
use crate::models::Article;
use crate::session::Session;

pub use board::{ArticleBoard, ArticleForm, BoardError};
pub use feed::{events_feed, Feed, RecentPost};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Empty,
    Populated(T),
    Failed(String),
}

impl<T> ViewState<Vec<T>> {
    pub fn from_list(result: Result<Vec<T>, String>) -> Self {
        match result {
            Ok(items) if items.is_empty() => ViewState::Empty,
            Ok(items) => ViewState::Populated(items),
            Err(message) => ViewState::Failed(message),
        }
    }
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn from_query(category: Option<&str>) -> Self {
        match category.map(str::trim) {
            None | Some("") | Some("all") => CategoryFilter::All,
            Some(name) => CategoryFilter::Named(name.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Named(name) => name,
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => article.category_name == *name,
        }
    }
}

/// Distinct non-empty categories, in the order they first appear.
pub fn categories(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .map(|a| a.category_name.as_str())
        .filter(|c| !c.is_empty())
        .unique()
        .map(str::to_owned)
        .collect()
}

pub fn can_publish(session: &Session) -> bool {
    session.is_logged_in()
}

pub fn can_edit(session: &Session, article: &Article) -> bool {
    session.is_admin() || session.username() == Some(article.username.as_str())
}

pub fn can_delete(session: &Session) -> bool {
    session.is_admin()
}

/// Interactive yes/no question asked before destructive calls.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A fetch owned by the component that started it. Dropping it aborts the
/// task, so results never reach a component that is gone.
pub struct PendingFetch<T> {
    handle: JoinHandle<Result<T, ClientError>>,
}

impl<T: Send + 'static> PendingFetch<T> {
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(fetch: F) -> Self
    where
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(fetch),
        }
    }

    pub async fn join(mut self) -> Result<T, ClientError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ClientError::Cancelled),
        }
    }
}

impl<T> Drop for PendingFetch<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
