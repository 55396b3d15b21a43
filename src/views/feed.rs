use std::future::Future;

use crate::client::{ApiClient, ClientError};
use crate::models::{Article, Event};

use super::{PendingFetch, ViewState};

/// A list fetched once on mount.
pub struct Feed<T> {
    items: Vec<T>,
    error: Option<String>,
    pending: Option<PendingFetch<Vec<T>>>,
}

impl<T: Send + 'static> Feed<T> {
    pub fn mount<F>(fetch: F) -> Self
    where
        F: Future<Output = Result<Vec<T>, ClientError>> + Send + 'static,
    {
        Self {
            items: Vec::new(),
            error: None,
            pending: Some(PendingFetch::spawn(fetch)),
        }
    }

    /// Waits for the mount-time fetch, if it is still outstanding.
    pub async fn settle(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending.join().await {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("Fetch failed: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn view(&self) -> ViewState<&[T]> {
        if self.is_loading() {
            ViewState::Loading
        } else if let (Some(error), true) = (&self.error, self.items.is_empty()) {
            ViewState::Failed(error.clone())
        } else if self.items.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Populated(&self.items)
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub(super) fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }
}

pub fn events_feed(client: &ApiClient) -> Feed<Event> {
    let client = client.clone();
    Feed::mount(async move { client.events().await })
}

/// Shows the newest article, i.e. element 0 of `/api/articles/recent`.
pub struct RecentPost {
    feed: Feed<Article>,
}

impl RecentPost {
    pub fn mount(client: &ApiClient) -> Self {
        let client = client.clone();
        Self {
            feed: Feed::mount(async move { client.recent_articles().await }),
        }
    }

    pub async fn settle(&mut self) {
        self.feed.settle().await;
    }

    pub fn view(&self) -> ViewState<&Article> {
        match self.feed.view() {
            ViewState::Loading => ViewState::Loading,
            ViewState::Empty => ViewState::Empty,
            ViewState::Failed(message) => ViewState::Failed(message),
            ViewState::Populated(articles) => {
                articles.first().map_or(ViewState::Empty, ViewState::Populated)
            }
        }
    }
}
