use chrono::Utc;
use thiserror::Error;

use crate::client::{ApiClient, ClientError};
use crate::models::{Article, NewArticle};
use crate::session::Session;

use super::{
    can_delete, can_edit, can_publish, categories, CategoryFilter, Confirm, Feed, ViewState,
};

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("you must be logged in to publish an article")]
    NotLoggedIn,
    #[error("you are not allowed to {0} this article")]
    NotPermitted(&'static str),
    #[error("article {0} is not on the board")]
    UnknownArticle(i64),
    #[error("no article is being edited")]
    NoDraft,
    #[error("{0} must not be empty")]
    Invalid(&'static str),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Fields a user fills in when publishing. Author and publication time come
/// from the session and the clock.
#[derive(Debug, Clone, Default)]
pub struct ArticleForm {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub category_name: String,
}

fn validate(title: &str, content: &str) -> Result<(), BoardError> {
    if title.trim().is_empty() {
        return Err(BoardError::Invalid("title"));
    }
    if content.trim().is_empty() {
        return Err(BoardError::Invalid("content"));
    }
    Ok(())
}

/// The article list with category filter, edit and delete affordances.
pub struct ArticleBoard {
    feed: Feed<Article>,
    filter: CategoryFilter,
    draft: Option<Article>,
}

impl ArticleBoard {
    pub fn mount(client: &ApiClient) -> Self {
        let client = client.clone();
        Self {
            feed: Feed::mount(async move { client.articles().await }),
            filter: CategoryFilter::All,
            draft: None,
        }
    }

    pub async fn settle(&mut self) {
        self.feed.settle().await;
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn categories(&self) -> Vec<String> {
        categories(self.feed.items())
    }

    pub fn view(&self) -> ViewState<Vec<&Article>> {
        match self.feed.view() {
            ViewState::Loading => ViewState::Loading,
            ViewState::Empty => ViewState::Empty,
            ViewState::Failed(message) => ViewState::Failed(message),
            ViewState::Populated(articles) => {
                let visible: Vec<&Article> = articles
                    .iter()
                    .filter(|a| self.filter.matches(a))
                    .collect();
                if visible.is_empty() {
                    ViewState::Empty
                } else {
                    ViewState::Populated(visible)
                }
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<&Article> {
        self.feed.items().iter().find(|a| a.id == id)
    }

    /// Returns `Ok(false)` when the user declines the confirmation; nothing
    /// is sent in that case.
    pub async fn delete(
        &mut self,
        client: &ApiClient,
        session: &Session,
        id: i64,
        confirm: &impl Confirm,
    ) -> Result<bool, BoardError> {
        if !can_delete(session) {
            return Err(BoardError::NotPermitted("delete"));
        }
        let prompt = match self.get(id) {
            Some(article) => format!("Delete \"{}\"?", article.title),
            None => format!("Delete article {id}?"),
        };
        if !confirm.confirm(&prompt) {
            return Ok(false);
        }

        client.delete_article(session, id).await?;
        self.feed.items_mut().retain(|a| a.id != id);
        if self.draft.as_ref().is_some_and(|d| d.id == id) {
            self.draft = None;
        }
        Ok(true)
    }

    /// Copies the article into a draft the caller can modify.
    pub fn begin_edit(&mut self, session: &Session, id: i64) -> Result<&mut Article, BoardError> {
        let article = self.get(id).ok_or(BoardError::UnknownArticle(id))?;
        if !can_edit(session, article) {
            return Err(BoardError::NotPermitted("edit"));
        }
        let draft = article.clone();
        Ok(self.draft.insert(draft))
    }

    pub fn draft(&self) -> Option<&Article> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Article> {
        self.draft.as_mut()
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Submits the whole draft and merges it into the list. The draft is
    /// kept if the call fails so it can be retried.
    pub async fn save(&mut self, client: &ApiClient, session: &Session) -> Result<(), BoardError> {
        let draft = self.draft.as_ref().ok_or(BoardError::NoDraft)?;
        validate(&draft.title, &draft.content)?;
        // authorship comes from the loaded article, not the editable draft
        let stored = self
            .get(draft.id)
            .ok_or(BoardError::UnknownArticle(draft.id))?;
        if !can_edit(session, stored) {
            return Err(BoardError::NotPermitted("edit"));
        }

        client.update_article(session, draft).await?;
        if let Some(draft) = self.draft.take() {
            if let Some(slot) = self.feed.items_mut().iter_mut().find(|a| a.id == draft.id) {
                *slot = draft;
            }
        }
        Ok(())
    }

    pub async fn publish(
        &mut self,
        client: &ApiClient,
        session: &Session,
        form: ArticleForm,
    ) -> Result<&Article, BoardError> {
        let username = match session.username() {
            Some(username) if can_publish(session) => username.to_owned(),
            _ => return Err(BoardError::NotLoggedIn),
        };
        validate(&form.title, &form.content)?;

        let article = NewArticle {
            title: form.title,
            content: form.content,
            image_url: form.image_url,
            published_at: Utc::now(),
            username,
            category_name: form.category_name,
        };
        let created = client.create_article(session, &article).await?;
        let items = self.feed.items_mut();
        let index = items.len();
        items.push(created);
        Ok(&items[index])
    }
}
