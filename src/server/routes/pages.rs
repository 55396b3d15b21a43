use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use futures_util::future::join;
use serde::Deserialize;

use crate::backend::BackendClient;
use crate::models::{sort_most_recent_first, Article, Event};
use crate::server::app::AppState;
use crate::views::{categories, CategoryFilter, ViewState};

#[derive(Deserialize)]
struct BoardQuery {
    category: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
struct IndexPage {
    recent: ViewState<Article>,
    articles: ViewState<Vec<Article>>,
    events: ViewState<Vec<Event>>,
}

struct CategoryOption {
    name: String,
    selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "articles.html")]
struct BoardPage {
    categories: Vec<CategoryOption>,
    articles: ViewState<Vec<Article>>,
}

async fn index(State(backend): State<BackendClient>) -> IndexPage {
    let (articles, events) = join(backend.articles(), backend.events()).await;
    let articles = articles
        .map(|mut articles| {
            sort_most_recent_first(&mut articles);
            articles
        })
        .map_err(|e| {
            tracing::warn!("Index page could not load articles: {e}");
            "Articles are unavailable right now.".to_owned()
        });
    let events = events.map_err(|e| {
        tracing::warn!("Index page could not load events: {e}");
        "Events are unavailable right now.".to_owned()
    });

    let recent = match &articles {
        Ok(articles) => articles
            .first()
            .cloned()
            .map_or(ViewState::Empty, ViewState::Populated),
        Err(message) => ViewState::Failed(message.clone()),
    };
    IndexPage {
        recent,
        articles: ViewState::from_list(articles),
        events: ViewState::from_list(events),
    }
}

async fn board(
    State(backend): State<BackendClient>,
    Query(BoardQuery { category }): Query<BoardQuery>,
) -> BoardPage {
    let filter = CategoryFilter::from_query(category.as_deref());
    match backend.articles().await {
        Ok(articles) => BoardPage {
            categories: categories(&articles)
                .into_iter()
                .map(|name| CategoryOption {
                    selected: filter == CategoryFilter::Named(name.clone()),
                    name,
                })
                .collect(),
            articles: ViewState::from_list(Ok(articles
                .into_iter()
                .filter(|a| filter.matches(a))
                .collect())),
        },
        Err(e) => {
            tracing::warn!("Board page could not load articles: {e}");
            BoardPage {
                categories: Vec::new(),
                articles: ViewState::Failed("Articles are unavailable right now.".to_owned()),
            }
        }
    }
}

pub fn pages_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/articles", get(board))
        .with_state(state)
}
