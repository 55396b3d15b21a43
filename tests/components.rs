mod common;

use common::{admin, client, member, sample_articles, start_portal, FakeBackend};
use parish_portal::client::ApiClient;
use parish_portal::models::Credentials;
use parish_portal::session::{AuthContext, FileStore, Session};
use parish_portal::views::{
    events_feed, ArticleBoard, ArticleForm, BoardError, CategoryFilter, RecentPost, ViewState,
};

async fn mounted_board(backend: &FakeBackend) -> (ApiClient, ArticleBoard) {
    let client = client(&start_portal(backend).await);
    let mut board = ArticleBoard::mount(&client);
    board.settle().await;
    (client, board)
}

fn visible_ids(board: &ArticleBoard) -> Vec<i64> {
    match board.view() {
        ViewState::Populated(articles) => articles.iter().map(|a| a.id).collect(),
        _ => Vec::new(),
    }
}

#[tokio::test]
async fn confirmed_delete_removes_the_article_without_refetching() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;
    let hits = backend.hits();

    let deleted = board
        .delete(&client, &admin(), 2, &|_: &str| true)
        .await
        .unwrap();

    assert!(deleted);
    assert_eq!(visible_ids(&board), vec![1, 3]);
    // Only the DELETE itself reached the backend.
    assert_eq!(backend.hits(), hits + 1);
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;
    let hits = backend.hits();

    let deleted = board
        .delete(&client, &admin(), 2, &|prompt: &str| {
            assert!(prompt.contains("Kermesse"));
            false
        })
        .await
        .unwrap();

    assert!(!deleted);
    assert_eq!(visible_ids(&board), vec![1, 2, 3]);
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn members_cannot_delete() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;

    let result = board.delete(&client, &member(), 2, &|_: &str| true).await;

    assert!(matches!(result, Err(BoardError::NotPermitted("delete"))));
    assert_eq!(backend.articles.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn failed_delete_keeps_the_article() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;
    backend.articles.lock().unwrap().retain(|a| a.id != 3);

    let result = board.delete(&client, &admin(), 3, &|_: &str| true).await;

    match result {
        Err(BoardError::Client(e)) => assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND)),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(visible_ids(&board), vec![1, 2, 3]);
}

#[tokio::test]
async fn author_edit_is_merged_into_the_list() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;
    let session = member();

    board.begin_edit(&session, 2).unwrap().title = "Kermesse reportée".to_owned();
    board.save(&client, &session).await.unwrap();

    assert!(board.draft().is_none());
    assert_eq!(board.get(2).unwrap().title, "Kermesse reportée");
    let stored = backend.articles.lock().unwrap();
    assert_eq!(stored.iter().find(|a| a.id == 2).unwrap().title, "Kermesse reportée");
}

#[tokio::test]
async fn members_cannot_edit_other_authors() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (_, mut board) = mounted_board(&backend).await;

    let result = board.begin_edit(&member(), 1);

    assert!(matches!(result, Err(BoardError::NotPermitted("edit"))));
    assert!(board.draft().is_none());
}

#[tokio::test]
async fn rejected_save_keeps_the_draft() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;
    let session = admin();
    board.begin_edit(&session, 2).unwrap().content = "Nouvelle date".to_owned();
    backend.articles.lock().unwrap().clear();

    let result = board.save(&client, &session).await;

    assert!(matches!(result, Err(BoardError::Client(_))));
    assert_eq!(board.draft().unwrap().content, "Nouvelle date");
    assert_eq!(board.get(2).unwrap().content, "Kermesse content");
}

#[tokio::test]
async fn publish_appends_the_created_article() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;

    let created = board
        .publish(
            &client,
            &member(),
            ArticleForm {
                title: "Chorale".to_owned(),
                content: "Répétition mardi.".to_owned(),
                category_name: "Vie paroissiale".to_owned(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(created.id, 4);
    assert_eq!(created.username, "marie");
    assert_eq!(visible_ids(&board), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn anonymous_users_cannot_publish() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (client, mut board) = mounted_board(&backend).await;
    let hits = backend.hits();

    let result = board
        .publish(
            &client,
            &Session::Anonymous,
            ArticleForm {
                title: "Chorale".to_owned(),
                content: "Répétition mardi.".to_owned(),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(BoardError::NotLoggedIn)));
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn category_filter_narrows_the_board() {
    let backend = FakeBackend::with_articles(sample_articles());
    let (_, mut board) = mounted_board(&backend).await;

    assert_eq!(board.categories(), vec!["Bible", "Vie paroissiale"]);
    board.set_filter(CategoryFilter::from_query(Some("Bible")));
    assert_eq!(visible_ids(&board), vec![1, 3]);
    board.set_filter(CategoryFilter::from_query(Some("Mariages")));
    assert!(matches!(board.view(), ViewState::Empty));
}

#[tokio::test]
async fn recent_post_shows_the_newest_article() {
    let backend = FakeBackend::with_articles(sample_articles());
    let client = client(&start_portal(&backend).await);
    let mut recent = RecentPost::mount(&client);
    recent.settle().await;

    match recent.view() {
        ViewState::Populated(article) => assert_eq!(article.id, 2),
        _ => panic!("expected a recent post"),
    }
}

#[tokio::test]
async fn empty_events_feed_reports_empty() {
    let backend = FakeBackend::default();
    let client = client(&start_portal(&backend).await);
    let mut events = events_feed(&client);
    assert!(events.is_loading());

    events.settle().await;

    assert!(matches!(events.view(), ViewState::Empty));
}

#[tokio::test]
async fn unreachable_portal_fails_the_board() {
    let client = client(&common::unreachable_url().await);
    let mut board = ArticleBoard::mount(&client);
    board.settle().await;

    assert!(matches!(board.view(), ViewState::Failed(_)));
}

#[tokio::test]
async fn login_through_the_portal_persists_the_session() {
    let backend = FakeBackend::default();
    let client = client(&start_portal(&backend).await);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let response = client
        .login(&Credentials {
            email: "cure@paroisse.fr".to_owned(),
            password: "secret".to_owned(),
        })
        .await
        .unwrap();
    let mut auth = AuthContext::rehydrate(FileStore::new(&path)).unwrap();
    auth.login(&response.user.username, &response.token, &response.user.role)
        .unwrap();

    let restored = AuthContext::rehydrate(FileStore::new(&path)).unwrap();
    assert!(restored.is_logged_in());
    assert_eq!(restored.username(), Some("curé"));
    assert!(restored.session().is_admin());
}
