use article_hub::{
    messages::{MessageKey, Messages, render},
    models::{
        ArticleChanges, ArticleSummary, Comment, CreateArticleRequest, CredentialsRequest,
        UpdateArticleRequest,
    },
};
use axum::{body::to_bytes, http::StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;

// --- Serialization ---

#[test]
fn test_article_summary_timestamp_format() {
    let summary = ArticleSummary {
        id: 1,
        title: "T".to_string(),
        content: "C".to_string(),
        category: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        likes: 2,
        dislikes: 0,
    };

    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["created_at"], "2024-05-01 09:30:00");
    assert!(json["category"].is_null());
    assert_eq!(json["likes"], 2);
}

#[test]
fn test_comment_hides_article_id() {
    let comment = Comment {
        id: 3,
        content: "Nice".to_string(),
        user_id: 9,
        article_id: 1,
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
    };

    let json = serde_json::to_string(&comment).unwrap();

    assert!(json.contains(r#""created_at":"2024-01-02 03:04:05""#));
    assert!(json.contains(r#""user_id":9"#));
    assert!(!json.contains("article_id"));
}

// --- Deserialization ---

#[test]
fn test_update_request_distinguishes_absent_and_null() {
    let absent: UpdateArticleRequest = serde_json::from_str(r#"{"title":"New"}"#).unwrap();
    assert_eq!(absent.title.as_deref(), Some("New"));
    assert_eq!(absent.category_id, None);

    let cleared: UpdateArticleRequest = serde_json::from_str(r#"{"category_id":null}"#).unwrap();
    assert_eq!(cleared.category_id, Some(None));

    let set: UpdateArticleRequest = serde_json::from_str(r#"{"category_id":4}"#).unwrap();
    assert_eq!(set.category_id, Some(Some(4)));

    let changes = ArticleChanges::from(cleared);
    assert!(changes.title.is_none());
    assert_eq!(changes.category_id, Some(None));
}

#[test]
fn test_requests_tolerate_missing_fields() {
    let creds: CredentialsRequest = serde_json::from_str("{}").unwrap();
    assert!(creds.username.is_none() && creds.password.is_none());

    let article: CreateArticleRequest = serde_json::from_str(r#"{"title":"Only"}"#).unwrap();
    assert_eq!(article.title.as_deref(), Some("Only"));
    assert!(article.content.is_none());
    assert!(article.category_id.is_none());
}

// --- Message Catalogue ---

#[test]
fn test_partial_catalogue_keeps_defaults() {
    let messages: Messages = serde_json::from_str(r#"{"like_added":"Лайк доданий"}"#).unwrap();

    assert_eq!(messages.get(MessageKey::LikeAdded), "Лайк доданий");
    assert_eq!(messages.get(MessageKey::ArticleNotFound), "Article not found");
}

#[test]
fn test_bundled_catalogue_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/messages/uk.json");
    let messages = Messages::load(path).unwrap();

    assert_eq!(
        messages.get(MessageKey::EditForbidden),
        "Ви не маєте прав на редагування цієї статті"
    );
    assert!(Messages::load("/nonexistent/messages.json").is_err());
}

#[tokio::test]
async fn test_render_uses_default_text_and_tags_key() {
    for _ in 0..2 {
        let response = render(StatusCode::CREATED, MessageKey::LikeAdded);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.extensions().get::<MessageKey>(), Some(&MessageKey::LikeAdded));

        let body: Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["message"], "Like added");
    }
}
