use article_hub::{
    AppConfig, AppState, InMemoryRepository, Messages, create_router,
    repository::{Repository, RepositoryState},
};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
}

fn test_state(repo: Arc<InMemoryRepository>, messages: Messages) -> AppState {
    let config = AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    };
    AppState::new(config, repo as RepositoryState, messages)
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let router = create_router(test_state(repo.clone(), Messages::default()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

impl TestApp {
    async fn post(&self, client: &Client, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = client.post(format!("{}{}", self.address, path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.expect("req fail");
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, client: &Client, path: &str) -> (StatusCode, Value) {
        let response = client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("req fail");
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn register_and_login(&self, client: &Client, username: &str, password: &str) -> String {
        let creds = json!({ "username": username, "password": password });
        let (status, _) = self.post(client, "/register", None, creds.clone()).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.post(client, "/login", None, creds).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = Client::new()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_article_lifecycle() {
    let app = spawn_app().await;
    let client = Client::new();

    // Register, duplicate, login.
    let creds = json!({ "username": "alice", "password": "pw1" });
    let (status, body) = app.post(&client, "/register", None, creds.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Registration successful");

    let (status, body) = app.post(&client, "/register", None, creds.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This user already exists");

    let (status, body) = app.post(&client, "/login", None, creds).await;
    assert_eq!(status, StatusCode::OK);
    let alice = body["access_token"].as_str().unwrap().to_string();

    // Create, then read back through the public listing.
    let category = app.repo.create_category("Science").await.unwrap();
    let (status, _) = app
        .post(
            &client,
            "/articles",
            Some(&alice),
            json!({ "title": "T", "content": "C", "category_id": category.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get(&client, "/api/articles").await;
    assert_eq!(status, StatusCode::OK);
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["title"], "T");
    assert_eq!(articles[0]["category"], "Science");
    assert_eq!(articles[0]["likes"], 0);
    let article_id = articles[0]["id"].as_i64().unwrap();

    // Like once, then again.
    let like_path = format!("/articles/{}/like", article_id);
    let (status, body) = app.post(&client, &like_path, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Like added");

    let (status, body) = app.post(&client, &like_path, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You have already liked this article");

    let (_, body) = app.get(&client, &format!("/api/articles/{}", article_id)).await;
    assert_eq!(body["likes"], 1);
    assert_eq!(body["dislikes"], 0);

    // Another user cannot delete it.
    let bob = app.register_and_login(&client, "bob", "pw2").await;
    let response = client
        .delete(format!("{}/articles/{}", app.address, article_id))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status().as_u16(), 403);

    // Comments from anyone; deletion by the owner takes them along.
    let comments_path = format!("/articles/{}/comments", article_id);
    let (status, _) = app
        .post(&client, &comments_path, Some(&bob), json!({ "content": "Nice" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get(&client, &comments_path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comments"][0]["content"], "Nice");
    assert!(body["comments"][0].get("article_id").is_none());

    let response = client
        .delete(format!("{}/articles/{}", app.address, article_id))
        .bearer_auth(&alice)
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(app.repo.comment_rows(article_id).await, 0);
    let (status, body) = app.get(&client, &format!("/api/articles/{}", article_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Article not found");
}

#[tokio::test]
async fn test_mutations_require_a_token() {
    let app = spawn_app().await;
    let client = Client::new();

    let (status, body) = app
        .post(&client, "/articles", None, json!({ "title": "T", "content": "C" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing authorization token");

    let (status, body) = app
        .post(&client, "/articles", Some("garbage"), json!({ "title": "T" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid authorization token");

    let (_, body) = app.get(&client, "/api/articles").await;
    assert_eq!(body["articles"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_a_400() {
    let app = spawn_app().await;
    let response = Client::new()
        .post(format!("{}/register", app.address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Malformed request body");
}

#[tokio::test]
async fn test_messages_follow_configured_catalogue() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/messages/uk.json");
    let messages = Messages::load(path).expect("catalogue should parse");
    let router = create_router(test_state(Arc::new(InMemoryRepository::new()), messages));

    let register = || {
        Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"olena","password":"pw"}"#))
            .unwrap()
    };

    let response = router.clone().oneshot(register()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["message"], "Реєстрація пройшла успішно");

    let response = router.oneshot(register()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["message"], "Такий користувач вже існує");
}

#[tokio::test]
async fn test_unparsable_article_id_is_not_found() {
    let app = spawn_app().await;
    let client = Client::new();

    let (status, body) = app.get(&client, "/api/articles/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Article not found");

    let (status, body) = app.get(&client, "/articles/99999999999999999999/comments").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Article not found");

    let token = app.register_and_login(&client, "alice", "pw1").await;
    let (status, body) = app.post(&client, "/articles/abc/like", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Article not found");
}

#[tokio::test]
async fn test_login_without_fields_is_unauthorized() {
    let app = spawn_app().await;
    let client = Client::new();
    app.register_and_login(&client, "alice", "pw1").await;

    for body in [json!({}), json!({ "password": "pw1" }), json!({ "username": "alice", "password": "" })] {
        let (status, response) = app.post(&client, "/login", None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(response["message"], "Invalid login credentials");
    }
}
