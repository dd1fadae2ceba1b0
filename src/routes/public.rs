use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that require no token. They either create credentials or only read data.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        .route("/register", post(handlers::register))
        // POST /login
        // Returns `{"access_token": ...}` for valid credentials.
        .route("/login", post(handlers::login))
        // GET /api/articles
        // All articles with category name and like/dislike counts.
        .route("/api/articles", get(handlers::list_articles))
        // GET /api/articles/{id}
        .route("/api/articles/{id}", get(handlers::get_article))
        // GET /articles/{id}/comments
        // 404 when the article does not exist, even though comments are public.
        .route("/articles/{id}/comments", get(handlers::list_comments))
}
