use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Every mutating endpoint. The whole router sits behind `auth_middleware`, so each
/// handler gets the caller's identity from a verified bearer token; ownership-bound
/// operations additionally run the ownership guard.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /change_password
        // Re-reads the user row and re-checks the current password.
        .route("/change_password", post(handlers::change_password))
        // POST /articles
        // The owner is the token's user; it never changes afterwards.
        .route("/articles", post(handlers::create_article))
        // PUT/DELETE /articles/{id}
        // Owner only: 404 for unknown ids, 403 for anyone else.
        .route(
            "/articles/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
        // POST /articles/{id}/like, POST /articles/{id}/dislike
        // At most one of each per user per article.
        .route("/articles/{id}/like", post(handlers::like_article))
        .route("/articles/{id}/dislike", post(handlers::dislike_article))
        // POST /articles/{id}/comments
        .route("/articles/{id}/comments", post(handlers::add_comment))
}
