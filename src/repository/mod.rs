use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    Article, ArticleChanges, ArticleId, ArticleSummary, Category, CategoryId, Comment,
    EngagementKind, NewArticle, User, UserId,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepoError
///
/// `UniqueViolation` is the persistence layer refusing a duplicate username, like or
/// dislike. It is the authority on uniqueness; application pre-checks only exist to
/// answer early.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("unique constraint violated")]
    UniqueViolation,

    /// A dependent row (engagement, comment) named an article that no longer exists.
    #[error("referenced row does not exist")]
    MissingParent,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The persistence contract consumed by the handlers, the engagement ledger and the
/// authorization pipeline. Every method is one unit of work: it commits fully or not
/// at all.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    // Fails with `UniqueViolation` if the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User>;
    // Returns false if the user no longer exists.
    async fn update_password(&self, id: UserId, password_hash: &str) -> RepoResult<bool>;

    // --- Categories ---
    async fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    async fn create_category(&self, name: &str) -> RepoResult<Category>;

    // --- Articles ---
    async fn list_articles(&self) -> RepoResult<Vec<ArticleSummary>>;
    async fn get_article_summary(&self, id: ArticleId) -> RepoResult<Option<ArticleSummary>>;
    async fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    async fn create_article(&self, article: NewArticle) -> RepoResult<Article>;
    /// Owner-Only: affects the row only when `owner_id` matches. `None` otherwise.
    async fn update_article(
        &self,
        id: ArticleId,
        owner_id: UserId,
        changes: ArticleChanges,
    ) -> RepoResult<Option<Article>>;
    /// Owner-Only: removes the article together with its comments, likes and dislikes.
    async fn delete_article(&self, id: ArticleId, owner_id: UserId) -> RepoResult<bool>;

    // --- Engagements ---
    async fn has_engagement(
        &self,
        kind: EngagementKind,
        user_id: UserId,
        article_id: ArticleId,
    ) -> RepoResult<bool>;
    // Fails with `UniqueViolation` if the (user, article) pair is already recorded and
    // with `MissingParent` if the article is gone.
    async fn add_engagement(
        &self,
        kind: EngagementKind,
        user_id: UserId,
        article_id: ArticleId,
    ) -> RepoResult<()>;
    async fn count_engagements(&self, kind: EngagementKind, article_id: ArticleId)
    -> RepoResult<i64>;

    // --- Comments ---
    async fn list_comments(&self, article_id: ArticleId) -> RepoResult<Vec<Comment>>;
    // Fails with `MissingParent` if the article is gone.
    async fn add_comment(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        content: &str,
    ) -> RepoResult<Comment>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
