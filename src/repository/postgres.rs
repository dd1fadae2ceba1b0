use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepoError, RepoResult, Repository};
use crate::models::{
    Article, ArticleChanges, ArticleId, ArticleSummary, Category, CategoryId, Comment,
    EngagementKind, NewArticle, User, UserId,
};

// Counts are computed per request rather than denormalized onto the article row.
const SUMMARY_SELECT: &str = r#"
    SELECT
        a.id, a.title, a.content, c.name AS category, a.created_at,
        (SELECT COUNT(*) FROM article_likes l WHERE l.article_id = a.id) AS likes,
        (SELECT COUNT(*) FROM article_dislikes d WHERE d.article_id = a.id) AS dislikes
    FROM articles a
    LEFT JOIN categories c ON c.id = a.category_id
"#;

const ARTICLE_COLUMNS: &str = "id, user_id, category_id, title, content, created_at";

fn constraint_error(err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::UniqueViolation,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::MissingParent,
        _ => RepoError::Database(err),
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL. Schema
/// lives in `migrations/`; the unique indexes there close the check-then-insert races
/// for usernames and engagements.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT id, username, password FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// A concurrent registration that slipped past the handler's pre-check lands here as
    /// a unique violation on `users.username`.
    async fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING id, username, password",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    async fn create_category(&self, name: &str) -> RepoResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn list_articles(&self) -> RepoResult<Vec<ArticleSummary>> {
        let query = format!("{SUMMARY_SELECT} ORDER BY a.id");
        let articles = sqlx::query_as::<_, ArticleSummary>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn get_article_summary(&self, id: ArticleId) -> RepoResult<Option<ArticleSummary>> {
        let query = format!("{SUMMARY_SELECT} WHERE a.id = $1");
        let article = sqlx::query_as::<_, ArticleSummary>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn create_article(&self, article: NewArticle) -> RepoResult<Article> {
        let query = format!(
            "INSERT INTO articles (user_id, category_id, title, content, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {ARTICLE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Article>(&query)
            .bind(article.user_id)
            .bind(article.category_id)
            .bind(article.title)
            .bind(article.content)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// update_article
    ///
    /// `COALESCE` keeps columns whose new value is `None`. `category_id` is only written
    /// when the caller supplied the key, so an explicit `null` clears it.
    /// `user_id` and `created_at` are never part of the `SET` list.
    async fn update_article(
        &self,
        id: ArticleId,
        owner_id: UserId,
        changes: ArticleChanges,
    ) -> RepoResult<Option<Article>> {
        let query = format!(
            r#"
            UPDATE articles
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                category_id = CASE WHEN $5 THEN $6 ELSE category_id END
            WHERE id = $1 AND user_id = $2
            RETURNING {ARTICLE_COLUMNS}
            "#
        );
        let set_category = changes.category_id.is_some();
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(changes.title)
            .bind(changes.content)
            .bind(set_category)
            .bind(changes.category_id.flatten())
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    /// delete_article
    ///
    /// One transaction: lock the owned row, remove dependents, remove the article. If the
    /// row is gone or owned by someone else nothing is touched.
    async fn delete_article(&self, id: ArticleId, owner_id: UserId) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM articles WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        for statement in [
            "DELETE FROM comments WHERE article_id = $1",
            "DELETE FROM article_likes WHERE article_id = $1",
            "DELETE FROM article_dislikes WHERE article_id = $1",
            "DELETE FROM articles WHERE id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn has_engagement(
        &self,
        kind: EngagementKind,
        user_id: UserId,
        article_id: ArticleId,
    ) -> RepoResult<bool> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND article_id = $2)",
            kind.table()
        );
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(user_id)
            .bind(article_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// add_engagement
    ///
    /// Plain insert; `UNIQUE (user_id, article_id)` on the table serializes concurrent
    /// attempts and the loser gets `UniqueViolation`.
    async fn add_engagement(
        &self,
        kind: EngagementKind,
        user_id: UserId,
        article_id: ArticleId,
    ) -> RepoResult<()> {
        let query = format!(
            "INSERT INTO {} (user_id, article_id) VALUES ($1, $2)",
            kind.table()
        );
        sqlx::query(&query)
            .bind(user_id)
            .bind(article_id)
            .execute(&self.pool)
            .await
            .map_err(constraint_error)?;
        Ok(())
    }

    async fn count_engagements(
        &self,
        kind: EngagementKind,
        article_id: ArticleId,
    ) -> RepoResult<i64> {
        let query = format!("SELECT COUNT(*) FROM {} WHERE article_id = $1", kind.table());
        let count = sqlx::query_scalar::<_, i64>(&query)
            .bind(article_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_comments(&self, article_id: ArticleId) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, user_id, article_id, created_at
            FROM comments
            WHERE article_id = $1
            ORDER BY id
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn add_comment(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        content: &str,
    ) -> RepoResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, user_id, article_id, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, content, user_id, article_id, created_at
            "#,
        )
        .bind(content)
        .bind(user_id)
        .bind(article_id)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)?;
        Ok(comment)
    }
}
