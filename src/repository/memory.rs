use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{RepoError, RepoResult, Repository};
use crate::models::{
    Article, ArticleChanges, ArticleId, ArticleSummary, Category, CategoryId, Comment,
    EngagementKind, NewArticle, User, UserId,
};

#[derive(Default)]
struct Store {
    next_id: i64,
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    articles: BTreeMap<ArticleId, Article>,
    comments: BTreeMap<i64, Comment>,
    likes: HashSet<(UserId, ArticleId)>,
    dislikes: HashSet<(UserId, ArticleId)>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    // Stands in for the foreign key the Postgres schema puts on dependent rows.
    fn require_article(&self, article_id: ArticleId) -> RepoResult<()> {
        if self.articles.contains_key(&article_id) {
            Ok(())
        } else {
            Err(RepoError::MissingParent)
        }
    }

    fn engagements(&self, kind: EngagementKind) -> &HashSet<(UserId, ArticleId)> {
        match kind {
            EngagementKind::Like => &self.likes,
            EngagementKind::Dislike => &self.dislikes,
        }
    }

    fn engagements_mut(&mut self, kind: EngagementKind) -> &mut HashSet<(UserId, ArticleId)> {
        match kind {
            EngagementKind::Like => &mut self.likes,
            EngagementKind::Dislike => &mut self.dislikes,
        }
    }

    fn count(&self, kind: EngagementKind, article_id: ArticleId) -> i64 {
        self.engagements(kind)
            .iter()
            .filter(|(_, a)| *a == article_id)
            .count() as i64
    }

    fn summary(&self, article: &Article) -> ArticleSummary {
        ArticleSummary {
            id: article.id,
            title: article.title.clone(),
            content: article.content.clone(),
            category: article
                .category_id
                .and_then(|id| self.categories.get(&id))
                .map(|c| c.name.clone()),
            created_at: article.created_at,
            likes: self.count(EngagementKind::Like, article.id),
            dislikes: self.count(EngagementKind::Dislike, article.id),
        }
    }
}

/// InMemoryRepository
///
/// A process-local `Repository` with the same uniqueness and cascade semantics as the
/// Postgres schema. Used when no `DATABASE_URL` is configured in local mode and by the
/// test-suite. Each method holds the lock for its whole unit of work, so every
/// operation is atomic with respect to the others.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of comments still stored for an article, whether or not it exists.
    pub async fn comment_rows(&self, article_id: ArticleId) -> usize {
        let store = self.store.lock().await;
        store
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .count()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let store = self.store.lock().await;
        Ok(store.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.store.lock().await.users.get(&id).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User> {
        let mut store = self.store.lock().await;
        if store.users.values().any(|u| u.username == username) {
            return Err(RepoError::UniqueViolation);
        }
        let user = User {
            id: store.next_id(),
            username: username.to_owned(),
            password: password_hash.to_owned(),
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> RepoResult<bool> {
        let mut store = self.store.lock().await;
        match store.users.get_mut(&id) {
            Some(user) => {
                user.password = password_hash.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        Ok(self.store.lock().await.categories.get(&id).cloned())
    }

    async fn create_category(&self, name: &str) -> RepoResult<Category> {
        let mut store = self.store.lock().await;
        let category = Category {
            id: store.next_id(),
            name: name.to_owned(),
        };
        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_articles(&self) -> RepoResult<Vec<ArticleSummary>> {
        let store = self.store.lock().await;
        Ok(store.articles.values().map(|a| store.summary(a)).collect())
    }

    async fn get_article_summary(&self, id: ArticleId) -> RepoResult<Option<ArticleSummary>> {
        let store = self.store.lock().await;
        Ok(store.articles.get(&id).map(|a| store.summary(a)))
    }

    async fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        Ok(self.store.lock().await.articles.get(&id).cloned())
    }

    async fn create_article(&self, article: NewArticle) -> RepoResult<Article> {
        let mut store = self.store.lock().await;
        let created = Article {
            id: store.next_id(),
            user_id: article.user_id,
            category_id: article.category_id,
            title: article.title,
            content: article.content,
            created_at: Utc::now(),
        };
        store.articles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_article(
        &self,
        id: ArticleId,
        owner_id: UserId,
        changes: ArticleChanges,
    ) -> RepoResult<Option<Article>> {
        let mut store = self.store.lock().await;
        let Some(article) = store.articles.get_mut(&id).filter(|a| a.user_id == owner_id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            article.title = title;
        }
        if let Some(content) = changes.content {
            article.content = content;
        }
        if let Some(category_id) = changes.category_id {
            article.category_id = category_id;
        }
        Ok(Some(article.clone()))
    }

    async fn delete_article(&self, id: ArticleId, owner_id: UserId) -> RepoResult<bool> {
        let mut store = self.store.lock().await;
        if !store.articles.get(&id).is_some_and(|a| a.user_id == owner_id) {
            return Ok(false);
        }

        store.comments.retain(|_, c| c.article_id != id);
        store.likes.retain(|(_, a)| *a != id);
        store.dislikes.retain(|(_, a)| *a != id);
        store.articles.remove(&id);
        Ok(true)
    }

    async fn has_engagement(
        &self,
        kind: EngagementKind,
        user_id: UserId,
        article_id: ArticleId,
    ) -> RepoResult<bool> {
        let store = self.store.lock().await;
        Ok(store.engagements(kind).contains(&(user_id, article_id)))
    }

    async fn add_engagement(
        &self,
        kind: EngagementKind,
        user_id: UserId,
        article_id: ArticleId,
    ) -> RepoResult<()> {
        let mut store = self.store.lock().await;
        store.require_article(article_id)?;
        if store.engagements_mut(kind).insert((user_id, article_id)) {
            Ok(())
        } else {
            Err(RepoError::UniqueViolation)
        }
    }

    async fn count_engagements(
        &self,
        kind: EngagementKind,
        article_id: ArticleId,
    ) -> RepoResult<i64> {
        Ok(self.store.lock().await.count(kind, article_id))
    }

    async fn list_comments(&self, article_id: ArticleId) -> RepoResult<Vec<Comment>> {
        let store = self.store.lock().await;
        Ok(store
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .collect())
    }

    async fn add_comment(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        content: &str,
    ) -> RepoResult<Comment> {
        let mut store = self.store.lock().await;
        store.require_article(article_id)?;
        let comment = Comment {
            id: store.next_id(),
            content: content.to_owned(),
            user_id,
            article_id,
            created_at: Utc::now(),
        };
        store.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }
}
