use crate::{
    models::{ArticleId, EngagementKind, UserId},
    repository::{RepoError, RepositoryState},
};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("user already holds a {0:?} on this article")]
    DuplicateEngagement(EngagementKind),

    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// EngagementLedger
///
/// At most one like and at most one dislike per (user, article). Liking and disliking
/// the same article are independent; holding both at once is allowed.
///
/// The `has_engagement` pre-check only gives a fast, friendly refusal. The repository's
/// unique constraint decides the race when two identical requests pass the pre-check
/// together; the loser is reported exactly like a sequential duplicate.
#[derive(Clone)]
pub struct EngagementLedger {
    repo: RepositoryState,
}

impl EngagementLedger {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn add_like(&self, user_id: UserId, article_id: ArticleId) -> Result<(), LedgerError> {
        self.add(EngagementKind::Like, user_id, article_id).await
    }

    pub async fn add_dislike(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<(), LedgerError> {
        self.add(EngagementKind::Dislike, user_id, article_id).await
    }

    pub async fn count_likes(&self, article_id: ArticleId) -> Result<i64, LedgerError> {
        Ok(self
            .repo
            .count_engagements(EngagementKind::Like, article_id)
            .await?)
    }

    pub async fn count_dislikes(&self, article_id: ArticleId) -> Result<i64, LedgerError> {
        Ok(self
            .repo
            .count_engagements(EngagementKind::Dislike, article_id)
            .await?)
    }

    pub async fn add(
        &self,
        kind: EngagementKind,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<(), LedgerError> {
        if self.repo.has_engagement(kind, user_id, article_id).await? {
            return Err(LedgerError::DuplicateEngagement(kind));
        }

        match self.repo.add_engagement(kind, user_id, article_id).await {
            Ok(()) => {
                tracing::info!(user_id, article_id, ?kind, "engagement recorded");
                Ok(())
            }
            Err(RepoError::UniqueViolation) => Err(LedgerError::DuplicateEngagement(kind)),
            Err(e) => Err(e.into()),
        }
    }
}
