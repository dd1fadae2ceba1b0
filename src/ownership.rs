use crate::models::{Article, UserId};

/// The two article mutations that require ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    #[error("article does not exist")]
    NotFound,
    #[error("requesting user does not own the article ({0:?})")]
    Forbidden(Mutation),
}

/// authorize_mutation
///
/// Ownership is the only basis for mutating an article: the requester must be the user
/// who created it. Run identically before update and delete; `mutation` only selects
/// which refusal the caller reports.
pub fn authorize_mutation(
    article: Option<&Article>,
    requesting_user_id: UserId,
    mutation: Mutation,
) -> Result<&Article, OwnershipError> {
    let article = article.ok_or(OwnershipError::NotFound)?;

    if article.user_id != requesting_user_id {
        tracing::warn!(
            article_id = article.id,
            owner_id = article.user_id,
            requesting_user_id,
            ?mutation,
            "ownership check refused"
        );
        return Err(OwnershipError::Forbidden(mutation));
    }

    Ok(article)
}
