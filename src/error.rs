use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    credentials::CredentialError,
    engagement::LedgerError,
    messages::{MessageKey, render},
    models::EngagementKind,
    ownership::{Mutation, OwnershipError},
    repository::RepoError,
};

pub type AppResult<T> = std::result::Result<T, AppError>;

/// AuthError
///
/// Failures of the authorization pipeline (token checks) and of credential checks at
/// login / password change. All map to 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no bearer token presented")]
    Missing,
    #[error("token signature or structure is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("unknown username or wrong password")]
    BadCredentials,
    #[error("current password does not match")]
    WrongPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Article,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    Username,
    Like,
    Dislike,
}

impl From<EngagementKind> for DuplicateKind {
    fn from(kind: EngagementKind) -> Self {
        match kind {
            EngagementKind::Like => DuplicateKind::Like,
            EngagementKind::Dislike => DuplicateKind::Dislike,
        }
    }
}

/// AppError
///
/// The request-boundary error taxonomy. Every variant is recovered here and turned into
/// a status code plus a catalogue message; nothing propagates past the handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0:?}")]
    Validation(MessageKey),

    #[error("unauthorized: {0}")]
    Auth(#[from] AuthError),

    #[error("{0:?} not found")]
    NotFound(Entity),

    #[error("forbidden: {0:?}")]
    Forbidden(Mutation),

    #[error("duplicate {0:?}")]
    Duplicate(DuplicateKind),

    #[error("repository failure: {0}")]
    Repository(#[from] RepoError),

    #[error("credential failure: {0}")]
    Credential(#[from] CredentialError),

    #[error("token signing failure: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<OwnershipError> for AppError {
    fn from(err: OwnershipError) -> Self {
        match err {
            OwnershipError::NotFound => AppError::NotFound(Entity::Article),
            OwnershipError::Forbidden(mutation) => AppError::Forbidden(mutation),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateEngagement(kind) => AppError::Duplicate(kind.into()),
            LedgerError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {}", rejection.body_text());
        AppError::Validation(MessageKey::InvalidBody)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("rejected path parameter: {}", rejection.body_text());
        AppError::NotFound(Entity::Article)
    }
}

impl AppError {
    pub fn status_and_key(&self) -> (StatusCode, MessageKey) {
        match self {
            AppError::Validation(key) => (StatusCode::BAD_REQUEST, *key),
            AppError::Auth(auth) => {
                let key = match auth {
                    AuthError::Missing => MessageKey::MissingToken,
                    AuthError::Invalid => MessageKey::InvalidToken,
                    AuthError::Expired => MessageKey::ExpiredToken,
                    AuthError::BadCredentials => MessageKey::BadCredentials,
                    AuthError::WrongPassword => MessageKey::WrongCurrentPassword,
                };
                (StatusCode::UNAUTHORIZED, key)
            }
            AppError::NotFound(Entity::User) => (StatusCode::NOT_FOUND, MessageKey::UserNotFound),
            AppError::NotFound(Entity::Article) => {
                (StatusCode::NOT_FOUND, MessageKey::ArticleNotFound)
            }
            AppError::Forbidden(Mutation::Update) => {
                (StatusCode::FORBIDDEN, MessageKey::EditForbidden)
            }
            AppError::Forbidden(Mutation::Delete) => {
                (StatusCode::FORBIDDEN, MessageKey::DeleteForbidden)
            }
            AppError::Duplicate(DuplicateKind::Username) => {
                (StatusCode::BAD_REQUEST, MessageKey::UsernameTaken)
            }
            AppError::Duplicate(DuplicateKind::Like) => {
                (StatusCode::BAD_REQUEST, MessageKey::AlreadyLiked)
            }
            AppError::Duplicate(DuplicateKind::Dislike) => {
                (StatusCode::BAD_REQUEST, MessageKey::AlreadyDisliked)
            }
            // The article vanished between the handler's lookup and the dependent insert.
            AppError::Repository(RepoError::MissingParent) => {
                (StatusCode::NOT_FOUND, MessageKey::ArticleNotFound)
            }
            AppError::Repository(_) | AppError::Credential(_) | AppError::Token(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, MessageKey::Internal)
            }
        }
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, key) = self.status_and_key();

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        render(status, key)
    }
}
