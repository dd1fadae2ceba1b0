use std::{
    fs,
    path::Path,
    sync::{Arc, OnceLock},
};

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::models::MessageResponse;

/// MessageKey
///
/// Every user-facing outcome the API can report. Handlers and errors name a key;
/// the text comes from the configured `Messages` catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    Registered,
    UsernameTaken,
    MissingCredentials,
    BadCredentials,
    UserNotFound,
    WrongCurrentPassword,
    MissingNewPassword,
    PasswordChanged,
    MissingToken,
    InvalidToken,
    ExpiredToken,
    ArticleNotFound,
    ArticleCreated,
    ArticleUpdated,
    ArticleDeleted,
    EditForbidden,
    DeleteForbidden,
    UnknownCategory,
    LikeAdded,
    AlreadyLiked,
    DislikeAdded,
    AlreadyDisliked,
    CommentAdded,
    InvalidBody,
    Internal,
}

/// Messages
///
/// The message catalogue. Defaults to English; a JSON file may override any subset of
/// fields, e.g. `messages/uk.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub registered: String,
    pub username_taken: String,
    pub missing_credentials: String,
    pub bad_credentials: String,
    pub user_not_found: String,
    pub wrong_current_password: String,
    pub missing_new_password: String,
    pub password_changed: String,
    pub missing_token: String,
    pub invalid_token: String,
    pub expired_token: String,
    pub article_not_found: String,
    pub article_created: String,
    pub article_updated: String,
    pub article_deleted: String,
    pub edit_forbidden: String,
    pub delete_forbidden: String,
    pub unknown_category: String,
    pub like_added: String,
    pub already_liked: String,
    pub dislike_added: String,
    pub already_disliked: String,
    pub comment_added: String,
    pub invalid_body: String,
    pub internal: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            registered: "Registration successful".into(),
            username_taken: "This user already exists".into(),
            missing_credentials: "Username and password are required".into(),
            bad_credentials: "Invalid login credentials".into(),
            user_not_found: "User not found".into(),
            wrong_current_password: "Current password is incorrect".into(),
            missing_new_password: "A new password is required".into(),
            password_changed: "Password changed successfully".into(),
            missing_token: "Missing authorization token".into(),
            invalid_token: "Invalid authorization token".into(),
            expired_token: "Authorization token has expired".into(),
            article_not_found: "Article not found".into(),
            article_created: "Article created successfully".into(),
            article_updated: "Article updated successfully".into(),
            article_deleted: "Article deleted successfully".into(),
            edit_forbidden: "You are not allowed to edit this article".into(),
            delete_forbidden: "You are not allowed to delete this article".into(),
            unknown_category: "Category does not exist".into(),
            like_added: "Like added".into(),
            already_liked: "You have already liked this article".into(),
            dislike_added: "Dislike added".into(),
            already_disliked: "You have already disliked this article".into(),
            comment_added: "Comment added successfully".into(),
            invalid_body: "Malformed request body".into(),
            internal: "Internal server error".into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MessagesError {
    #[error("cannot read message catalogue: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse message catalogue: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Messages {
    /// Reads a JSON catalogue; keys missing from the file keep their English default.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MessagesError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn get(&self, key: MessageKey) -> &str {
        match key {
            MessageKey::Registered => &self.registered,
            MessageKey::UsernameTaken => &self.username_taken,
            MessageKey::MissingCredentials => &self.missing_credentials,
            MessageKey::BadCredentials => &self.bad_credentials,
            MessageKey::UserNotFound => &self.user_not_found,
            MessageKey::WrongCurrentPassword => &self.wrong_current_password,
            MessageKey::MissingNewPassword => &self.missing_new_password,
            MessageKey::PasswordChanged => &self.password_changed,
            MessageKey::MissingToken => &self.missing_token,
            MessageKey::InvalidToken => &self.invalid_token,
            MessageKey::ExpiredToken => &self.expired_token,
            MessageKey::ArticleNotFound => &self.article_not_found,
            MessageKey::ArticleCreated => &self.article_created,
            MessageKey::ArticleUpdated => &self.article_updated,
            MessageKey::ArticleDeleted => &self.article_deleted,
            MessageKey::EditForbidden => &self.edit_forbidden,
            MessageKey::DeleteForbidden => &self.delete_forbidden,
            MessageKey::UnknownCategory => &self.unknown_category,
            MessageKey::LikeAdded => &self.like_added,
            MessageKey::AlreadyLiked => &self.already_liked,
            MessageKey::DislikeAdded => &self.dislike_added,
            MessageKey::AlreadyDisliked => &self.already_disliked,
            MessageKey::CommentAdded => &self.comment_added,
            MessageKey::InvalidBody => &self.invalid_body,
            MessageKey::Internal => &self.internal,
        }
    }
}

/// Builds `{"message": ...}` from the default catalogue and tags the response with its key
/// so `localize` can swap in the configured text.
pub fn render(status: StatusCode, key: MessageKey) -> Response {
    static DEFAULTS: OnceLock<Messages> = OnceLock::new();

    let body = MessageResponse {
        message: DEFAULTS.get_or_init(Messages::default).get(key).to_owned(),
    };
    let mut response = (status, Json(body)).into_response();
    response.extensions_mut().insert(key);
    response
}

/// Notice
///
/// A success response that carries only a message, e.g. `201 {"message": "Like added"}`.
#[derive(Debug, Clone, Copy)]
pub struct Notice(pub StatusCode, pub MessageKey);

impl IntoResponse for Notice {
    fn into_response(self) -> Response {
        render(self.0, self.1)
    }
}

/// localize
///
/// Middleware that re-renders every message-tagged response with the text of the
/// configured catalogue.
pub async fn localize(
    State(messages): State<Arc<Messages>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let Some(key) = response.extensions().get::<MessageKey>().copied() else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let body = MessageResponse {
        message: messages.get(key).to_owned(),
    };
    let mut localized = (parts.status, Json(body)).into_response();
    localized.extensions_mut().insert(key);
    localized
}
