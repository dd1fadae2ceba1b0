use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

/// Surrogate keys are BIGSERIAL columns.
pub type UserId = i64;
pub type ArticleId = i64;
pub type CategoryId = i64;

/// Wire format for every timestamp the API returns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_timestamp<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}

// Distinguishes an absent key (outer `None`) from an explicit `null` (`Some(None)`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Row of the `users` table. `password` always holds a bcrypt hash and is never serialized.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String,
}

/// Category
///
/// Optional grouping for articles. Categories are seeded, not managed over HTTP.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema, Default)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Article
///
/// Row of the `articles` table. `user_id` and `created_at` are fixed at insertion.
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: ArticleId,
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// ArticleSummary
///
/// Read model for `GET /api/articles` and `GET /api/articles/{id}`: the article joined with
/// its category name, plus like/dislike counts computed at query time.
#[derive(Debug, Clone, Serialize, FromRow, TS, ToSchema)]
#[ts(export)]
pub struct ArticleSummary {
    #[ts(type = "number")]
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    #[serde(serialize_with = "format_timestamp")]
    #[ts(type = "string")]
    #[schema(value_type = String, example = "2024-05-01 09:30:00")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "number")]
    pub likes: i64,
    #[ts(type = "number")]
    pub dislikes: i64,
}

/// Comment
///
/// Row of the `comments` table. The parent article id is known to the caller and is
/// left out of the JSON view.
#[derive(Debug, Clone, Serialize, FromRow, TS, ToSchema)]
#[ts(export)]
pub struct Comment {
    #[ts(type = "number")]
    pub id: i64,
    pub content: String,
    #[ts(type = "number")]
    pub user_id: UserId,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub article_id: ArticleId,
    #[serde(serialize_with = "format_timestamp")]
    #[ts(type = "string")]
    #[schema(value_type = String, example = "2024-05-01 09:30:00")]
    pub created_at: DateTime<Utc>,
}

/// Which engagement table a like/dislike operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngagementKind {
    Like,
    Dislike,
}

impl EngagementKind {
    pub fn table(self) -> &'static str {
        match self {
            EngagementKind::Like => "article_likes",
            EngagementKind::Dislike => "article_dislikes",
        }
    }
}

/// NewArticle
///
/// Fully resolved insert for the repository: owner taken from the token, category
/// already checked for existence.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub content: String,
}

/// ArticleChanges
///
/// Partial update. `None` keeps the stored value; `category_id: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Option<CategoryId>>,
}

// --- Request Payloads (Input Schemas) ---

/// CredentialsRequest
///
/// Body of `POST /register` and `POST /login`. Fields are optional on the wire; the
/// handlers reject absent or empty values.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// ChangePasswordRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// CreateArticleRequest
///
/// Input payload for `POST /articles`. A `category_id` that matches no category is
/// stored as "no category".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateArticleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub category_id: Option<CategoryId>,
}

/// UpdateArticleRequest
///
/// Partial update payload for `PUT /articles/{id}`. Omitted fields are preserved;
/// `"category_id": null` detaches the article from its category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    #[schema(value_type = Option<i64>)]
    pub category_id: Option<Option<CategoryId>>,
}

impl From<UpdateArticleRequest> for ArticleChanges {
    fn from(req: UpdateArticleRequest) -> Self {
        ArticleChanges {
            title: req.title,
            content: req.content,
            category_id: req.category_id,
        }
    }
}

/// CreateCommentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: Option<String>,
}

// --- Response Envelopes ---

/// TokenResponse
///
/// Returned by a successful `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
}

/// MessageResponse
///
/// Envelope for every notice and error: a single human-readable `message`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArticleList {
    pub articles: Vec<ArticleSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentList {
    pub comments: Vec<Comment>,
}
