use crate::{
    AppState,
    auth::AuthUser,
    engagement::EngagementLedger,
    error::{AppError, AppResult, AuthError, DuplicateKind, Entity},
    messages::{MessageKey, Notice},
    models::{
        ArticleId, ArticleList, ArticleSummary, ChangePasswordRequest, CommentList,
        CreateArticleRequest, CreateCommentRequest, CredentialsRequest, EngagementKind,
        MessageResponse, NewArticle, TokenResponse, UpdateArticleRequest, UserId,
    },
    ownership::{Mutation, authorize_mutation},
    repository::RepoError,
};
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
};

// --- Extractors ---

/// ApiJson
///
/// `axum::Json` whose rejection is an `AppError::Validation`, so malformed bodies get the
/// same `{"message": ...}` envelope as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// ApiPath
///
/// `axum::extract::Path` for article ids. An id that does not parse names no article,
/// so the rejection is a 404 in the usual envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required_credentials(payload: CredentialsRequest) -> AppResult<(String, String)> {
    match (non_empty(payload.username), non_empty(payload.password)) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(AppError::Validation(MessageKey::MissingCredentials)),
    }
}

// --- Account Handlers ---

/// register
///
/// [Public Route] Creates a user with a bcrypt-hashed password.
///
/// The username lookup is a fast-path refusal only; a concurrent registration that gets
/// past it is stopped by the unique constraint and reported the same way.
#[utoipa::path(
    post,
    path = "/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Registered", body = MessageResponse),
        (status = 400, description = "Username taken or missing fields", body = MessageResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> AppResult<Notice> {
    let (username, password) = required_credentials(payload)?;

    if state.repo.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Duplicate(DuplicateKind::Username));
    }

    let hash = state.credentials.hash_blocking(password).await?;

    let user = state
        .repo
        .create_user(&username, &hash)
        .await
        .map_err(|e| match e {
            RepoError::UniqueViolation => AppError::Duplicate(DuplicateKind::Username),
            e => e.into(),
        })?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(Notice(StatusCode::CREATED, MessageKey::Registered))
}

/// login
///
/// [Public Route] Exchanges valid credentials for an access token. Unknown usernames and
/// wrong passwords are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> AppResult<Json<TokenResponse>> {
    // Absent fields are treated as empty and simply fail to match.
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let Some(user) = state.repo.find_user_by_username(&username).await? else {
        return Err(AuthError::BadCredentials.into());
    };

    if !state
        .credentials
        .verify_blocking(password, user.password)
        .await
    {
        return Err(AuthError::BadCredentials.into());
    }

    let access_token = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, "login succeeded");
    Ok(Json(TokenResponse { access_token }))
}

/// change_password
///
/// [Authenticated Route] Replaces the caller's password after re-checking the current one.
///
/// The user row is re-read here even though the token already names the user: a token
/// may outlive the account it was issued for.
#[utoipa::path(
    post,
    path = "/change_password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Wrong current password or bad token", body = MessageResponse),
        (status = 404, description = "User no longer exists", body = MessageResponse)
    )
)]
pub async fn change_password(
    AuthUser { id }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> AppResult<Notice> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(AppError::NotFound(Entity::User))?;

    let current = payload.current_password.unwrap_or_default();
    if !state.credentials.verify_blocking(current, user.password).await {
        return Err(AuthError::WrongPassword.into());
    }

    let new_password = non_empty(payload.new_password)
        .ok_or(AppError::Validation(MessageKey::MissingNewPassword))?;
    let hash = state.credentials.hash_blocking(new_password).await?;

    if !state.repo.update_password(id, &hash).await? {
        return Err(AppError::NotFound(Entity::User));
    }

    tracing::info!(user_id = id, "password changed");
    Ok(Notice(StatusCode::OK, MessageKey::PasswordChanged))
}

// --- Article Handlers ---

/// list_articles
///
/// [Public Route] Every article with category name and like/dislike counts.
#[utoipa::path(
    get,
    path = "/api/articles",
    responses((status = 200, description = "All articles", body = ArticleList))
)]
pub async fn list_articles(State(state): State<AppState>) -> AppResult<Json<ArticleList>> {
    let articles = state.repo.list_articles().await?;
    Ok(Json(ArticleList { articles }))
}

/// get_article
///
/// [Public Route] A single article in the same shape as the list entries.
#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = ArticleSummary),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArticleId>,
) -> AppResult<Json<ArticleSummary>> {
    state
        .repo
        .get_article_summary(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(Entity::Article))
}

/// create_article
///
/// [Authenticated Route] The owner is always the token's user. A `category_id` naming no
/// category is dropped rather than refused.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = CreateArticleRequest,
    responses((status = 201, description = "Created", body = MessageResponse))
)]
pub async fn create_article(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateArticleRequest>,
) -> AppResult<Notice> {
    let category_id = match payload.category_id {
        Some(category_id) => state.repo.get_category(category_id).await?.map(|c| c.id),
        None => None,
    };

    let article = state
        .repo
        .create_article(NewArticle {
            user_id,
            category_id,
            title: payload.title.unwrap_or_default(),
            content: payload.content.unwrap_or_default(),
        })
        .await?;

    tracing::info!(article_id = article.id, user_id, "article created");
    Ok(Notice(StatusCode::CREATED, MessageKey::ArticleCreated))
}

/// update_article
///
/// [Authenticated Route] Partial update, owner only. Ownership is checked here to tell
/// 404 from 403, and again by the repository's `WHERE user_id = ...`.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 403, description = "Not Owner", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn update_article(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArticleId>,
    ApiJson(payload): ApiJson<UpdateArticleRequest>,
) -> AppResult<Notice> {
    let article = state.repo.get_article(id).await?;
    authorize_mutation(article.as_ref(), user_id, Mutation::Update)?;

    if let Some(Some(category_id)) = payload.category_id {
        if state.repo.get_category(category_id).await?.is_none() {
            return Err(AppError::Validation(MessageKey::UnknownCategory));
        }
    }

    match state.repo.update_article(id, user_id, payload.into()).await? {
        Some(_) => Ok(Notice(StatusCode::OK, MessageKey::ArticleUpdated)),
        // Deleted between the ownership check and the update.
        None => Err(AppError::NotFound(Entity::Article)),
    }
}

/// delete_article
///
/// [Authenticated Route] Owner only. Comments, likes and dislikes go with the article in
/// the same transaction.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not Owner", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn delete_article(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArticleId>,
) -> AppResult<Notice> {
    let article = state.repo.get_article(id).await?;
    authorize_mutation(article.as_ref(), user_id, Mutation::Delete)?;

    if !state.repo.delete_article(id, user_id).await? {
        return Err(AppError::NotFound(Entity::Article));
    }

    tracing::info!(article_id = id, user_id, "article deleted");
    Ok(Notice(StatusCode::OK, MessageKey::ArticleDeleted))
}

// --- Engagement Handlers ---

async fn engage(
    state: &AppState,
    kind: EngagementKind,
    user_id: UserId,
    article_id: ArticleId,
) -> AppResult<()> {
    if state.repo.get_article(article_id).await?.is_none() {
        return Err(AppError::NotFound(Entity::Article));
    }
    EngagementLedger::new(state.repo.clone())
        .add(kind, user_id, article_id)
        .await?;
    Ok(())
}

/// like_article
///
/// [Authenticated Route] One like per user per article; a repeat is a 400.
#[utoipa::path(
    post,
    path = "/articles/{id}/like",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 201, description = "Like added", body = MessageResponse),
        (status = 400, description = "Already liked", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn like_article(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArticleId>,
) -> AppResult<Notice> {
    engage(&state, EngagementKind::Like, user_id, id).await?;
    Ok(Notice(StatusCode::CREATED, MessageKey::LikeAdded))
}

/// dislike_article
///
/// [Authenticated Route] One dislike per user per article. Independent of likes.
#[utoipa::path(
    post,
    path = "/articles/{id}/dislike",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 201, description = "Dislike added", body = MessageResponse),
        (status = 400, description = "Already disliked", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn dislike_article(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArticleId>,
) -> AppResult<Notice> {
    engage(&state, EngagementKind::Dislike, user_id, id).await?;
    Ok(Notice(StatusCode::CREATED, MessageKey::DislikeAdded))
}

// --- Comment Handlers ---

/// list_comments
///
/// [Public Route] Comments of an existing article, oldest first.
#[utoipa::path(
    get,
    path = "/articles/{id}/comments",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Comments", body = CommentList),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArticleId>,
) -> AppResult<Json<CommentList>> {
    if state.repo.get_article(id).await?.is_none() {
        return Err(AppError::NotFound(Entity::Article));
    }
    let comments = state.repo.list_comments(id).await?;
    Ok(Json(CommentList { comments }))
}

/// add_comment
///
/// [Authenticated Route] Any authenticated user may comment on any article.
#[utoipa::path(
    post,
    path = "/articles/{id}/comments",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = MessageResponse),
        (status = 404, description = "Not Found", body = MessageResponse)
    )
)]
pub async fn add_comment(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArticleId>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> AppResult<Notice> {
    if state.repo.get_article(id).await?.is_none() {
        return Err(AppError::NotFound(Entity::Article));
    }

    let comment = state
        .repo
        .add_comment(id, user_id, &payload.content.unwrap_or_default())
        .await?;

    tracing::info!(comment_id = comment.id, article_id = id, user_id, "comment added");
    Ok(Notice(StatusCode::CREATED, MessageKey::CommentAdded))
}
