use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, AuthError},
    models::UserId,
    token::TokenIssuer,
};

/// AuthUser
///
/// The resolved identity of an authenticated request: the user id embedded in a
/// verified access token. The database is not consulted; handlers that need the full
/// record (e.g. `change_password`) load it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
}

/// Pulls the bearer token out of `Authorization`.
///
/// An absent or blank header is `Missing`; any other scheme or shape is `Invalid`.
pub fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Err(AuthError::Missing);
    };
    let value = value.to_str().map_err(|_| AuthError::Invalid)?.trim();
    if value.is_empty() {
        return Err(AuthError::Missing);
    }

    let mut it = value.split_whitespace();
    let scheme = it.next().ok_or(AuthError::Invalid)?;
    let token = it.next().ok_or(AuthError::Missing)?;

    if !scheme.eq_ignore_ascii_case("bearer") || it.next().is_some() {
        return Err(AuthError::Invalid);
    }
    Ok(token)
}

/// AuthUser Extractor Implementation
///
/// 1. Reuse the identity if `auth_middleware` already resolved it for this request.
/// 2. Extract the bearer token.
/// 3. Verify signature and expiry with the shared `TokenIssuer`.
///
/// Rejection: `AppError::Auth`, rendered as 401 with the matching message.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenIssuer>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let tokens = Arc::<TokenIssuer>::from_ref(state);
        let token = bearer_token(parts)?;
        let id = tokens.verify(token).inspect_err(|e| {
            tracing::debug!(uri = %parts.uri, "token rejected: {}", e);
        })?;

        Ok(AuthUser { id })
    }
}

/// auth_middleware
///
/// The guard wrapped around every authenticated route. It runs the `AuthUser`
/// extractor once and stores the identity in the request extensions for the handler.
/// There is no per-route exemption: routes that must stay public live in the public
/// router instead.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenIssuer>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    match AuthUser::from_request_parts(&mut parts, &tokens).await {
        Ok(user) => {
            parts.extensions.insert(user);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
