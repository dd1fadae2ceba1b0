use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue},
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services: credentials, tokens, authorization and the engagement rules.
pub mod auth;
pub mod credentials;
pub mod engagement;
pub mod ownership;
pub mod token;

// Persistence, payloads and the request boundary.
pub mod config;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod models;
pub mod repository;

// Routing segregation (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credentials::CredentialStore;
pub use messages::Messages;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use token::TokenIssuer;

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and browsable
/// at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::change_password,
        handlers::list_articles, handlers::get_article, handlers::create_article,
        handlers::update_article, handlers::delete_article, handlers::like_article,
        handlers::dislike_article, handlers::list_comments, handlers::add_comment
    ),
    components(
        schemas(
            models::ArticleSummary, models::ArticleList, models::Comment, models::CommentList,
            models::CredentialsRequest, models::ChangePasswordRequest,
            models::CreateArticleRequest, models::UpdateArticleRequest,
            models::CreateCommentRequest, models::TokenResponse, models::MessageResponse,
        )
    ),
    tags(
        (name = "article-hub", description = "Article publishing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of shared services. Cloned per request; every field
/// is either an `Arc` or cheap to copy.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres or in-memory).
    pub repo: RepositoryState,
    /// Access-token signer/verifier holding the process-wide secret.
    pub tokens: Arc<TokenIssuer>,
    /// Password hashing.
    pub credentials: CredentialStore,
    /// User-facing message catalogue.
    pub messages: Arc<Messages>,
    /// The loaded configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the token issuer and credential store from `config`.
    pub fn new(config: AppConfig, repo: RepositoryState, messages: Messages) -> Self {
        let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl);
        let credentials = CredentialStore::new(config.bcrypt_cost);

        Self {
            repo,
            tokens: Arc::new(tokens),
            credentials,
            messages: Arc::new(messages),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(app_state: &AppState) -> Arc<TokenIssuer> {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<Messages> {
    fn from_ref(app_state: &AppState) -> Arc<Messages> {
        app_state.messages.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match config
        .cors_origin
        .as_deref()
        .and_then(|o| HeaderValue::from_str(o).ok())
    {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(origin)
        .allow_headers(Any)
}

/// create_router
///
/// Assembles the routing structure, the authorization guard, message localisation and
/// the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No guard applied.
        .merge(public::public_routes())
        // Authenticated Routes: every one passes through `auth_middleware`.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.tokens.clone(),
                auth::auth_middleware,
            )),
        )
        // Render tagged responses with the configured message catalogue.
        .layer(middleware::from_fn_with_state(
            state.messages.clone(),
            messages::localize,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, uri and the `x-request-id`, so every log line of one
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
