use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing grouped by required privilege (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::{IdentityProvider, IdentityState, JwtCookieProvider};
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{Repository, RepositoryState, SqliteRepository};

use config::SuperuserSeed;
use error::AuthError;

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and browsable
/// through `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_item, handlers::delete_item, handlers::get_item, handlers::list_items,
        handlers::register_user, handlers::login, handlers::logout,
        handlers::forgot_password, handlers::reset_password,
        handlers::get_me, handlers::update_me, handlers::list_users, handlers::get_user,
        handlers::update_user, handlers::delete_user
    ),
    components(
        schemas(
            models::Item, models::CreateItemRequest, models::DeleteItemResponse,
            models::RegisterUserRequest, models::LoginForm, models::UpdateUserRequest,
            models::UserRead, models::ErrorBody, models::UpdateMeRequest,
            models::ForgotPasswordRequest, models::ResetPasswordRequest,
        )
    ),
    tags(
        (name = "items", description = "Item CRUD"),
        (name = "auth", description = "Registration and cookie sessions"),
        (name = "users", description = "Account inspection and moderation")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single immutable container of shared services, built once in `main` and cloned
/// into every request. Nothing here is a global.
#[derive(Clone)]
pub struct AppState {
    /// Item Store and user persistence.
    pub repo: RepositoryState,
    /// Session issuance and resolution.
    pub identity: IdentityState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors (notably the auth guards) pull only the component they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// bootstrap_superuser
///
/// Creates the configured first superuser (active, verified) unless that email is
/// already registered. Returns whether an account was created.
pub async fn bootstrap_superuser(
    state: &AppState,
    seed: &SuperuserSeed,
) -> Result<bool, AuthError> {
    if state.repo.get_user_by_email(&seed.email).await?.is_some() {
        return Ok(false);
    }
    let user = state
        .identity
        .register(&seed.email, &seed.password, true, true)
        .await?;
    tracing::info!(user_id = %user.id, "first superuser created");
    Ok(true)
}

/// create_router
///
/// Assembles the routing tree, registers the state, and wraps it in the tracing,
/// request-id and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: any origin, method and header, with credentials. Browsers reject `*`
    // alongside credentials, so the request's own values are mirrored back instead.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS outermost so preflight requests short-circuit before tracing.
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span carrying method, URI and the `x-request-id` value.
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
