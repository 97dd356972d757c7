use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session: read-only item access and the account entry
/// points.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /items (and /items/)
        // Every item, insertion order. Served with and without the trailing slash.
        .route("/items", get(handlers::list_items))
        .route("/items/", get(handlers::list_items))
        // GET /items/{id}
        // A single item, 404 when unknown.
        .route("/items/{id}", get(handlers::get_item))
        // POST /auth/register
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/jwt/login
        // Form credentials in, session cookie out.
        .route("/auth/jwt/login", post(handlers::login))
        // POST /auth/forgot-password
        // Logs a reset token for the account, if it exists and is active.
        .route("/auth/forgot-password", post(handlers::forgot_password))
        // POST /auth/reset-password
        .route("/auth/reset-password", post(handlers::reset_password))
}
