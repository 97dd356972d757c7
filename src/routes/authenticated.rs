use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Endpoints for any active account. Item creation additionally demands a verified
/// account; `create_item` enforces that with the `ActiveVerifiedUser` guard.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /items/ (and /items)
        // Creates an item. Served with and without the trailing slash.
        .route("/items/", post(handlers::create_item))
        .route("/items", post(handlers::create_item))
        // POST /auth/jwt/logout
        .route("/auth/jwt/logout", post(handlers::logout))
        // GET/PATCH /users/me
        // PATCH changes the caller's own email or password.
        .route("/users/me", get(handlers::get_me).patch(handlers::update_me))
}
