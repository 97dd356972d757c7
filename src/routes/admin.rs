use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get},
};

/// Admin Router Module
///
/// Endpoints reserved for active superusers: item removal and account moderation.
/// Each handler takes the `Superuser` guard, which answers 401 without a session and
/// 403 for any other account.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // DELETE /items/{id}
        // Shares its path with the public GET; axum merges the two method routers.
        .route("/items/{id}", delete(handlers::delete_item))
        // GET /users
        .route("/users", get(handlers::list_users))
        // GET/PATCH/DELETE /users/{id}
        // PATCH is how an operator marks an account verified or grants superuser.
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
