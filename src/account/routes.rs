// src/account/routes.rs

use axum::{
    routing::{delete, get, put},
    Router,
};

use super::handlers;

/// Creates and returns the account self-service router
///
/// # Routes
/// - `GET /api/account` - Account settings payload
/// - `PUT /api/account/profile` - Update profile information
/// - `PUT /api/account/password` - Change password
/// - `DELETE /api/account` - Delete account
/// - `DELETE /api/account/link/:provider` - Unlink OAuth provider
pub fn account_routes() -> Router {
    Router::new()
        .route(
            "/api/account",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route("/api/account/profile", put(handlers::update_profile))
        .route("/api/account/password", put(handlers::change_password))
        .route(
            "/api/account/link/:provider",
            delete(handlers::unlink_provider),
        )
}
