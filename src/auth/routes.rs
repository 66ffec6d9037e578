//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/signup` - Create a local-credential account
/// - `POST /api/auth/login` - Sign in with email and password
/// - `GET /auth/:provider` - Redirect to the provider's authorization page
/// - `POST /api/auth/:provider/callback` - OAuth callback (link / sign-in / create)
/// - `POST /api/auth/logout` - Logout (client-side token removal)
/// - `GET /api/me` - Get current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login))
        .route("/auth/:provider", get(handlers::oauth_start))
        .route(
            "/api/auth/:provider/callback",
            post(handlers::oauth_callback),
        )
        .route("/api/auth/logout", post(handlers::logout_handler))
        .route("/api/me", get(handlers::me_handler))
}
