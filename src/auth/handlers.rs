//! Authentication handlers

use axum::extract::{Extension, Json, Path};
use axum::response::Redirect;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::AuthedUser;
use super::linker::{link_identity, OAuthIdentity};
use super::models::{Claims, LoginRequest, OAuthCallbackRequest, SignupRequest};
use super::providers::Provider;
use super::store::UserStore;
use super::validators::{LoginValidator, SignupValidator};
use crate::account::service::AccountService;
use crate::common::{safe_email_log, ApiError, AppState, Validator};

/// Issue a 24h session token for a user id.
pub fn issue_jwt(user_id: &str, secret: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}

/// Redirect URI registered with the provider. OAUTH_REDIRECT_BASE must be
/// the frontend origin: the provider sends the browser to
/// `{base}/auth/{provider}/callback?code=...`, a client-side page that
/// relays the code to `POST /api/auth/:provider/callback`. The default
/// matches the first default CORS origin.
pub fn oauth_redirect_uri(provider: Provider) -> String {
    let base = std::env::var("OAUTH_REDIRECT_BASE")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    format!("{}/auth/{}/callback", base, provider)
}

/// POST /api/auth/signup
/// Create a local-credential account and sign it in.
pub async fn signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = SignupValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let service = AccountService::new(UserStore::new(state.db.clone()));
    let user = service
        .create_local_account(&payload.email, &payload.password, payload.name.as_deref())
        .await?;

    let token = issue_jwt(&user.id, &state.jwt_secret)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&payload.email),
        "New local account created"
    );

    Ok(Json(serde_json::json!({
        "token": token,
        "user": user,
    })))
}

/// POST /api/auth/login
/// Sign in using email and password.
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = LoginValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let service = AccountService::new(UserStore::new(state.db.clone()));
    let user = service
        .verify_local_credentials(&payload.email, &payload.password)
        .await?;

    let token = issue_jwt(&user.id, &state.jwt_secret)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&payload.email),
        "User logged in with local credentials"
    );

    Ok(Json(serde_json::json!({
        "token": token,
        "user": user,
    })))
}

/// GET /auth/:provider
/// Redirect the caller to the provider's authorization page.
pub async fn oauth_start(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(provider): Path<Provider>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    let redirect_uri = oauth_redirect_uri(provider);
    let auth_url = state
        .oauth
        .authorization_url(provider, &redirect_uri)
        .map_err(|e| {
            warn!(provider = %provider, error = %e, "Failed to build authorization URL");
            ApiError::BadRequest(e.to_string())
        })?;

    info!(provider = %provider, "Starting OAuth flow");
    Ok(Redirect::to(&auth_url))
}

/// POST /api/auth/:provider/callback
/// Run the identity linker for one OAuth callback.
///
/// With a valid bearer token this is the link path; anonymous calls take
/// the sign-in-or-create path. The response carries the outcome tag, the
/// resolved user, and a fresh session token.
pub async fn oauth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: Option<AuthedUser>,
    Path(provider): Path<Provider>,
    Json(payload): Json<OAuthCallbackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let (access_token, token_secret) = match (&payload.code, &payload.access_token) {
        (Some(code), _) => {
            let redirect_uri = payload
                .redirect_uri
                .clone()
                .unwrap_or_else(|| oauth_redirect_uri(provider));
            let token_response = state
                .oauth
                .exchange_code(provider, code, &redirect_uri)
                .await
                .map_err(|e| {
                    warn!(provider = %provider, error = %e, "Code exchange failed");
                    ApiError::BadRequest(e.to_string())
                })?;
            (token_response.access_token, None)
        }
        (None, Some(access_token)) => (access_token.clone(), payload.token_secret.clone()),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either code or accessToken is required".to_string(),
            ));
        }
    };

    let profile = state
        .oauth
        .fetch_profile(provider, &access_token)
        .await
        .map_err(|e| {
            warn!(provider = %provider, error = %e, "Profile fetch failed");
            ApiError::BadRequest(e.to_string())
        })?;

    let identity = OAuthIdentity {
        provider,
        profile,
        access_token,
        token_secret,
    };

    let store = UserStore::new(state.db.clone());
    let outcome = link_identity(&store, &identity, authed.as_ref().map(|a| a.id.as_str())).await?;

    let token = issue_jwt(&outcome.user().id, &state.jwt_secret)?;

    Ok(Json(serde_json::json!({
        "outcome": outcome.tag(),
        "token": token,
        "user": outcome.user(),
    })))
}

/// GET /api/me
/// Returns the current authenticated user's record.
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let store = UserStore::new(state.db.clone());
    let user = store
        .find_by_id(&authed.id)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(Json(serde_json::json!({ "user": user })))
}

/// POST /api/auth/logout
/// Sessions are bearer JWTs, so logout is client-side token disposal;
/// this endpoint just confirms the request.
pub async fn logout_handler(_authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!("User logout successful");
    Ok(Json(serde_json::json!({
        "message": "Logout successful"
    })))
}
