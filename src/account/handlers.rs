// src/account/handlers.rs
//! Account self-service handlers (settings page backend)

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::models::{ChangePasswordRequest, MessageResponse, UpdateProfileRequest};
use super::service::AccountService;
use super::validators::{PasswordChangeValidator, ProfileUpdateValidator};
use crate::auth::providers::Provider;
use crate::auth::store::UserStore;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(UserStore::new(state.db.clone()))
}

/// GET /api/account
/// Current user plus linked providers and stored token kinds, for the
/// account settings view.
pub async fn get_account(
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

    let tokens = store
        .tokens_for(&user.id)
        .await
        .map_err(ApiError::DatabaseError)?;
    let token_kinds: Vec<&str> = tokens.iter().map(|t| t.provider.as_str()).collect();

    Ok(Json(serde_json::json!({
        "user": user,
        "linked_providers": user.linked_providers(),
        "token_kinds": token_kinds,
    })))
}

/// PUT /api/account/profile
/// Update profile information.
pub async fn update_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = ProfileUpdateValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let user = account_service(&state)
        .update_profile(&authed.id, payload.email.as_deref(), payload.name.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Profile information has been updated.",
        "user": user,
    })))
}

/// PUT /api/account/password
/// Change the current password.
pub async fn change_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = PasswordChangeValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    account_service(&state)
        .change_password(&authed.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been changed.".to_string(),
    }))
}

/// DELETE /api/account
/// Delete the account. The bearer token dies with the record because the
/// extractor no longer finds the user.
pub async fn delete_account(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    account_service(&state).delete_account(&authed.id).await?;

    info!(user_id = %authed.id, "Account deletion completed");
    Ok(Json(MessageResponse {
        message: "Your account has been deleted.".to_string(),
    }))
}

/// DELETE /api/account/link/:provider
/// Unlink an OAuth provider and drop its stored tokens.
pub async fn unlink_provider(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(provider): Path<Provider>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = account_service(&state)
        .unlink_provider(&authed.id, provider)
        .await?;

    Ok(Json(serde_json::json!({
        "message": format!("{} account has been unlinked.", provider.display_name()),
        "user": user,
    })))
}
