// src/auth/linker.rs
//! Identity linker: reconciles one OAuth callback against the credential
//! store and the caller's session, producing exactly one of four outcomes.
//!
//! Overview of the policy (account merging is never supported):
//! - Caller is already signed in ("link" path):
//!   - Another record owns this (provider, external id) pair -> reject.
//!   - Otherwise link the provider to the session user, append the token,
//!     and fill email/name only if currently empty.
//! - Caller is anonymous ("sign-in or create" path):
//!   - A record owns the pair -> sign that record in, untouched.
//!   - Another record owns the profile email -> reject.
//!   - Otherwise create a fresh record from the profile.
//!
//! The existence checks and the following write are not transactional; a
//! concurrent callback for the same new identity can race past the check
//! and lose at the store's unique index, which surfaces as a generic
//! persistence failure. Callers may retry with a fresh read; this routine
//! never retries on its own.

use tracing::{debug, info};

use super::models::User;
use super::providers::{provider_avatar_url, OAuthProfile, Provider};
use super::store::UserStore;
use crate::common::{generate_user_id, safe_email_log, ApiError};

/// Everything one OAuth callback carries into the linker.
#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    pub provider: Provider,
    pub profile: OAuthProfile,
    pub access_token: String,
    /// OAuth1-style secondary secret, where the provider issues one.
    pub token_secret: Option<String>,
}

/// The three success outcomes. The conflict outcomes are errors
/// (`ApiError::LinkConflict`, `ApiError::EmailConflict`).
#[derive(Debug)]
pub enum LinkOutcome {
    /// Provider linked to the already-authenticated user.
    Linked(User),
    /// Returning identity signed in; record untouched.
    SignedIn(User),
    /// First-time identity; a new record was created.
    Created(User),
}

impl LinkOutcome {
    pub fn user(&self) -> &User {
        match self {
            LinkOutcome::Linked(u) | LinkOutcome::SignedIn(u) | LinkOutcome::Created(u) => u,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            LinkOutcome::Linked(_) => "linked",
            LinkOutcome::SignedIn(_) => "signed_in",
            LinkOutcome::Created(_) => "created",
        }
    }
}

/// Reconcile one OAuth callback. At most one record is written per call;
/// the conflict paths write nothing.
pub async fn link_identity(
    store: &UserStore,
    identity: &OAuthIdentity,
    session_user_id: Option<&str>,
) -> Result<LinkOutcome, ApiError> {
    match session_user_id {
        Some(user_id) => link_to_session_user(store, identity, user_id).await,
        None => sign_in_or_create(store, identity).await,
    }
}

async fn link_to_session_user(
    store: &UserStore,
    identity: &OAuthIdentity,
    session_user_id: &str,
) -> Result<LinkOutcome, ApiError> {
    let provider = identity.provider;

    let existing = store
        .find_by_provider_id(provider, &identity.profile.id)
        .await
        .map_err(ApiError::DatabaseError)?;

    if existing.is_some() {
        debug!(
            provider = %provider,
            external_id = %identity.profile.id,
            "Link rejected: provider id already belongs to another account"
        );
        return Err(ApiError::LinkConflict(provider.display_name().to_string()));
    }

    let mut user = store
        .find_by_id(session_user_id)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("session user no longer exists".to_string()))?;

    user.set_provider_link(provider, Some(identity.profile.id.clone()));
    if user.email.is_none() {
        user.email = identity.profile.email.as_deref().map(str::to_lowercase);
    }
    if user.name.is_none() {
        user.name = identity.profile.name.clone();
    }
    user.picture = provider_avatar_url(provider, &identity.profile).or(user.picture);

    // one transaction: the link never lands without its token grant
    store
        .save_with_token(
            &user,
            provider,
            &identity.access_token,
            identity.token_secret.as_deref(),
        )
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = %user.id, provider = %provider, "Provider account linked");

    Ok(LinkOutcome::Linked(user))
}

async fn sign_in_or_create(
    store: &UserStore,
    identity: &OAuthIdentity,
) -> Result<LinkOutcome, ApiError> {
    let provider = identity.provider;

    let existing = store
        .find_by_provider_id(provider, &identity.profile.id)
        .await
        .map_err(ApiError::DatabaseError)?;

    // Returning identity: plain sign-in, no field refresh
    if let Some(user) = existing {
        info!(user_id = %user.id, provider = %provider, "Returning OAuth identity signed in");
        return Ok(LinkOutcome::SignedIn(user));
    }

    let email = identity.profile.email.as_deref().map(str::to_lowercase);

    if let Some(email) = &email {
        let email_owner = store
            .find_by_email(email)
            .await
            .map_err(ApiError::DatabaseError)?;
        if email_owner.is_some() {
            debug!(
                provider = %provider,
                email = %safe_email_log(email),
                "Create rejected: email already registered under another account"
            );
            return Err(ApiError::EmailConflict);
        }
    }

    let mut user = User {
        id: generate_user_id(),
        email,
        password_hash: None,
        name: identity.profile.name.clone(),
        picture: provider_avatar_url(provider, &identity.profile),
        facebook: None,
        twitter: None,
        google: None,
        github: None,
        created_at: None,
        updated_at: None,
    };
    user.set_provider_link(provider, Some(identity.profile.id.clone()));

    // one transaction: the record never lands without its token grant
    let user = store
        .insert_with_token(
            &user,
            provider,
            &identity.access_token,
            identity.token_secret.as_deref(),
        )
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %user.id,
        provider = %provider,
        "Created new account from OAuth identity"
    );

    Ok(LinkOutcome::Created(user))
}
