// src/account/service.rs
//! Account self-service operations over the user store.
//!
//! Password hashing and avatar derivation happen as explicit steps inside
//! these operations rather than as store-side lifecycle hooks, so editing
//! an unrelated field never re-hashes or re-derives anything.

use tracing::info;

use crate::auth::models::User;
use crate::auth::providers::Provider;
use crate::auth::store::UserStore;
use crate::common::error::map_unique_email_violation;
use crate::common::{generate_user_id, gravatar_url, safe_email_log, ApiError};
use crate::services::password::{hash_password, verify_password};

#[derive(Debug, Clone)]
pub struct AccountService {
    store: UserStore,
}

impl AccountService {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    /// Create a local-credential account. The picture is derived from the
    /// lower-cased email so it stays stable across sessions.
    pub async fn create_local_account(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, ApiError> {
        let email = email.to_lowercase();

        let existing = self
            .store
            .find_by_email(&email)
            .await
            .map_err(ApiError::DatabaseError)?;
        if existing.is_some() {
            return Err(ApiError::DuplicateEmail);
        }

        let password_hash =
            hash_password(password).map_err(|e| ApiError::InternalServer(e.to_string()))?;

        let user = User {
            id: generate_user_id(),
            picture: Some(gravatar_url(Some(&email))),
            email: Some(email),
            password_hash: Some(password_hash),
            name: name.map(str::to_string),
            facebook: None,
            twitter: None,
            google: None,
            github: None,
            created_at: None,
            updated_at: None,
        };

        // the unique index may still reject a concurrently-taken email
        self.store
            .insert(&user)
            .await
            .map_err(map_unique_email_violation)
    }

    /// Verify an email/password pair and return the matching record.
    ///
    /// A record with no password hash (pure-OAuth account) authenticates
    /// with any password input; this legacy behavior is the documented
    /// contract and is covered by tests.
    pub async fn verify_local_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = self
            .store
            .find_by_email(email)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or(ApiError::InvalidCredentials)?;

        match &user.password_hash {
            None => Ok(user),
            Some(hash) if verify_password(hash, password) => Ok(user),
            Some(_) => Err(ApiError::InvalidCredentials),
        }
    }

    /// Update email and/or display name. Changing the email re-derives the
    /// Gravatar picture; absent fields are left untouched.
    pub async fn update_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<User, ApiError> {
        let mut user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

        if let Some(email) = email {
            let email = email.to_lowercase();
            if user.email.as_deref() != Some(email.as_str()) {
                user.picture = Some(gravatar_url(Some(&email)));
                user.email = Some(email);
            }
        }
        if let Some(name) = name {
            user.name = Some(name.to_string());
        }

        self.store
            .save(&user)
            .await
            .map_err(map_unique_email_violation)?;

        info!(user_id = %user.id, "Profile information updated");
        Ok(user)
    }

    /// Change the local password after checking the current one with the
    /// same policy as login. New-password length and confirmation equality
    /// are the caller's input validation.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let mut user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

        if let Some(hash) = &user.password_hash {
            if !verify_password(hash, current_password) {
                return Err(ApiError::CurrentPasswordMismatch);
            }
        }

        user.password_hash =
            Some(hash_password(new_password).map_err(|e| ApiError::InternalServer(e.to_string()))?);

        self.store
            .save(&user)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Delete the account and every stored token. Terminal: there is no
    /// soft delete, and the caller's session dies with the record.
    pub async fn delete_account(&self, user_id: &str) -> Result<(), ApiError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

        self.store
            .remove(&user.id)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %user.id,
            email = %user.email.as_deref().map(safe_email_log).unwrap_or_default(),
            "Account deleted"
        );
        Ok(())
    }

    /// Clear one provider link and drop all of that provider's tokens.
    pub async fn unlink_provider(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> Result<User, ApiError> {
        let mut user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

        user.set_provider_link(provider, None);

        self.store
            .save(&user)
            .await
            .map_err(ApiError::DatabaseError)?;
        self.store
            .delete_tokens(&user.id, provider)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(user_id = %user.id, provider = %provider, "Provider account unlinked");
        Ok(user)
    }
}
