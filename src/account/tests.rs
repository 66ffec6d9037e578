//! Tests for account module
//!
//! These tests verify account self-service functionality including:
//! - Request validation
//! - Local account creation and credential verification
//! - Password change, profile update, deletion and provider unlinking

#[cfg(test)]
mod tests {
    use super::super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::super::models::{ChangePasswordRequest, UpdateProfileRequest};
    use super::super::validators::{PasswordChangeValidator, ProfileUpdateValidator};
    use crate::auth::providers::Provider;
    use crate::auth::store::UserStore;
    use crate::common::error::map_unique_email_violation;
    use crate::common::{gravatar_url, ApiError, Validator};

    // ------------------------------------------------------------------
    // Validators
    // ------------------------------------------------------------------

    #[test]
    fn test_profile_update_validation_success() {
        let request = UpdateProfileRequest {
            email: Some("new@example.com".to_string()),
            name: Some("New Name".to_string()),
        };
        let result = ProfileUpdateValidator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_profile_update_validation_bad_email() {
        let request = UpdateProfileRequest {
            email: Some("not-an-email".to_string()),
            name: None,
        };
        let result = ProfileUpdateValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "email"));
    }

    #[test]
    fn test_profile_update_validation_bad_name() {
        let request = UpdateProfileRequest {
            email: None,
            name: Some("x".to_string()), // too short
        };
        let result = ProfileUpdateValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "name"));
    }

    #[test]
    fn test_password_change_validation_short_password() {
        let request = ChangePasswordRequest {
            current_password: "old".to_string(),
            new_password: "abc".to_string(),
            confirm_password: "abc".to_string(),
        };
        let result = PasswordChangeValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "newPassword"));
    }

    #[test]
    fn test_password_change_validation_confirmation_mismatch() {
        let request = ChangePasswordRequest {
            current_password: "old1".to_string(),
            new_password: "new1234".to_string(),
            confirm_password: "different".to_string(),
        };
        let result = PasswordChangeValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "confirmPassword"));
    }

    // ------------------------------------------------------------------
    // Account service
    // ------------------------------------------------------------------

    async fn test_service() -> AccountService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite pool");
        crate::common::migrations::run_migrations(&pool)
            .await
            .expect("migrations");
        AccountService::new(UserStore::new(pool))
    }

    #[tokio::test]
    async fn test_signup_then_login_round_trip() {
        let service = test_service().await;

        let user = service
            .create_local_account("Alice@Example.com", "pw1234", Some("Alice"))
            .await
            .expect("signup should succeed");
        // email is lower-cased on write and the picture derived from it
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(
            user.picture.as_deref(),
            Some(gravatar_url(Some("alice@example.com")).as_str())
        );

        let verified = service
            .verify_local_credentials("alice@example.com", "pw1234")
            .await
            .expect("login should succeed");
        assert_eq!(verified.id, user.id);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_fails() {
        let service = test_service().await;
        service
            .create_local_account("alice@example.com", "pw1234", None)
            .await
            .expect("signup should succeed");

        let err = service
            .verify_local_credentials("alice@example.com", "wrong")
            .await
            .expect_err("wrong password must fail");
        assert!(matches!(err, ApiError::InvalidCredentials));

        let err = service
            .verify_local_credentials("nobody@example.com", "pw1234")
            .await
            .expect_err("unknown email must fail");
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_signup_with_taken_email_fails() {
        let service = test_service().await;
        service
            .create_local_account("alice@example.com", "pw1234", None)
            .await
            .expect("signup should succeed");

        let err = service
            .create_local_account("ALICE@example.com", "other99", None)
            .await
            .expect_err("duplicate email must fail");
        assert!(matches!(err, ApiError::DuplicateEmail));
    }

    // A racer that passes the find_by_email pre-check still loses at the
    // unique index, and that loss maps onto the same error the pre-check
    // produces.
    #[tokio::test]
    async fn test_lost_email_race_maps_to_duplicate_email() {
        let service = test_service().await;
        service
            .create_local_account("alice@example.com", "pw1234", None)
            .await
            .expect("signup should succeed");

        let clash = crate::auth::models::User {
            id: "U_RACER1".to_string(),
            email: Some("alice@example.com".to_string()),
            password_hash: None,
            name: None,
            picture: None,
            facebook: None,
            twitter: None,
            google: None,
            github: None,
            created_at: None,
            updated_at: None,
        };
        let err = service
            .store()
            .insert(&clash)
            .await
            .expect_err("unique index must reject the second insert");
        assert!(matches!(
            map_unique_email_violation(err),
            ApiError::DuplicateEmail
        ));
    }

    // Documented legacy behavior: an account with no password hash
    // (pure-OAuth account) passes the credential check with any input.
    #[tokio::test]
    async fn test_passwordless_account_verifies_with_any_password() {
        let service = test_service().await;
        let user = crate::auth::models::User {
            id: "U_OAUTH1".to_string(),
            email: Some("oauth@example.com".to_string()),
            password_hash: None,
            name: None,
            picture: None,
            facebook: None,
            twitter: None,
            google: None,
            github: Some("g1".to_string()),
            created_at: None,
            updated_at: None,
        };
        service.store().insert(&user).await.expect("insert");

        let verified = service
            .verify_local_credentials("oauth@example.com", "anything-at-all")
            .await
            .expect("passwordless account matches any password");
        assert_eq!(verified.id, "U_OAUTH1");
    }

    #[tokio::test]
    async fn test_change_password_swaps_which_password_verifies() {
        let service = test_service().await;
        let user = service
            .create_local_account("alice@example.com", "old1234", None)
            .await
            .expect("signup should succeed");

        service
            .change_password(&user.id, "old1234", "new1234")
            .await
            .expect("password change should succeed");

        let err = service
            .verify_local_credentials("alice@example.com", "old1234")
            .await
            .expect_err("old password must no longer verify");
        assert!(matches!(err, ApiError::InvalidCredentials));

        service
            .verify_local_credentials("alice@example.com", "new1234")
            .await
            .expect("new password should verify");
    }

    #[tokio::test]
    async fn test_change_password_rejects_wrong_current_password() {
        let service = test_service().await;
        let user = service
            .create_local_account("alice@example.com", "old1234", None)
            .await
            .expect("signup should succeed");

        let err = service
            .change_password(&user.id, "not-the-password", "new1234")
            .await
            .expect_err("wrong current password must fail");
        assert!(matches!(err, ApiError::CurrentPasswordMismatch));

        // the old password still works
        service
            .verify_local_credentials("alice@example.com", "old1234")
            .await
            .expect("old password should still verify");
    }

    #[tokio::test]
    async fn test_update_profile_rederives_picture_on_email_change() {
        let service = test_service().await;
        let user = service
            .create_local_account("alice@example.com", "pw1234", Some("Alice"))
            .await
            .expect("signup should succeed");

        let updated = service
            .update_profile(&user.id, Some("Renamed@Example.com"), None)
            .await
            .expect("update should succeed");
        assert_eq!(updated.email.as_deref(), Some("renamed@example.com"));
        assert_eq!(
            updated.picture.as_deref(),
            Some(gravatar_url(Some("renamed@example.com")).as_str())
        );
        // name was not supplied, so it is untouched
        assert_eq!(updated.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let service = test_service().await;
        service
            .create_local_account("taken@example.com", "pw1234", None)
            .await
            .expect("signup should succeed");
        let user = service
            .create_local_account("mine@example.com", "pw1234", None)
            .await
            .expect("signup should succeed");

        let err = service
            .update_profile(&user.id, Some("taken@example.com"), None)
            .await
            .expect_err("taken email must fail");
        assert!(matches!(err, ApiError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_delete_account_removes_record_and_tokens() {
        let service = test_service().await;
        let user = service
            .create_local_account("alice@example.com", "pw1234", None)
            .await
            .expect("signup should succeed");
        service
            .store()
            .append_token(&user.id, Provider::Github, "gho_token", None)
            .await
            .expect("append token");

        service
            .delete_account(&user.id)
            .await
            .expect("delete should succeed");

        assert!(service
            .store()
            .find_by_id(&user.id)
            .await
            .expect("query")
            .is_none());
        assert!(service
            .store()
            .tokens_for(&user.id)
            .await
            .expect("tokens")
            .is_empty());

        let err = service
            .delete_account(&user.id)
            .await
            .expect_err("second delete must fail");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unlink_provider_clears_link_and_its_tokens_only() {
        let service = test_service().await;
        let mut user = crate::auth::models::User {
            id: "U_MULTI1".to_string(),
            email: Some("multi@example.com".to_string()),
            password_hash: None,
            name: None,
            picture: None,
            facebook: None,
            twitter: None,
            google: Some("goog-1".to_string()),
            github: Some("gh-1".to_string()),
            created_at: None,
            updated_at: None,
        };
        user = service.store().insert(&user).await.expect("insert");
        service
            .store()
            .append_token(&user.id, Provider::Github, "gho_token", None)
            .await
            .expect("append token");
        service
            .store()
            .append_token(&user.id, Provider::Google, "ya29_token", None)
            .await
            .expect("append token");

        let unlinked = service
            .unlink_provider(&user.id, Provider::Github)
            .await
            .expect("unlink should succeed");
        assert!(unlinked.github.is_none());
        assert_eq!(unlinked.google.as_deref(), Some("goog-1"));

        let tokens = service.store().tokens_for(&user.id).await.expect("tokens");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].provider, "google");
    }
}
