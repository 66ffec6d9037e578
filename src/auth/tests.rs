//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT token validation
//! - Provider table and profile normalizers
//! - The identity linker's four outcomes

#[cfg(test)]
mod tests {
    use super::super::*;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::str::FromStr;

    use super::super::linker::{link_identity, LinkOutcome, OAuthIdentity};
    use super::super::providers::{provider_avatar_url, provider_config, OAuthProfile, Provider};
    use crate::account::AccountService;
    use crate::common::ApiError;

    // ------------------------------------------------------------------
    // JWT
    // ------------------------------------------------------------------

    #[test]
    fn test_jwt_encoding_and_decoding() {
        let secret = "test_secret_key";
        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            exp: 9999999999, // Far future
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "U_TEST01");
        assert_eq!(decoded.claims.exp, 9999999999);
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_secret_key"),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(b"wrong_secret_key"),
            &Validation::new(Algorithm::HS256),
        );

        assert!(
            result.is_err(),
            "Token validation should fail with wrong secret"
        );
    }

    // ------------------------------------------------------------------
    // Provider table
    // ------------------------------------------------------------------

    #[test]
    fn test_provider_parsing_round_trip() {
        for provider in Provider::ALL {
            let parsed = Provider::from_str(provider.as_str()).expect("known provider");
            assert_eq!(parsed, provider);
        }
        assert!(Provider::from_str("myspace").is_err());
    }

    #[test]
    fn test_provider_config_covers_every_provider() {
        for provider in Provider::ALL {
            let config = provider_config(provider);
            assert_eq!(config.provider, provider);
            assert!(config.authorize_url.starts_with("https://"));
            assert!(config.token_url.starts_with("https://"));
            assert!(config.profile_url.starts_with("https://"));
        }
    }

    #[test]
    fn test_normalize_github_profile() {
        let payload = json!({
            "id": 583231,
            "login": "octocat",
            "name": "The Octocat",
            "email": "octocat@github.com",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231"
        });
        let profile = (provider_config(Provider::Github).normalize)(&payload)
            .expect("github payload should normalize");
        assert_eq!(profile.id, "583231");
        assert_eq!(profile.name.as_deref(), Some("The Octocat"));
        assert_eq!(profile.email.as_deref(), Some("octocat@github.com"));
        assert_eq!(
            profile.picture.as_deref(),
            Some("https://avatars.githubusercontent.com/u/583231")
        );
    }

    #[test]
    fn test_normalize_github_falls_back_to_login() {
        let payload = json!({ "id": 1, "login": "octocat", "name": null, "email": null });
        let profile = (provider_config(Provider::Github).normalize)(&payload)
            .expect("github payload should normalize");
        assert_eq!(profile.name.as_deref(), Some("octocat"));
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_normalize_google_profile() {
        let payload = json!({
            "sub": "1094-1234",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "picture": "https://lh3.googleusercontent.com/a/photo"
        });
        let profile = (provider_config(Provider::Google).normalize)(&payload)
            .expect("google payload should normalize");
        assert_eq!(profile.id, "1094-1234");
        assert_eq!(
            profile.picture.as_deref(),
            Some("https://lh3.googleusercontent.com/a/photo")
        );
    }

    #[test]
    fn test_normalize_facebook_joins_name_parts() {
        let payload = json!({
            "id": "fb-77",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com"
        });
        let profile = (provider_config(Provider::Facebook).normalize)(&payload)
            .expect("facebook payload should normalize");
        assert_eq!(profile.name.as_deref(), Some("Ada Lovelace"));
        // picture is composed from the id instead of read from the payload
        assert_eq!(
            provider_avatar_url(Provider::Facebook, &profile).as_deref(),
            Some("https://graph.facebook.com/fb-77/picture?type=large")
        );
    }

    #[test]
    fn test_normalize_twitter_handles_v2_envelope() {
        let payload = json!({
            "data": {
                "id": "2244994945",
                "name": "X Dev",
                "profile_image_url": "https://pbs.twimg.com/profile_images/x.png"
            }
        });
        let profile = (provider_config(Provider::Twitter).normalize)(&payload)
            .expect("twitter payload should normalize");
        assert_eq!(profile.id, "2244994945");
        assert_eq!(
            profile.picture.as_deref(),
            Some("https://pbs.twimg.com/profile_images/x.png")
        );
    }

    #[test]
    fn test_normalize_rejects_payload_without_id() {
        let payload = json!({ "login": "nobody" });
        assert!((provider_config(Provider::Github).normalize)(&payload).is_none());
    }

    // ------------------------------------------------------------------
    // Identity linker
    // ------------------------------------------------------------------

    async fn test_store() -> store::UserStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite pool");
        crate::common::migrations::run_migrations(&pool)
            .await
            .expect("migrations");
        store::UserStore::new(pool)
    }

    fn github_identity(external_id: &str, email: Option<&str>) -> OAuthIdentity {
        OAuthIdentity {
            provider: Provider::Github,
            profile: OAuthProfile {
                id: external_id.to_string(),
                email: email.map(str::to_string),
                name: Some("Octo Cat".to_string()),
                picture: Some("https://avatars.githubusercontent.com/u/1".to_string()),
            },
            access_token: "gho_token".to_string(),
            token_secret: None,
        }
    }

    #[tokio::test]
    async fn test_first_callback_creates_then_signs_in() {
        let store = test_store().await;
        let identity = github_identity("g1", Some("octo@example.com"));

        let first = link_identity(&store, &identity, None)
            .await
            .expect("create should succeed");
        let created_id = first.user().id.clone();
        assert!(matches!(first, LinkOutcome::Created(_)));
        assert_eq!(first.user().github.as_deref(), Some("g1"));
        assert_eq!(first.user().email.as_deref(), Some("octo@example.com"));

        // identical callback with no session reuses the same record
        let second = link_identity(&store, &identity, None)
            .await
            .expect("sign-in should succeed");
        assert!(matches!(second, LinkOutcome::SignedIn(_)));
        assert_eq!(second.user().id, created_id);

        // plain sign-in appends no token; only the create event is stored
        let tokens = store.tokens_for(&created_id).await.expect("tokens");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].provider, "github");
        assert_eq!(tokens[0].access_token, "gho_token");
    }

    #[tokio::test]
    async fn test_link_conflict_leaves_both_records_unmodified() {
        let store = test_store().await;

        // user A owns the github identity
        let owner = link_identity(&store, &github_identity("g1", None), None)
            .await
            .expect("create should succeed");
        let owner_before = store
            .find_by_id(&owner.user().id)
            .await
            .expect("query")
            .expect("owner exists");

        // user B has a session and tries to link the same identity
        let service = AccountService::new(store.clone());
        let other = service
            .create_local_account("bob@example.com", "pw1234", Some("Bob"))
            .await
            .expect("signup should succeed");

        let err = link_identity(&store, &github_identity("g1", None), Some(&other.id))
            .await
            .expect_err("link must be rejected");
        assert!(matches!(err, ApiError::LinkConflict(_)));

        let owner_after = store
            .find_by_id(&owner_before.id)
            .await
            .expect("query")
            .expect("owner still exists");
        let other_after = store
            .find_by_id(&other.id)
            .await
            .expect("query")
            .expect("other still exists");
        assert_eq!(owner_after.github, owner_before.github);
        assert!(other_after.github.is_none());
        assert!(store
            .tokens_for(&other.id)
            .await
            .expect("tokens")
            .is_empty());
    }

    #[tokio::test]
    async fn test_email_conflict_creates_no_record() {
        let store = test_store().await;
        let service = AccountService::new(store.clone());
        service
            .create_local_account("taken@example.com", "pw1234", None)
            .await
            .expect("signup should succeed");

        let err = link_identity(&store, &github_identity("g9", Some("taken@example.com")), None)
            .await
            .expect_err("create must be rejected");
        assert!(matches!(err, ApiError::EmailConflict));

        let ghost = store
            .find_by_provider_id(Provider::Github, "g9")
            .await
            .expect("query");
        assert!(ghost.is_none());
    }

    #[tokio::test]
    async fn test_link_path_fills_only_missing_fields() {
        let store = test_store().await;

        // session user with no email or name yet
        let sparse = models::User {
            id: "U_SPARSE".to_string(),
            email: None,
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
        store.insert(&sparse).await.expect("insert");

        let mut identity = github_identity("g42", Some("Filled@Example.com"));
        identity.token_secret = Some("s3cret".to_string());

        let outcome = link_identity(&store, &identity, Some("U_SPARSE"))
            .await
            .expect("link should succeed");
        assert!(matches!(outcome, LinkOutcome::Linked(_)));

        let user = outcome.user();
        assert_eq!(user.github.as_deref(), Some("g42"));
        assert_eq!(user.email.as_deref(), Some("filled@example.com"));
        assert_eq!(user.name.as_deref(), Some("Octo Cat"));
        assert_eq!(
            user.picture.as_deref(),
            Some("https://avatars.githubusercontent.com/u/1")
        );

        let tokens = store.tokens_for("U_SPARSE").await.expect("tokens");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_secret.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_link_path_keeps_existing_email_and_name() {
        let store = test_store().await;
        let service = AccountService::new(store.clone());
        let user = service
            .create_local_account("keep@example.com", "pw1234", Some("Keep Me"))
            .await
            .expect("signup should succeed");

        let outcome = link_identity(
            &store,
            &github_identity("g77", Some("other@example.com")),
            Some(&user.id),
        )
        .await
        .expect("link should succeed");

        let linked = outcome.user();
        assert_eq!(linked.email.as_deref(), Some("keep@example.com"));
        assert_eq!(linked.name.as_deref(), Some("Keep Me"));
        // the provider avatar wins over the gravatar placeholder
        assert_eq!(
            linked.picture.as_deref(),
            Some("https://avatars.githubusercontent.com/u/1")
        );
    }

    #[test]
    fn test_oauth_redirect_uri_targets_frontend_callback_page() {
        let uri = handlers::oauth_redirect_uri(Provider::Github);
        assert!(uri.ends_with("/auth/github/callback"));
        // the code lands on a client-side page, not an API route
        assert!(!uri.contains("/api/"));
    }

    #[tokio::test]
    async fn test_create_path_writes_nothing_when_token_insert_fails() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite pool");
        crate::common::migrations::run_migrations(&pool)
            .await
            .expect("migrations");
        // make the token insert fail mid-transaction
        sqlx::query("DROP TABLE auth_tokens")
            .execute(&pool)
            .await
            .expect("drop");
        let store = store::UserStore::new(pool);

        let err = link_identity(&store, &github_identity("g1", None), None)
            .await
            .expect_err("failed token insert must abort the create");
        assert!(matches!(err, ApiError::DatabaseError(_)));

        // the transaction rolled the user row back too
        let ghost = store
            .find_by_provider_id(Provider::Github, "g1")
            .await
            .expect("query");
        assert!(ghost.is_none());
    }

    #[tokio::test]
    async fn test_link_path_writes_nothing_when_token_insert_fails() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite pool");
        crate::common::migrations::run_migrations(&pool)
            .await
            .expect("migrations");
        let store = store::UserStore::new(pool.clone());

        let sparse = models::User {
            id: "U_ATOMIC".to_string(),
            email: None,
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
        store.insert(&sparse).await.expect("insert");

        sqlx::query("DROP TABLE auth_tokens")
            .execute(&pool)
            .await
            .expect("drop");

        let err = link_identity(&store, &github_identity("g1", None), Some("U_ATOMIC"))
            .await
            .expect_err("failed token insert must abort the link");
        assert!(matches!(err, ApiError::DatabaseError(_)));

        let user = store
            .find_by_id("U_ATOMIC")
            .await
            .expect("query")
            .expect("user still exists");
        assert!(user.github.is_none());
    }

    #[tokio::test]
    async fn test_signup_login_oauth_scenario() {
        let store = test_store().await;
        let service = AccountService::new(store.clone());

        // sign up and log in with local credentials
        let alice = service
            .create_local_account("alice@example.com", "pw1234", Some("Alice"))
            .await
            .expect("signup should succeed");
        let logged_in = service
            .verify_local_credentials("alice@example.com", "pw1234")
            .await
            .expect("login should succeed");
        assert_eq!(logged_in.id, alice.id);

        // anonymous github callback creates a second account
        let identity = github_identity("g1", None);
        let created = link_identity(&store, &identity, None)
            .await
            .expect("create should succeed");
        assert!(matches!(created, LinkOutcome::Created(_)));
        assert_eq!(created.user().github.as_deref(), Some("g1"));
        assert_ne!(created.user().id, alice.id);

        // repeating the callback signs in the same record
        let repeated = link_identity(&store, &identity, None)
            .await
            .expect("sign-in should succeed");
        assert!(matches!(repeated, LinkOutcome::SignedIn(_)));
        assert_eq!(repeated.user().id, created.user().id);

        // alice cannot claim the identity for her own account
        let err = link_identity(&store, &identity, Some(&alice.id))
            .await
            .expect_err("link must be rejected");
        assert!(matches!(err, ApiError::LinkConflict(_)));
    }
}
