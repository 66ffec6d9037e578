//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::providers::Provider;

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// User identity record
///
/// `email` and `password_hash` are both optional: a third-party-only
/// account has neither until a profile edit or password change sets them.
/// The four provider columns hold the external id of the linked account,
/// one per provider at most.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub google: Option<String>,
    pub github: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl User {
    pub fn provider_link(&self, provider: Provider) -> Option<&str> {
        let link = match provider {
            Provider::Facebook => &self.facebook,
            Provider::Twitter => &self.twitter,
            Provider::Google => &self.google,
            Provider::Github => &self.github,
        };
        link.as_deref()
    }

    pub fn set_provider_link(&mut self, provider: Provider, external_id: Option<String>) {
        let slot = match provider {
            Provider::Facebook => &mut self.facebook,
            Provider::Twitter => &mut self.twitter,
            Provider::Google => &mut self.google,
            Provider::Github => &mut self.github,
        };
        *slot = external_id;
    }

    /// Providers currently linked to this record.
    pub fn linked_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.provider_link(*p).is_some())
            .collect()
    }
}

/// One stored credential grant from a provider. Appended on every
/// successful link or first-time sign-in, never deduplicated.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct AuthToken {
    pub id: i64,
    pub user_id: String,
    pub provider: String,
    pub access_token: String,
    pub token_secret: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth callback body. Either an authorization `code` the server
/// exchanges itself, or a ready `access_token` (plus the OAuth1-style
/// `token_secret` for providers whose first leg is signed client-side).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthCallbackRequest {
    pub code: Option<String>,
    pub access_token: Option<String>,
    pub token_secret: Option<String>,
    pub redirect_uri: Option<String>,
}
