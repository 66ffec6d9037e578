// src/services/oauth.rs
//! Outbound OAuth plumbing: authorize-URL building, code exchange and
//! profile fetch against the provider table in `auth::providers`.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::providers::{provider_config, OAuthProfile, Provider};

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{0} OAuth not configured")]
    NotConfigured(Provider),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("{0} profile payload missing required fields")]
    ProfileRejected(Provider),
}

/// Client credentials for one provider, read from the environment.
#[derive(Debug, Clone)]
struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

/// Token endpoint response. GitHub omits everything but the access token,
/// so all other fields are optional.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct OAuthService {
    client: Client,
    credentials: HashMap<Provider, ClientCredentials>,
}

impl OAuthService {
    /// Reads per-provider client credentials from the environment
    /// (FACEBOOK_ID/FACEBOOK_SECRET, TWITTER_KEY/TWITTER_SECRET,
    /// GOOGLE_ID/GOOGLE_SECRET, GITHUB_ID/GITHUB_SECRET). Providers with
    /// no credentials stay unconfigured and fail per-request, not at boot.
    pub fn from_env() -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        let env_keys = [
            (Provider::Facebook, "FACEBOOK_ID", "FACEBOOK_SECRET"),
            (Provider::Twitter, "TWITTER_KEY", "TWITTER_SECRET"),
            (Provider::Google, "GOOGLE_ID", "GOOGLE_SECRET"),
            (Provider::Github, "GITHUB_ID", "GITHUB_SECRET"),
        ];

        let mut credentials = HashMap::new();
        for (provider, id_key, secret_key) in env_keys {
            if let (Ok(client_id), Ok(client_secret)) = (env::var(id_key), env::var(secret_key)) {
                if !client_id.is_empty() && !client_secret.is_empty() {
                    credentials.insert(
                        provider,
                        ClientCredentials {
                            client_id,
                            client_secret,
                        },
                    );
                    debug!(provider = %provider, "Loaded OAuth client credentials");
                }
            }
        }

        Self {
            client,
            credentials,
        }
    }

    fn credentials(&self, provider: Provider) -> Result<&ClientCredentials, OAuthError> {
        self.credentials
            .get(&provider)
            .ok_or(OAuthError::NotConfigured(provider))
    }

    /// Get authorization URL for the OAuth flow
    pub fn authorization_url(
        &self,
        provider: Provider,
        redirect_uri: &str,
    ) -> Result<String, OAuthError> {
        let config = provider_config(provider);
        let creds = self.credentials(provider)?;

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            config.authorize_url,
            urlencoding::encode(&creds.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(config.scopes)
        );

        debug!(provider = %provider, "Generated OAuth authorization URL");
        Ok(auth_url)
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthError> {
        let config = provider_config(provider);
        let creds = self.credentials(provider)?;

        let params = [
            ("code", code),
            ("client_id", &creds.client_id),
            ("client_secret", &creds.client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        debug!(provider = %provider, "Exchanging authorization code for tokens");

        let response = self
            .client
            .post(config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(provider = %provider, status = %status, error = %error_text, "Token exchange failed");
            return Err(OAuthError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))
    }

    /// Fetch and normalize the provider profile for an access token
    pub async fn fetch_profile(
        &self,
        provider: Provider,
        access_token: &str,
    ) -> Result<OAuthProfile, OAuthError> {
        let config = provider_config(provider);

        let response = self
            .client
            .get(config.profile_url)
            .bearer_auth(access_token)
            // GitHub rejects requests without a User-Agent
            .header(reqwest::header::USER_AGENT, "account-api")
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(provider = %provider, status = %status, error = %error_text, "Profile fetch failed");
            return Err(OAuthError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))?;

        (config.normalize)(&payload).ok_or(OAuthError::ProfileRejected(provider))
    }
}
