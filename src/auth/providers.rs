// src/auth/providers.rs
//! Third-party identity providers.
//!
//! One explicit table maps each provider to its authorize/token/profile
//! endpoints and a profile normalizer. Handlers look providers up here;
//! there is no process-wide strategy registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The closed set of OAuth providers a local account can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Facebook,
    Twitter,
    Google,
    Github,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Facebook,
        Provider::Twitter,
        Provider::Google,
        Provider::Github,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Facebook => "facebook",
            Provider::Twitter => "twitter",
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }

    /// Column of the `users` table holding this provider's external id.
    pub fn column(&self) -> &'static str {
        self.as_str()
    }

    /// Capitalized name for user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Facebook => "Facebook",
            Provider::Twitter => "Twitter",
            Provider::Google => "Google",
            Provider::Github => "GitHub",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facebook" => Ok(Provider::Facebook),
            "twitter" => Ok(Provider::Twitter),
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Provider profile reduced to the fields the identity linker consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProfile {
    /// Provider-assigned external identifier.
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Static per-provider endpoints and profile mapping.
pub struct ProviderConfig {
    pub provider: Provider,
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub profile_url: &'static str,
    pub scopes: &'static str,
    pub normalize: fn(&Value) -> Option<OAuthProfile>,
}

static PROVIDERS: [ProviderConfig; 4] = [
    ProviderConfig {
        provider: Provider::Facebook,
        authorize_url: "https://www.facebook.com/v12.0/dialog/oauth",
        token_url: "https://graph.facebook.com/v12.0/oauth/access_token",
        profile_url: "https://graph.facebook.com/me?fields=id,name,first_name,last_name,email",
        scopes: "email public_profile",
        normalize: normalize_facebook,
    },
    ProviderConfig {
        provider: Provider::Twitter,
        authorize_url: "https://twitter.com/i/oauth2/authorize",
        token_url: "https://api.twitter.com/2/oauth2/token",
        profile_url: "https://api.twitter.com/2/users/me?user.fields=profile_image_url",
        scopes: "users.read tweet.read",
        normalize: normalize_twitter,
    },
    ProviderConfig {
        provider: Provider::Google,
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        profile_url: "https://openidconnect.googleapis.com/v1/userinfo",
        scopes: "openid email profile",
        normalize: normalize_google,
    },
    ProviderConfig {
        provider: Provider::Github,
        authorize_url: "https://github.com/login/oauth/authorize",
        token_url: "https://github.com/login/oauth/access_token",
        profile_url: "https://api.github.com/user",
        scopes: "user:email",
        normalize: normalize_github,
    },
];

pub fn provider_config(provider: Provider) -> &'static ProviderConfig {
    match provider {
        Provider::Facebook => &PROVIDERS[0],
        Provider::Twitter => &PROVIDERS[1],
        Provider::Google => &PROVIDERS[2],
        Provider::Github => &PROVIDERS[3],
    }
}

/// Derives a picture URL for the profile. Facebook composes a Graph CDN URL
/// from the external id; the other providers carry an avatar field in the
/// profile payload itself.
pub fn provider_avatar_url(provider: Provider, profile: &OAuthProfile) -> Option<String> {
    match provider {
        Provider::Facebook => Some(format!(
            "https://graph.facebook.com/{}/picture?type=large",
            profile.id
        )),
        _ => profile.picture.clone(),
    }
}

// External ids arrive as JSON numbers from some providers and strings from
// others; normalize both to a string.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_field(json: &Value, field: &str) -> Option<String> {
    json.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn normalize_facebook(json: &Value) -> Option<OAuthProfile> {
    let id = json.get("id").and_then(id_string)?;
    let name = match (str_field(json, "first_name"), str_field(json, "last_name")) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        _ => str_field(json, "name"),
    };
    Some(OAuthProfile {
        id,
        email: str_field(json, "email"),
        name,
        picture: None, // composed from the id, see provider_avatar_url
    })
}

fn normalize_twitter(json: &Value) -> Option<OAuthProfile> {
    // v2 wraps the user object in "data"; v1.1 payloads are flat
    let body = json.get("data").unwrap_or(json);
    let id = body
        .get("id_str")
        .and_then(id_string)
        .or_else(|| body.get("id").and_then(id_string))?;
    Some(OAuthProfile {
        id,
        email: str_field(body, "email"),
        name: str_field(body, "name").or_else(|| str_field(body, "screen_name")),
        picture: str_field(body, "profile_image_url_https")
            .or_else(|| str_field(body, "profile_image_url")),
    })
}

fn normalize_google(json: &Value) -> Option<OAuthProfile> {
    let id = json
        .get("sub")
        .and_then(id_string)
        .or_else(|| json.get("id").and_then(id_string))?;
    Some(OAuthProfile {
        id,
        email: str_field(json, "email"),
        name: str_field(json, "name"),
        picture: str_field(json, "picture"),
    })
}

fn normalize_github(json: &Value) -> Option<OAuthProfile> {
    let id = json.get("id").and_then(id_string)?;
    Some(OAuthProfile {
        id,
        email: str_field(json, "email"),
        name: str_field(json, "name").or_else(|| str_field(json, "login")),
        picture: str_field(json, "avatar_url"),
    })
}
