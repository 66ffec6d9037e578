// Helper functions for safe logging and avatar derivation

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 {
            format!("{}***@{}", &parts[0][..1.min(parts[0].len())], parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Derives a stable Gravatar URL from the lower-cased email.
///
/// Accounts without an email get the anonymous retro fallback, so every
/// record always has a picture to render.
pub fn gravatar_url(email: Option<&str>) -> String {
    match email {
        Some(email) if !email.is_empty() => {
            let digest = md5::compute(email.trim().to_lowercase().as_bytes());
            format!("https://gravatar.com/avatar/{:x}?s=200&d=retro", digest)
        }
        _ => "https://gravatar.com/avatar/?s=200&d=retro".to_string(),
    }
}
