// src/services/mod.rs
//
// Shared services module containing business logic services
// that can be used across different domain modules

pub mod oauth;
pub mod password;

// Re-export commonly used types for convenience
pub use oauth::{OAuthError, OAuthService};
pub use password::{hash_password, verify_password};
