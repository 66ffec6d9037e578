//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Local signup and email/password login
//! - OAuth identity linking, sign-in and account creation (the identity linker)
//! - JWT token generation and validation
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod linker;
pub mod models;
pub mod providers;
pub mod routes;
pub mod store;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use models::User;
pub use providers::Provider;
pub use routes::auth_routes;
pub use store::UserStore;
