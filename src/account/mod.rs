// src/account/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::account_routes;
pub use service::AccountService;
