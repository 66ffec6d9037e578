// src/auth/validators.rs

use regex::Regex;
use std::sync::OnceLock;

use super::models::{LoginRequest, SignupRequest};
use crate::common::{ValidationResult, Validator};

fn name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9-_\s]+$").expect("static regex"))
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Display names: letters, digits, spaces, dash/underscore, 3-30 chars.
pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    (3..=30).contains(&trimmed.len()) && name_regex().is_match(trimmed)
}

pub struct SignupValidator;

impl Validator<SignupRequest> for SignupValidator {
    fn validate(&self, data: &SignupRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !is_valid_email(&data.email) {
            result.add_error("email", "Email is not valid");
        }

        if data.password.len() < 4 {
            result.add_error("password", "Password must be at least 4 characters long");
        }

        if data.confirm_password != data.password {
            result.add_error("confirmPassword", "Passwords do not match");
        }

        if let Some(name) = &data.name {
            if !is_valid_name(name) {
                result.add_error("name", "Name is not valid");
            }
        }

        result
    }
}

pub struct LoginValidator;

impl Validator<LoginRequest> for LoginValidator {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !is_valid_email(&data.email) {
            result.add_error("email", "Email is not valid");
        }

        if data.password.is_empty() {
            result.add_error("password", "Password cannot be blank");
        }

        result
    }
}
