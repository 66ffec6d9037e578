// src/account/validators.rs

use super::models::{ChangePasswordRequest, UpdateProfileRequest};
use crate::auth::validators::{is_valid_email, is_valid_name};
use crate::common::{ValidationResult, Validator};

pub struct ProfileUpdateValidator;

impl Validator<UpdateProfileRequest> for ProfileUpdateValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(email) = &data.email {
            if !is_valid_email(email) {
                result.add_error("email", "Email is not valid");
            }
        }

        if let Some(name) = &data.name {
            if !is_valid_name(name) {
                result.add_error("name", "Name is not valid");
            }
        }

        result
    }
}

pub struct PasswordChangeValidator;

impl Validator<ChangePasswordRequest> for PasswordChangeValidator {
    fn validate(&self, data: &ChangePasswordRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.new_password.len() < 4 {
            result.add_error(
                "newPassword",
                "Password must be at least 4 characters long",
            );
        }

        if data.confirm_password != data.new_password {
            result.add_error("confirmPassword", "Passwords do not match");
        }

        result
    }
}
