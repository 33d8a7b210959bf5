// src/auth/validators.rs

use regex::Regex;

use super::models::RegisterRequest;
use super::password::check_strength;
use crate::common::{ValidationResult, Validator};

// ============================================================================
// Registration Validators
// ============================================================================

pub struct RegisterValidator;

impl Validator<RegisterRequest> for RegisterValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Validate email
        if data.email.trim().is_empty() {
            result.add_error("email", "El email es obligatorio");
        } else if !is_valid_email(&data.email) {
            result.add_error("email", "El email no tiene un formato válido");
        } else if data.email.len() > 255 {
            result.add_error("email", "El email debe tener menos de 255 caracteres");
        }

        // Validate username
        let username = data.username.trim();
        if username.is_empty() {
            result.add_error("username", "El nombre de usuario es obligatorio");
        } else if username.len() < 3 || username.len() > 50 {
            result.add_error(
                "username",
                "El nombre de usuario debe tener entre 3 y 50 caracteres",
            );
        } else if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            result.add_error(
                "username",
                "El nombre de usuario solo puede contener letras, números, '_', '-' y '.'",
            );
        }

        // Validate password strength
        if !check_strength(&data.password) {
            result.add_error(
                "password",
                "La contraseña debe tener entre 8 y 100 caracteres e incluir mayúscula, minúscula, dígito y carácter especial",
            );
        }

        // Passwords must match
        if data.password != data.confirm_password {
            result.add_error("confirm_password", "Las contraseñas no coinciden");
        }

        result
    }
}

fn is_valid_email(email: &str) -> bool {
    match Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$") {
        Ok(re) => re.is_match(email),
        Err(_) => false,
    }
}
