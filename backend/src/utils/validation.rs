// utils/validation.rs
use crate::utils::error::{AppError, Result};
use crate::utils::security::OTP_LENGTH;
use validator::Validate;

/// Valider un email
pub fn validate_email(email: &str) -> Result<()> {
    if !validator::validate_email(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    Ok(())
}

/// Valider un mot de passe
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 {
        return Err(AppError::Validation("Password must be at least 6 characters long".to_string()));
    }
    Ok(())
}

/// Valider un code OTP (6 chiffres)
pub fn validate_otp_code(code: &str) -> Result<()> {
    if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "Verification code must be {} digits",
            OTP_LENGTH
        )));
    }
    Ok(())
}

/// Valider une chaîne non vide
pub fn validate_non_empty_string(value: &str, field_name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field_name)));
    }
    Ok(())
}

/// Valider une liste non vide
pub fn validate_non_empty_list<T>(list: &[T], field_name: &str) -> Result<()> {
    if list.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field_name)));
    }
    Ok(())
}

/// Fonction utilitaire pour valider un objet Validate
pub fn validate_object<T: Validate>(obj: &T) -> Result<()> {
    obj.validate().map_err(AppError::from)
}
