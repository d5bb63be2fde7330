// utils/mod.rs
pub mod error;
pub mod config;
pub mod security;
pub mod validation;

// Ré-exports pour faciliter l'import
pub use error::{AppError, Result};
pub use config::{CatalogSource, Config};
pub use security::{
    bearer_token, constant_time_eq, generate_otp,
    sha256_hash, verify_access_token, AccessTokenClaims,
};
pub use validation::{
    validate_email, validate_password, validate_otp_code,
    validate_non_empty_string, validate_non_empty_list,
    validate_object,
};
