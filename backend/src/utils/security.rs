// utils/security.rs
use crate::utils::error::{AppError, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Audience des jetons émis par le service d'authentification hébergé
pub const AUTH_AUDIENCE: &str = "authenticated";

/// Nombre de chiffres d'un code OTP
pub const OTP_LENGTH: usize = 6;

/// Claims JWT des jetons d'accès du backend hébergé
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: Uuid,            // User ID
    pub email: Option<String>,
    pub role: Option<String>,
    pub aud: String,
    pub exp: usize,           // Expiration timestamp
    pub iat: usize,           // Issued at timestamp
}

/// Vérifier un jeton d'accès (HS256, secret du projet)
pub fn verify_access_token(token: &str, secret: &str) -> Result<AccessTokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTH_AUDIENCE]);

    let token_data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// Générer un code OTP numérique
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Empreinte SHA-256 en hexadécimal
pub fn sha256_hash(data: &str) -> String {
    format!("{:x}", Sha256::digest(data.as_bytes()))
}

/// Comparaison en temps constant de deux empreintes
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extraire le jeton d'un en-tête `Authorization: Bearer ...`
pub fn bearer_token(header_value: &str) -> Result<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

/// Signer un jeton comme le ferait le service d'authentification (tests)
#[cfg(test)]
pub fn sign_test_token(user_id: Uuid, secret: &str, expires_in_seconds: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now();
    let claims = AccessTokenClaims {
        sub: user_id,
        email: Some("student@example.in".to_string()),
        role: Some("authenticated".to_string()),
        aud: AUTH_AUDIENCE.to_string(),
        exp: (now.timestamp() + expires_in_seconds) as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    #[test]
    fn test_verify_valid_token() {
        let user_id = Uuid::new_v4();
        let token = sign_test_token(user_id, SECRET, 3600);
        let claims = verify_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.aud, AUTH_AUDIENCE);
    }

    #[test]
    fn test_expired_token() {
        let token = sign_test_token(Uuid::new_v4(), SECRET, -3600);
        assert!(matches!(verify_access_token(&token, SECRET), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = sign_test_token(Uuid::new_v4(), SECRET, 3600);
        assert!(matches!(
            verify_access_token(&token, "another-secret-another-secret-xx"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_generate_otp() {
        let otp = generate_otp();
        assert_eq!(otp.len(), OTP_LENGTH);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_hash_and_compare() {
        let hash = sha256_hash("123456");
        assert_eq!(hash.len(), 64);
        assert!(constant_time_eq(&hash, &sha256_hash("123456")));
        assert!(!constant_time_eq(&hash, &sha256_hash("654321")));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("Bearer ").is_err());
    }
}
