// api/middleware.rs
//! Authentification des requêtes.
//!
//! Les jetons d'accès sont émis par le service d'authentification hébergé
//! (JWT HS256, audience `authenticated`). L'API les vérifie localement avec
//! le secret du projet, sans aller-retour réseau.

use crate::utils::error::{AppError, Result};
use crate::utils::security::{bearer_token, verify_access_token, AccessTokenClaims};
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

/// Vérificateur de jetons partagé via `app_data`
#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims> {
        verify_access_token(token, &self.secret)
    }
}

/// Élève authentifié, extrait de l'en-tête `Authorization: Bearer ...`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| AppError::Configuration("token verifier not registered".to_string()))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::InvalidToken)?;

    let token = bearer_token(header)?;
    let claims = verifier.verify(token)?;

    Ok(AuthenticatedUser {
        id: claims.sub,
        email: claims.email,
        access_token: token.to_string(),
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
