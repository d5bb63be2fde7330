// services/auth.rs
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Compte renvoyé par le service d'authentification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Session ouverte (jetons d'accès et de rafraîchissement)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

/// Résultat d'une inscription : la session est absente si l'email doit être confirmé
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<Session>,
}

/// Opérations du service d'authentification hébergé
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
    async fn refresh(&self, refresh_token: &str) -> Result<Session>;
    async fn sign_out(&self, access_token: &str) -> Result<()>;
    async fn get_user(&self, access_token: &str) -> Result<AuthUser>;
}

/// Client REST du service d'authentification (GoTrue)
pub struct AuthClient {
    http_client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client: Arc::new(http_client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn post_token(&self, grant_type: &str, body: Value) -> Result<Session> {
        let response = self
            .http_client
            .post(self.url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(match grant_type {
                "password" => AppError::InvalidCredentials,
                _ => AppError::InvalidToken,
            });
        }
        Ok(checked(response).await?.json::<Session>().await?)
    }
}

/// Transforme une réponse non-2xx en erreur backend
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["msg", "error_description", "message"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or(body);

    Err(AppError::Backend {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AuthProvider for AuthClient {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let response = self
            .http_client
            .post(self.url("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if matches!(response.status(), StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT) {
            return Err(AppError::UserAlreadyExists);
        }

        let body: Value = checked(response).await?.json().await?;

        // Avec confirmation automatique la réponse est une session, sinon le compte seul
        let outcome = if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            SignUpOutcome {
                user: session.user.clone(),
                session: Some(session),
            }
        } else {
            SignUpOutcome {
                user: serde_json::from_value(body)?,
                session: None,
            }
        };

        info!(user_id = %outcome.user.id, "Compte créé");
        Ok(outcome)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.post_token("password", json!({ "email": email, "password": password }))
            .await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        self.post_token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url("logout"))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .http_client
            .get(self.url("user"))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidToken);
        }
        Ok(checked(response).await?.json::<AuthUser>().await?)
    }
}
