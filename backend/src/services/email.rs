// services/email.rs
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Envoi d'un code OTP par email
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct OtpPayload<'a> {
    email: &'a str,
    otp: &'a str,
}

/// Réponse JSON de la fonction d'envoi
#[derive(Debug, Deserialize)]
struct FunctionResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

/// Appel de la fonction hébergée qui délivre l'email
pub struct EmailFunctionClient {
    http_client: Arc<HttpClient>,
    function_url: String,
    api_key: String,
}

impl EmailFunctionClient {
    pub fn new(base_url: &str, function_name: &str, api_key: &str, timeout_seconds: u64) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client: Arc::new(http_client),
            function_url: format!(
                "{}/functions/v1/{}",
                base_url.trim_end_matches('/'),
                function_name
            ),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl OtpMailer for EmailFunctionClient {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<()> {
        let response = self
            .http_client
            .post(&self.function_url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&OtpPayload { email, otp })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<FunctionResponse>(&body).ok();

        match parsed {
            Some(FunctionResponse { success: true, .. }) if status.is_success() => {
                info!(email = %email, "Code de vérification envoyé");
                Ok(())
            }
            Some(FunctionResponse { error: Some(error), .. }) => {
                warn!(email = %email, %error, "La fonction d'envoi a signalé une erreur");
                Err(AppError::EmailFunction(error))
            }
            _ => Err(AppError::EmailFunction(format!(
                "unexpected response ({}): {}",
                status.as_u16(),
                body
            ))),
        }
    }
}

/// Implémentation pour les logs (développement)
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<()> {
        info!(email = %email, otp = %otp, "[EMAIL] Code de vérification (non envoyé)");
        Ok(())
    }
}
