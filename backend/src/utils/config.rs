// utils/config.rs
use crate::utils::error::{AppError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Source du catalogue au démarrage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Données embarquées dans le binaire
    Seed,
    /// Tables du backend hébergé
    Backend,
}

impl FromStr for CatalogSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "seed" => Ok(CatalogSource::Seed),
            "backend" => Ok(CatalogSource::Backend),
            other => Err(AppError::Validation(format!(
                "CATALOG_SOURCE must be 'seed' or 'backend', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Environnement et serveur
    pub run_mode: String,
    pub server_host: String,
    pub server_port: u16,
    pub workers: usize,
    pub log_level: String,
    pub log_format: String,

    // Backend hébergé
    pub backend_url: String,
    pub backend_anon_key: String,
    pub backend_service_role_key: String,
    pub backend_jwt_secret: String,
    pub http_timeout_seconds: u64,

    // OTP
    pub otp_function_name: String,
    pub otp_ttl_minutes: i64,
    pub otp_max_attempts: u32,

    // Catalogue
    pub catalog_source: CatalogSource,
    pub catalog_sync_on_start: bool,

    // URLs
    pub frontend_url: String,
}

impl Config {
    /// Charger la configuration depuis les variables d'environnement
    pub fn from_env() -> Result<Self> {
        // Charger le fichier .env si présent
        let _ = dotenv().ok();

        // Variables requises
        let required_vars = [
            "BACKEND_URL",
            "BACKEND_ANON_KEY",
            "BACKEND_SERVICE_ROLE_KEY",
            "BACKEND_JWT_SECRET",
        ];

        for var in &required_vars {
            if env::var(var).is_err() {
                return Err(AppError::Configuration(format!(
                    "Variable d'environnement requise manquante: {}",
                    var
                )));
            }
        }

        let config = Config {
            run_mode: env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parse_var("SERVER_PORT", "8080")?,
            workers: parse_var("WORKERS", "4")?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),

            backend_url: required_var("BACKEND_URL")?
                .trim_end_matches('/')
                .to_string(),
            backend_anon_key: required_var("BACKEND_ANON_KEY")?,
            backend_service_role_key: required_var("BACKEND_SERVICE_ROLE_KEY")?,
            backend_jwt_secret: required_var("BACKEND_JWT_SECRET")?,
            http_timeout_seconds: parse_var("HTTP_TIMEOUT_SECONDS", "30")?,

            otp_function_name: env::var("OTP_FUNCTION_NAME")
                .unwrap_or_else(|_| "send-otp-email".to_string()),
            otp_ttl_minutes: parse_var("OTP_TTL_MINUTES", "10")?,
            otp_max_attempts: parse_var("OTP_MAX_ATTEMPTS", "5")?,

            catalog_source: parse_var("CATALOG_SOURCE", "seed")?,
            catalog_sync_on_start: parse_var("CATALOG_SYNC_ON_START", "false")?,

            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Contrôles de cohérence après lecture
    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(AppError::Validation("SERVER_PORT must not be 0".to_string()));
        }
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            return Err(AppError::Validation(
                "BACKEND_URL must start with http:// or https://".to_string(),
            ));
        }
        if self.otp_ttl_minutes <= 0 {
            return Err(AppError::Validation("OTP_TTL_MINUTES must be positive".to_string()));
        }
        if self.otp_max_attempts == 0 {
            return Err(AppError::Validation("OTP_MAX_ATTEMPTS must be positive".to_string()));
        }
        if self.backend_jwt_secret.len() < 32 {
            tracing::warn!("⚠️  BACKEND_JWT_SECRET trop court (< 32 caractères)");
        }
        Ok(())
    }

    /// Vérifier si on est en production
    pub fn is_production(&self) -> bool {
        self.run_mode == "production"
    }
}

fn required_var(key: &str) -> Result<String> {
    env::var(key).map_err(|_| {
        AppError::Configuration(format!("Variable d'environnement requise manquante: {}", key))
    })
}

fn parse_var<T: FromStr>(key: &str, default: &str) -> Result<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Validation(format!("{} has an invalid value", key)))
}
