// core/otp_service.rs
use crate::services::email::OtpMailer;
use crate::utils::error::{AppError, Result};
use crate::utils::security::{constant_time_eq, generate_otp, sha256_hash};
use crate::utils::validation::{validate_email, validate_otp_code};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Code en attente de vérification ; seule l'empreinte est conservée
#[derive(Debug, Clone)]
struct PendingOtp {
    code_hash: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
}

pub struct OtpService {
    mailer: Arc<dyn OtpMailer>,
    pending: RwLock<HashMap<String, PendingOtp>>,
    ttl: Duration,
    max_attempts: u32,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl OtpService {
    pub fn new(mailer: Arc<dyn OtpMailer>, ttl: Duration, max_attempts: u32) -> Self {
        Self {
            mailer,
            pending: RwLock::new(HashMap::new()),
            ttl,
            max_attempts,
        }
    }

    /// Génère un code, le mémorise puis l'envoie par email.
    /// Un nouvel envoi remplace le code précédent.
    pub async fn send_otp(&self, email: &str) -> Result<()> {
        validate_email(email.trim())?;
        let key = normalize(email);
        let code = generate_otp();

        {
            let mut pending = self.pending.write().await;
            let now = Utc::now();
            pending.retain(|_, entry| entry.expires_at > now);
            pending.insert(
                key.clone(),
                PendingOtp {
                    code_hash: sha256_hash(&code),
                    expires_at: now + self.ttl,
                    attempts: 0,
                },
            );
        }

        if let Err(e) = self.mailer.send_otp(&key, &code).await {
            warn!(email = %key, error = %e, "Envoi du code impossible");
            self.pending.write().await.remove(&key);
            return Err(e);
        }

        info!(email = %key, "📧 Code de vérification émis");
        Ok(())
    }

    /// Vérifie un code ; un code valide ne sert qu'une fois
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<()> {
        validate_otp_code(code)?;
        let key = normalize(email);

        let mut pending = self.pending.write().await;
        let entry = pending.get_mut(&key).ok_or(AppError::InvalidOtp)?;

        if Utc::now() > entry.expires_at {
            pending.remove(&key);
            return Err(AppError::OtpExpired);
        }

        if constant_time_eq(&entry.code_hash, &sha256_hash(code)) {
            pending.remove(&key);
            info!(email = %key, "✅ Code de vérification accepté");
            return Ok(());
        }

        entry.attempts += 1;
        if entry.attempts >= self.max_attempts {
            pending.remove(&key);
            warn!(email = %key, "Trop de tentatives, code invalidé");
            return Err(AppError::TooManyAttempts);
        }
        Err(AppError::InvalidOtp)
    }
}
