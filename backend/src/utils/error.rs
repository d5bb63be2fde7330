// utils/error.rs
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // Erreurs d'authentification
    #[error("Authentication failed")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    // Erreurs utilisateur
    #[error("Profile not found")]
    ProfileNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    // Erreurs OTP
    #[error("Invalid verification code")]
    InvalidOtp,

    #[error("Verification code expired")]
    OtpExpired,

    #[error("Too many attempts")]
    TooManyAttempts,

    // Erreurs de données
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    // Erreurs de ressources
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Consultation cannot be cancelled")]
    ConsultationNotCancellable,

    // Erreurs externes
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Email function error: {0}")]
    EmailFunction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Code court renvoyé au client avec le message
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::ParseError(_) => "BAD_REQUEST",
            AppError::Unauthorized
            | AppError::InvalidToken
            | AppError::TokenExpired
            | AppError::InvalidCredentials
            | AppError::InvalidOtp
            | AppError::OtpExpired => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) | AppError::ProfileNotFound => "NOT_FOUND",
            AppError::UserAlreadyExists => "CONFLICT",
            AppError::ConsultationNotCancellable => "PRECONDITION_FAILED",
            AppError::TooManyAttempts => "TOO_MANY_REQUESTS",
            AppError::Backend { .. } | AppError::ExternalService(_) | AppError::EmailFunction(_) => {
                "BAD_GATEWAY"
            }
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |message: String| json!({ "error": message, "code": self.code() });

        match self {
            // 400 - Bad Request
            AppError::Validation(_) | AppError::ParseError(_) => {
                HttpResponse::BadRequest().json(body(self.to_string()))
            }

            // 401 - Unauthorized
            AppError::Unauthorized
            | AppError::InvalidToken
            | AppError::TokenExpired
            | AppError::InvalidCredentials
            | AppError::InvalidOtp
            | AppError::OtpExpired => HttpResponse::Unauthorized().json(body(self.to_string())),

            // 403 - Forbidden
            AppError::Forbidden => HttpResponse::Forbidden().json(body(self.to_string())),

            // 404 - Not Found
            AppError::NotFound(_) | AppError::ProfileNotFound => {
                HttpResponse::NotFound().json(body(self.to_string()))
            }

            // 409 - Conflict
            AppError::UserAlreadyExists => HttpResponse::Conflict().json(body(self.to_string())),

            // 412 - Precondition Failed
            AppError::ConsultationNotCancellable => {
                HttpResponse::PreconditionFailed().json(body(self.to_string()))
            }

            // 429 - Too Many Requests
            AppError::TooManyAttempts => HttpResponse::TooManyRequests().json(body(self.to_string())),

            // 502 - Bad Gateway
            AppError::Backend { .. } | AppError::ExternalService(_) | AppError::EmailFunction(_) => {
                tracing::warn!(error = %self, "Échec d'un appel au backend hébergé");
                HttpResponse::BadGateway().json(body(self.to_string()))
            }

            // 500 - Internal Server Error
            _ => {
                tracing::error!("Internal server error: {}", self);
                HttpResponse::InternalServerError().json(body("Internal server error".to_string()))
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::ParseError(err.to_string())
        } else {
            AppError::ExternalService(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializeError(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let error_messages: Vec<String> = errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(m) => m.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect();
        messages.sort();

        AppError::Validation(messages.join("; "))
    }
}

// Type de résultat standard
pub type Result<T> = std::result::Result<T, AppError>;
