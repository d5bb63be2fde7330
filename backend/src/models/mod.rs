// Modèle: catalog.rs
pub mod catalog;
pub use catalog::{Catalog, College, Course, Career, Eligibility, GovernmentExam, NirfRanking};

// Modèle: profile.rs
pub mod profile;
pub use profile::{NewProfile, ProfileUpdate, Stream, UserProfile};

// Modèle: consultation.rs
pub mod consultation;
pub use consultation::{
    ConsultationStatus, ExpertConsultation, ExpertMessage,
    MessageSender, NewConsultation, NewMessage,
};

use serde::{Deserialize, Serialize};

/// Réponse d'erreur standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Réponse de succès standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: Option<String>,
}

impl<T> SuccessResponse<T> {
    /// Crée une réponse de succès
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    /// Avec un message
    pub fn with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.to_string()),
        }
    }
}
