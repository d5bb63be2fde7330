use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Statut d'une demande de consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Pending,    // En attente de confirmation par l'expert
    Confirmed,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    /// Une consultation terminée ou déjà annulée ne peut plus l'être
    pub fn can_cancel(&self) -> bool {
        matches!(self, ConsultationStatus::Pending | ConsultationStatus::Confirmed)
    }
}

/// Ligne de la table `expert_consultations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertConsultation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expert_name: Option<String>,
    pub topic: String,
    pub preferred_date: Option<NaiveDate>,
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
}

/// Demande de consultation envoyée par l'élève
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewConsultation {
    pub expert_name: Option<String>,
    #[validate(length(min = 5, max = 500, message = "Le sujet doit contenir entre 5 et 500 caractères"))]
    pub topic: String,
    pub preferred_date: Option<NaiveDate>,
}

impl ExpertConsultation {
    pub fn new(user_id: Uuid, request: NewConsultation) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            expert_name: request.expert_name,
            topic: request.topic.trim().to_string(),
            preferred_date: request.preferred_date,
            status: ConsultationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Auteur d'un message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Student,
    Expert,
}

/// Ligne de la table `expert_messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertMessage {
    pub id: Uuid,
    pub consultation_id: Uuid,
    pub sender: MessageSender,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMessage {
    #[validate(length(min = 1, max = 2000, message = "Le message doit contenir entre 1 et 2000 caractères"))]
    pub content: String,
}
