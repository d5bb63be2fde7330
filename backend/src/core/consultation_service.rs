// core/consultation_service.rs
use crate::models::{
    ConsultationStatus, ExpertConsultation, ExpertMessage, MessageSender,
    NewConsultation, NewMessage,
};
use crate::services::backend::{fetch_all, fetch_optional, insert_one, update_by_id, Query, RowStore};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_object;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const CONSULTATIONS_TABLE: &str = "expert_consultations";
pub const MESSAGES_TABLE: &str = "expert_messages";

pub struct ConsultationService {
    store: Arc<dyn RowStore>,
}

impl ConsultationService {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// Nouvelle demande de consultation (statut `pending`)
    pub async fn request_consultation(&self, user_id: Uuid, request: NewConsultation) -> Result<ExpertConsultation> {
        let request = NewConsultation {
            topic: request.topic.trim().to_string(),
            ..request
        };
        validate_object(&request)?;
        if let Some(date) = request.preferred_date {
            if date < Utc::now().date_naive() {
                return Err(AppError::Validation("preferred_date cannot be in the past".to_string()));
            }
        }

        let consultation = ExpertConsultation::new(user_id, request);
        let stored = insert_one(self.store.as_ref(), CONSULTATIONS_TABLE, &consultation).await?;
        info!(user_id = %user_id, consultation_id = %stored.id, "🗓️ Consultation demandée");
        Ok(stored)
    }

    /// Consultations de l'élève, les plus récentes d'abord
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ExpertConsultation>> {
        let query = Query::table(CONSULTATIONS_TABLE)
            .eq("user_id", user_id)
            .order("created_at", false);
        fetch_all(self.store.as_ref(), &query).await
    }

    /// Charge une consultation appartenant à l'élève
    async fn owned(&self, user_id: Uuid, consultation_id: Uuid) -> Result<ExpertConsultation> {
        let query = Query::table(CONSULTATIONS_TABLE).eq("id", consultation_id);
        let consultation: ExpertConsultation = fetch_optional(self.store.as_ref(), &query)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("consultation '{}'", consultation_id)))?;

        if consultation.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(consultation)
    }

    pub async fn cancel(&self, user_id: Uuid, consultation_id: Uuid) -> Result<ExpertConsultation> {
        let consultation = self.owned(user_id, consultation_id).await?;
        if !consultation.status.can_cancel() {
            return Err(AppError::ConsultationNotCancellable);
        }

        let patch = json!({ "status": ConsultationStatus::Cancelled });
        let cancelled = update_by_id(self.store.as_ref(), CONSULTATIONS_TABLE, consultation_id, patch).await?;
        info!(consultation_id = %consultation_id, "Consultation annulée");
        Ok(cancelled)
    }

    pub async fn post_message(&self, user_id: Uuid, consultation_id: Uuid, message: NewMessage) -> Result<ExpertMessage> {
        let message = NewMessage {
            content: message.content.trim().to_string(),
        };
        validate_object(&message)?;
        let consultation = self.owned(user_id, consultation_id).await?;
        if consultation.status == ConsultationStatus::Cancelled {
            return Err(AppError::Validation("consultation is cancelled".to_string()));
        }

        let message = ExpertMessage {
            id: Uuid::new_v4(),
            consultation_id,
            sender: MessageSender::Student,
            content: message.content,
            created_at: Utc::now(),
        };
        insert_one(self.store.as_ref(), MESSAGES_TABLE, &message).await
    }

    /// Fil de discussion dans l'ordre chronologique
    pub async fn list_messages(&self, user_id: Uuid, consultation_id: Uuid) -> Result<Vec<ExpertMessage>> {
        self.owned(user_id, consultation_id).await?;
        let query = Query::table(MESSAGES_TABLE)
            .eq("consultation_id", consultation_id)
            .order("created_at", true);
        fetch_all(self.store.as_ref(), &query).await
    }
}
