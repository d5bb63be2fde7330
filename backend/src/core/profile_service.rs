// core/profile_service.rs
use crate::models::{NewProfile, ProfileUpdate, Stream, UserProfile};
use crate::services::backend::{fetch_optional, insert_one, update_by_id, Query, RowStore};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_non_empty_list, validate_object};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const PROFILES_TABLE: &str = "profiles";

pub struct ProfileService {
    store: Arc<dyn RowStore>,
    cache: RwLock<HashMap<Uuid, UserProfile>>,
}

/// Champs modifiables envoyés au backend lors d'une mise à jour
fn profile_patch(profile: &UserProfile) -> Value {
    json!({
        "full_name": profile.full_name,
        "mobile": profile.mobile,
        "grade": profile.grade,
        "stream": profile.stream,
        "interests": profile.interests,
        "age": profile.age,
        "updated_at": profile.updated_at,
    })
}

impl ProfileService {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Création du profil juste après l'inscription
    pub async fn create_profile(&self, user_id: Uuid, new_profile: NewProfile) -> Result<UserProfile> {
        validate_object(&new_profile)?;

        let profile = UserProfile::new(user_id, new_profile);
        let stored: UserProfile = insert_one(self.store.as_ref(), PROFILES_TABLE, &profile)
            .await
            .map_err(|e| match e {
                AppError::Backend { status: 409, .. } => AppError::UserAlreadyExists,
                other => other,
            })?;

        info!(user_id = %user_id, "👤 Profil créé");
        self.cache.write().await.insert(user_id, stored.clone());
        Ok(stored)
    }

    /// Obtenir le profil (cache local puis backend)
    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        if let Some(profile) = self.cache.read().await.get(&user_id) {
            debug!(user_id = %user_id, "Profil servi depuis le cache");
            return Ok(profile.clone());
        }

        let query = Query::table(PROFILES_TABLE).eq("id", user_id);
        let profile: UserProfile = fetch_optional(self.store.as_ref(), &query)
            .await?
            .ok_or(AppError::ProfileNotFound)?;

        self.cache.write().await.insert(user_id, profile.clone());
        Ok(profile)
    }

    /// Fusionne une mise à jour partielle et la persiste.
    /// En cas d'échec du backend, le cache reste inchangé.
    pub async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<UserProfile> {
        let current = self.get_profile(user_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let merged = current.merged(update);
        validate_object(&merged)?;

        let stored: UserProfile =
            match update_by_id(self.store.as_ref(), PROFILES_TABLE, user_id, profile_patch(&merged)).await {
                Ok(stored) => stored,
                Err(AppError::NotFound(_)) => return Err(AppError::ProfileNotFound),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Échec de la mise à jour du profil");
                    return Err(e);
                }
            };

        info!(user_id = %user_id, "✅ Profil mis à jour");
        self.cache.write().await.insert(user_id, stored.clone());
        Ok(stored)
    }

    /// Configuration initiale : filière et centres d'intérêt
    pub async fn complete_setup(
        &self,
        user_id: Uuid,
        stream: Stream,
        interests: Vec<String>,
        age: Option<u32>,
    ) -> Result<UserProfile> {
        validate_non_empty_list(&interests, "interests")?;

        let update = ProfileUpdate {
            stream: Some(stream),
            interests: Some(interests),
            age,
            ..Default::default()
        };
        self.update_profile(user_id, &update).await
    }

    /// Oublie le profil en cache (déconnexion)
    pub async fn invalidate(&self, user_id: Uuid) {
        self.cache.write().await.remove(&user_id);
    }
}
