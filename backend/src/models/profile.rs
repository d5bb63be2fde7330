use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::utils::error::AppError;

/// Filière scolaire choisie après la 10e
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stream {
    Science,
    Commerce,
    Arts,
}

impl Stream {
    pub const ALL: [Stream; 3] = [Stream::Science, Stream::Commerce, Stream::Arts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Science => "Science",
            Stream::Commerce => "Commerce",
            Stream::Arts => "Arts",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stream {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stream::ALL
            .into_iter()
            .find(|stream| stream.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Unknown stream '{}'. Must be one of: Science, Commerce, Arts",
                    s
                ))
            })
    }
}

/// Profil d'un élève, ligne de la table `profiles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    /// Identique à l'identifiant du compte d'authentification
    pub id: Uuid,

    #[validate(length(min = 2, max = 100, message = "Le nom doit contenir entre 2 et 100 caractères"))]
    pub full_name: String,

    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,

    #[validate(custom(function = "validate_mobile_number", message = "Numéro de mobile invalide"))]
    pub mobile: Option<String>,

    #[validate(range(min = 6, max = 12, message = "La classe doit être comprise entre 6 et 12"))]
    pub grade: Option<u8>,

    /// `None` tant que l'élève n'a pas terminé la configuration
    pub stream: Option<Stream>,

    #[serde(default)]
    pub interests: Vec<String>,

    #[validate(range(min = 10, max = 100, message = "L'âge doit être compris entre 10 et 100"))]
    pub age: Option<u32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mise à jour partielle du profil : seuls les champs présents sont fusionnés
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<Stream>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}

/// Données minimales à la création du profil (inscription)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProfile {
    #[validate(length(min = 2, max = 100, message = "Le nom doit contenir entre 2 et 100 caractères"))]
    pub full_name: String,
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,
    #[validate(custom(function = "validate_mobile_number", message = "Numéro de mobile invalide"))]
    pub mobile: Option<String>,
    #[validate(range(min = 6, max = 12, message = "La classe doit être comprise entre 6 et 12"))]
    pub grade: Option<u8>,
}

impl UserProfile {
    /// Crée un profil en attente de configuration (filière nulle)
    pub fn new(id: Uuid, new_profile: NewProfile) -> Self {
        let now = Utc::now();
        Self {
            id,
            full_name: new_profile.full_name,
            email: new_profile.email,
            mobile: new_profile.mobile,
            grade: new_profile.grade,
            stream: None,
            interests: Vec::new(),
            age: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applique une mise à jour partielle et renvoie le profil fusionné
    pub fn merged(&self, update: &ProfileUpdate) -> Self {
        let mut merged = self.clone();
        if let Some(full_name) = &update.full_name {
            merged.full_name = full_name.trim().to_string();
        }
        if let Some(mobile) = &update.mobile {
            merged.mobile = Some(mobile.trim().to_string());
        }
        if let Some(grade) = update.grade {
            merged.grade = Some(grade);
        }
        if let Some(stream) = update.stream {
            merged.stream = Some(stream);
        }
        if let Some(interests) = &update.interests {
            merged.interests = normalize_interests(interests);
        }
        if let Some(age) = update.age {
            merged.age = Some(age);
        }
        merged.updated_at = Utc::now();
        merged
    }

    /// La configuration initiale est terminée quand la filière est choisie
    pub fn is_setup_complete(&self) -> bool {
        self.stream.is_some()
    }
}

/// Supprime les doublons et les entrées vides, en gardant l'ordre
pub fn normalize_interests(interests: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(interests.len());
    for interest in interests {
        let trimmed = interest.trim();
        if trimmed.is_empty() || seen.iter().any(|s| s.eq_ignore_ascii_case(trimmed)) {
            continue;
        }
        seen.push(trimmed.to_string());
    }
    seen
}

/// Numéro indien à 10 chiffres commençant par 6-9, préfixe +91 accepté
pub fn validate_mobile_number(mobile: &str) -> Result<(), ValidationError> {
    let digits: String = mobile.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let digits = digits.strip_prefix("+91").unwrap_or(digits.as_str());

    let valid = digits.len() == 10
        && digits.chars().all(|c| c.is_ascii_digit())
        && matches!(digits.chars().next(), Some('6'..='9'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("mobile"))
    }
}
