use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, Result};

/// Un cours (diplôme, formation) proposé après la 10e/12e
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    /// Filières pour lesquelles le cours est ouvert (jamais vide)
    pub streams: Vec<String>,
}

/// Une carrière et ses débouchés
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Career {
    pub id: String,
    pub title: String,
    pub description: String,
    pub skills: Vec<String>,
    pub education: String,
    pub job_outlook: String,
    pub salary: String,
    pub streams: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Conditions d'admission : texte libre ou liste de critères
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Eligibility {
    Text(String),
    List(Vec<String>),
}

impl Eligibility {
    /// Représentation à plat, utilisée par la recherche
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Eligibility::Text(text) => vec![text.as_str()],
            Eligibility::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

/// Un concours ou examen gouvernemental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernmentExam {
    pub id: String,
    pub title: String,
    pub description: String,
    pub eligibility: Eligibility,
    pub streams: Vec<String>,
    pub preparation_time: String,
}

/// Un établissement d'enseignement supérieur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct College {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub ranking: u32,
    /// Identifiants des cours proposés
    pub courses: Vec<String>,
    pub category: String,
}

/// Entrée du classement NIRF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NirfRanking {
    pub id: String,
    pub name: String,
    pub rank: u32,
    pub location: String,
    pub category: String,
    pub score: f64,
    pub description: String,
}

/// Catalogue complet, tel qu'embarqué ou lu depuis le backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub courses: Vec<Course>,
    pub careers: Vec<Career>,
    pub colleges: Vec<College>,
    #[serde(rename = "government_exams")]
    pub exams: Vec<GovernmentExam>,
    #[serde(rename = "nirf_rankings")]
    pub rankings: Vec<NirfRanking>,
}

const SEED_CATALOG: &str = include_str!("../../data/catalog.json");

impl Catalog {
    /// Catalogue embarqué dans le binaire
    pub fn seed() -> Result<Self> {
        Self::from_json(SEED_CATALOG)
    }

    /// Parse puis valide un catalogue JSON
    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)
            .map_err(|e| AppError::InvalidCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Vérifie les invariants : filières non vides, rangs positifs
    pub fn validate(&self) -> Result<()> {
        let empty_streams = self
            .courses
            .iter()
            .filter(|c| c.streams.is_empty())
            .map(|c| c.id.as_str())
            .chain(self.careers.iter().filter(|c| c.streams.is_empty()).map(|c| c.id.as_str()))
            .chain(self.exams.iter().filter(|e| e.streams.is_empty()).map(|e| e.id.as_str()))
            .next();
        if let Some(id) = empty_streams {
            return Err(AppError::InvalidCatalog(format!("record '{}' has no streams", id)));
        }

        if let Some(college) = self.colleges.iter().find(|c| c.ranking == 0) {
            return Err(AppError::InvalidCatalog(format!(
                "college '{}' must have a positive ranking",
                college.id
            )));
        }

        if let Some(entry) = self.rankings.iter().find(|r| r.rank == 0) {
            return Err(AppError::InvalidCatalog(format!(
                "ranking '{}' must have a positive rank",
                entry.id
            )));
        }

        Ok(())
    }
}
