// core/catalog_service.rs
use crate::core::recommendation::{self, Recommendations};
use crate::models::{Catalog, Career, College, Course, GovernmentExam, NirfRanking, UserProfile};
use crate::services::backend::{fetch_all, upsert_all, Query, RowStore};
use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub const COURSES_TABLE: &str = "courses";
pub const CAREERS_TABLE: &str = "careers";
pub const COLLEGES_TABLE: &str = "colleges";
pub const EXAMS_TABLE: &str = "government_exams";
pub const RANKINGS_TABLE: &str = "nirf_rankings";

/// Rang de chaque ligne dans le catalogue d'origine
pub const POSITION_COLUMN: &str = "position";

/// Critères de filtrage communs aux listes du catalogue
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub stream: Option<String>,
    pub interest: Option<String>,
    pub age: Option<u32>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub course: Option<String>,
    pub q: Option<String>,
}

/// Résultats d'une recherche plein texte
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub courses: Vec<Course>,
    pub careers: Vec<Career>,
    pub exams: Vec<GovernmentExam>,
    pub colleges: Vec<College>,
    pub rankings: Vec<NirfRanking>,
}

/// Nombre de lignes écrites par table lors d'une synchronisation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub courses: usize,
    pub careers: usize,
    pub colleges: usize,
    pub exams: usize,
    pub rankings: usize,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn has_stream(streams: &[String], stream: Option<&str>) -> bool {
    stream.map_or(true, |wanted| streams.iter().any(|s| s == wanted))
}

/// Upsert d'une collection en écrivant sa position dans `POSITION_COLUMN`
async fn upsert_in_order<T: Serialize>(store: &dyn RowStore, table: &str, items: &[T]) -> Result<usize> {
    let rows = items
        .iter()
        .enumerate()
        .map(|(position, item)| -> Result<Value> {
            let mut row = serde_json::to_value(item)?;
            if let Value::Object(fields) = &mut row {
                fields.insert(POSITION_COLUMN.to_string(), json!(position));
            }
            Ok(row)
        })
        .collect::<Result<Vec<Value>>>()?;
    upsert_all(store, table, &rows).await
}

fn in_order(table: &str) -> Query {
    Query::table(table).order(POSITION_COLUMN, true)
}

fn text_matches(fields: &[&str], q: Option<&str>) -> bool {
    match q.map(str::trim) {
        None | Some("") => true,
        Some(q) => fields.iter().any(|field| contains_ci(field, q)),
    }
}

pub struct CatalogService {
    catalog: RwLock<Arc<Catalog>>,
    store: Arc<dyn RowStore>,
}

impl CatalogService {
    pub fn new(catalog: Catalog, store: Arc<dyn RowStore>) -> Self {
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            store,
        }
    }

    /// Instantané courant du catalogue
    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.catalog.read().await.clone()
    }

    pub async fn list_courses(&self, filter: &CatalogFilter) -> Vec<Course> {
        let catalog = self.snapshot().await;
        catalog
            .courses
            .iter()
            .filter(|c| has_stream(&c.streams, filter.stream.as_deref()))
            .filter(|c| text_matches(&[c.title.as_str(), c.description.as_str()], filter.q.as_deref()))
            .cloned()
            .collect()
    }

    pub async fn get_course(&self, id: &str) -> Result<Course> {
        let catalog = self.snapshot().await;
        catalog
            .courses
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("course '{}'", id)))
    }

    pub async fn list_careers(&self, filter: &CatalogFilter) -> Vec<Career> {
        let catalog = self.snapshot().await;
        catalog
            .careers
            .iter()
            .filter(|c| has_stream(&c.streams, filter.stream.as_deref()))
            .filter(|c| {
                filter.interest.as_deref().map_or(true, |wanted| {
                    c.interests.iter().any(|i| i.eq_ignore_ascii_case(wanted))
                })
            })
            .filter(|c| text_matches(&[c.title.as_str(), c.description.as_str()], filter.q.as_deref()))
            .cloned()
            .collect()
    }

    pub async fn get_career(&self, id: &str) -> Result<Career> {
        let catalog = self.snapshot().await;
        catalog
            .careers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("career '{}'", id)))
    }

    /// Concours filtrés par filière puis par âge
    pub async fn list_exams(&self, filter: &CatalogFilter) -> Vec<GovernmentExam> {
        let catalog = self.snapshot().await;
        let exams: Vec<GovernmentExam> = catalog
            .exams
            .iter()
            .filter(|e| has_stream(&e.streams, filter.stream.as_deref()))
            .filter(|e| text_matches(&[e.title.as_str(), e.description.as_str()], filter.q.as_deref()))
            .cloned()
            .collect();
        recommendation::filter_exams_by_age(&exams, filter.age)
    }

    pub async fn get_exam(&self, id: &str) -> Result<GovernmentExam> {
        let catalog = self.snapshot().await;
        catalog
            .exams
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("exam '{}'", id)))
    }

    /// Établissements triés par classement croissant
    pub async fn list_colleges(&self, filter: &CatalogFilter) -> Vec<College> {
        let catalog = self.snapshot().await;
        let mut colleges: Vec<College> = catalog
            .colleges
            .iter()
            .filter(|c| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |wanted| c.category.eq_ignore_ascii_case(wanted))
            })
            .filter(|c| {
                filter
                    .location
                    .as_deref()
                    .map_or(true, |wanted| contains_ci(&c.location, wanted))
            })
            .filter(|c| {
                filter
                    .course
                    .as_deref()
                    .map_or(true, |wanted| c.courses.iter().any(|id| id == wanted))
            })
            .filter(|c| text_matches(&[c.name.as_str(), c.description.as_str()], filter.q.as_deref()))
            .cloned()
            .collect();
        colleges.sort_by_key(|c| c.ranking);
        colleges
    }

    pub async fn get_college(&self, id: &str) -> Result<College> {
        let catalog = self.snapshot().await;
        catalog
            .colleges
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("college '{}'", id)))
    }

    /// Cours proposés par un établissement, dans l'ordre de sa liste
    pub async fn college_courses(&self, id: &str) -> Result<Vec<Course>> {
        let college = self.get_college(id).await?;
        let catalog = self.snapshot().await;
        Ok(college
            .courses
            .iter()
            .filter_map(|course_id| catalog.courses.iter().find(|c| &c.id == course_id))
            .cloned()
            .collect())
    }

    /// Classement NIRF, par catégorie puis par rang
    pub async fn list_rankings(&self, category: Option<&str>) -> Vec<NirfRanking> {
        let catalog = self.snapshot().await;
        let mut rankings: Vec<NirfRanking> = catalog
            .rankings
            .iter()
            .filter(|r| category.map_or(true, |wanted| r.category.eq_ignore_ascii_case(wanted)))
            .cloned()
            .collect();
        rankings.sort_by(|a, b| a.category.cmp(&b.category).then(a.rank.cmp(&b.rank)));
        rankings
    }

    /// Recherche dans les titres, noms et descriptions
    pub async fn search(&self, q: &str) -> Result<SearchResults> {
        let q = q.trim();
        if q.is_empty() {
            return Err(AppError::Validation("search query cannot be empty".to_string()));
        }
        let catalog = self.snapshot().await;
        let q = Some(q);

        Ok(SearchResults {
            courses: catalog
                .courses
                .iter()
                .filter(|c| text_matches(&[c.title.as_str(), c.description.as_str()], q))
                .cloned()
                .collect(),
            careers: catalog
                .careers
                .iter()
                .filter(|c| text_matches(&[c.title.as_str(), c.description.as_str()], q))
                .cloned()
                .collect(),
            exams: catalog
                .exams
                .iter()
                .filter(|e| {
                    let mut fields = vec![e.title.as_str(), e.description.as_str()];
                    fields.extend(e.eligibility.lines());
                    text_matches(&fields, q)
                })
                .cloned()
                .collect(),
            colleges: catalog
                .colleges
                .iter()
                .filter(|c| text_matches(&[c.name.as_str(), c.description.as_str(), c.location.as_str()], q))
                .cloned()
                .collect(),
            rankings: catalog
                .rankings
                .iter()
                .filter(|r| text_matches(&[r.name.as_str(), r.location.as_str()], q))
                .cloned()
                .collect(),
        })
    }

    pub async fn recommend(&self, stream: &str) -> Recommendations {
        let catalog = self.snapshot().await;
        recommendation::recommend(&catalog, stream)
    }

    pub async fn recommend_for_profile(&self, profile: &UserProfile) -> Recommendations {
        let catalog = self.snapshot().await;
        recommendation::recommend_for_profile(&catalog, profile)
    }

    /// Remplace le catalogue par le contenu des tables hébergées,
    /// lu dans l'ordre où `sync_to_backend` l'a écrit
    pub async fn load_from_backend(&self) -> Result<()> {
        let store = self.store.as_ref();
        let catalog = Catalog {
            courses: fetch_all(store, &in_order(COURSES_TABLE)).await?,
            careers: fetch_all(store, &in_order(CAREERS_TABLE)).await?,
            colleges: fetch_all(store, &in_order(COLLEGES_TABLE)).await?,
            exams: fetch_all(store, &in_order(EXAMS_TABLE)).await?,
            rankings: fetch_all(store, &in_order(RANKINGS_TABLE)).await?,
        };
        catalog.validate()?;

        info!(
            courses = catalog.courses.len(),
            careers = catalog.careers.len(),
            colleges = catalog.colleges.len(),
            exams = catalog.exams.len(),
            rankings = catalog.rankings.len(),
            "📚 Catalogue chargé depuis le backend"
        );
        *self.catalog.write().await = Arc::new(catalog);
        Ok(())
    }

    /// Pousse le catalogue courant vers les tables hébergées (upsert)
    pub async fn sync_to_backend(&self) -> Result<SyncReport> {
        let catalog = self.snapshot().await;
        let store = self.store.as_ref();

        let report = SyncReport {
            courses: upsert_in_order(store, COURSES_TABLE, &catalog.courses).await?,
            careers: upsert_in_order(store, CAREERS_TABLE, &catalog.careers).await?,
            colleges: upsert_in_order(store, COLLEGES_TABLE, &catalog.colleges).await?,
            exams: upsert_in_order(store, EXAMS_TABLE, &catalog.exams).await?,
            rankings: upsert_in_order(store, RANKINGS_TABLE, &catalog.rankings).await?,
        };
        info!(?report, "🔄 Catalogue synchronisé vers le backend");
        Ok(report)
    }
}
