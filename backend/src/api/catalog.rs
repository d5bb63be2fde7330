// api/catalog.rs
use crate::core::{CatalogFilter, CatalogService};
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Configure les routes du catalogue (lecture seule, publiques)
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/courses", web::get().to(list_courses))
        .route("/courses/{id}", web::get().to(get_course))
        .route("/careers", web::get().to(list_careers))
        .route("/careers/{id}", web::get().to(get_career))
        .route("/exams", web::get().to(list_exams))
        .route("/exams/{id}", web::get().to(get_exam))
        .route("/colleges", web::get().to(list_colleges))
        .route("/colleges/{id}", web::get().to(get_college))
        .route("/colleges/{id}/courses", web::get().to(college_courses))
        .route("/rankings", web::get().to(list_rankings))
        .route("/search", web::get().to(search));
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Cours, filtrables par filière (`?stream=Science`) et texte (`?q=`)
async fn list_courses(
    catalog: web::Data<CatalogService>,
    filter: web::Query<CatalogFilter>,
) -> HttpResponse {
    HttpResponse::Ok().json(catalog.list_courses(&filter).await)
}

async fn get_course(catalog: web::Data<CatalogService>, id: web::Path<String>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog.get_course(&id).await?))
}

/// Métiers, filtrables par filière et centre d'intérêt
async fn list_careers(
    catalog: web::Data<CatalogService>,
    filter: web::Query<CatalogFilter>,
) -> HttpResponse {
    HttpResponse::Ok().json(catalog.list_careers(&filter).await)
}

async fn get_career(catalog: web::Data<CatalogService>, id: web::Path<String>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog.get_career(&id).await?))
}

/// Concours, filtrables par filière et âge (`?age=17`)
async fn list_exams(
    catalog: web::Data<CatalogService>,
    filter: web::Query<CatalogFilter>,
) -> HttpResponse {
    HttpResponse::Ok().json(catalog.list_exams(&filter).await)
}

async fn get_exam(catalog: web::Data<CatalogService>, id: web::Path<String>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog.get_exam(&id).await?))
}

/// Établissements : catégorie, ville, cours proposé
async fn list_colleges(
    catalog: web::Data<CatalogService>,
    filter: web::Query<CatalogFilter>,
) -> HttpResponse {
    HttpResponse::Ok().json(catalog.list_colleges(&filter).await)
}

async fn get_college(catalog: web::Data<CatalogService>, id: web::Path<String>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog.get_college(&id).await?))
}

async fn college_courses(catalog: web::Data<CatalogService>, id: web::Path<String>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog.college_courses(&id).await?))
}

async fn list_rankings(
    catalog: web::Data<CatalogService>,
    query: web::Query<RankingQuery>,
) -> HttpResponse {
    HttpResponse::Ok().json(catalog.list_rankings(query.category.as_deref()).await)
}

async fn search(catalog: web::Data<CatalogService>, query: web::Query<SearchQuery>) -> Result<HttpResponse> {
    let q = query.q.as_deref().unwrap_or_default();
    Ok(HttpResponse::Ok().json(catalog.search(q).await?))
}
