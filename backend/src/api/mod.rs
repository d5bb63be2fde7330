// api/mod.rs
pub mod middleware;
pub mod catalog;
pub mod recommendation;
pub mod auth;
pub mod profile;
pub mod consultation;

pub use middleware::{AuthenticatedUser, TokenVerifier};

use crate::core::{CatalogService, ConsultationService, OtpService, ProfileService};
use crate::services::AuthProvider;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::sync::Arc;

/// Services partagés entre les workers
#[derive(Clone)]
pub struct AppState {
    pub catalog: web::Data<CatalogService>,
    pub profiles: web::Data<ProfileService>,
    pub otp: web::Data<OtpService>,
    pub consultations: web::Data<ConsultationService>,
    pub auth: web::Data<dyn AuthProvider>,
    pub verifier: web::Data<TokenVerifier>,
}

impl AppState {
    pub fn new(
        catalog: CatalogService,
        profiles: ProfileService,
        otp: OtpService,
        consultations: ConsultationService,
        auth: Arc<dyn AuthProvider>,
        verifier: TokenVerifier,
    ) -> Self {
        Self {
            catalog: web::Data::new(catalog),
            profiles: web::Data::new(profiles),
            otp: web::Data::new(otp),
            consultations: web::Data::new(consultations),
            auth: web::Data::from(auth),
            verifier: web::Data::new(verifier),
        }
    }

    /// Enregistre chaque service comme `app_data`
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.catalog.clone())
            .app_data(self.profiles.clone())
            .app_data(self.otp.clone())
            .app_data(self.consultations.clone())
            .app_data(self.auth.clone())
            .app_data(self.verifier.clone());
    }
}

/// Configure toutes les routes de l'API
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Routes publiques : catalogue et recommandations par filière
            .configure(catalog::configure_routes)
            .configure(recommendation::configure_routes)
            .configure(auth::configure_routes)
            // Routes protégées (extracteur AuthenticatedUser)
            .configure(profile::configure_routes)
            .configure(consultation::configure_routes),
    );

    // Endpoint de santé
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

/// Endpoint de santé pour monitoring
async fn health_check(catalog: web::Data<CatalogService>) -> impl Responder {
    let snapshot = catalog.snapshot().await;
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "catalog": {
            "courses": snapshot.courses.len(),
            "careers": snapshot.careers.len(),
            "exams": snapshot.exams.len(),
            "colleges": snapshot.colleges.len(),
            "rankings": snapshot.rankings.len(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_context;
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_health_reports_catalog_sizes() {
        let ctx = test_context();
        let app = test::init_service(
            App::new().configure(|cfg| ctx.state.register(cfg)).configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["catalog"]["courses"], 13);
        assert_eq!(body["catalog"]["rankings"], 8);
    }
}
