// api/profile.rs
use crate::api::AuthenticatedUser;
use crate::core::ProfileService;
use crate::models::{ProfileUpdate, Stream};
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Configure les routes du profil (authentification requise)
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .route("", web::get().to(get_profile))
            .route("", web::put().to(update_profile))
            // Première configuration : filière, centres d'intérêt, âge
            .route("/setup", web::post().to(complete_setup)),
    );
}

#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub stream: Stream,
    pub interests: Vec<String>,
    pub age: Option<u32>,
}

async fn get_profile(user: AuthenticatedUser, profiles: web::Data<ProfileService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(profiles.get_profile(user.id).await?))
}

/// Mise à jour partielle : seuls les champs présents sont modifiés
async fn update_profile(
    user: AuthenticatedUser,
    profiles: web::Data<ProfileService>,
    update: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(profiles.update_profile(user.id, &update).await?))
}

async fn complete_setup(
    user: AuthenticatedUser,
    profiles: web::Data<ProfileService>,
    request: web::Json<SetupRequest>,
) -> Result<HttpResponse> {
    let SetupRequest { stream, interests, age } = request.into_inner();
    let profile = profiles.complete_setup(user.id, stream, interests, age).await?;
    Ok(HttpResponse::Ok().json(profile))
}
