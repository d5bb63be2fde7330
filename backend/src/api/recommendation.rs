// api/recommendation.rs
use crate::api::AuthenticatedUser;
use crate::core::{filter_exams_by_age, CatalogService, ProfileService};
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

/// Configure les routes de recommandation
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/recommendations", web::get().to(recommend_for_stream))
        .route("/recommendations/me", web::get().to(recommend_for_me));
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub stream: Option<String>,
    pub age: Option<u32>,
}

/// Recommandations pour une filière donnée ; filière absente ou inconnue => listes vides
async fn recommend_for_stream(
    catalog: web::Data<CatalogService>,
    query: web::Query<RecommendationQuery>,
) -> HttpResponse {
    let stream = query.stream.as_deref().unwrap_or_default();
    let mut recommendations = catalog.recommend(stream).await;
    recommendations.exams = filter_exams_by_age(&recommendations.exams, query.age);
    HttpResponse::Ok().json(recommendations)
}

/// Recommandations personnalisées (filière, centres d'intérêt et âge du profil)
async fn recommend_for_me(
    user: AuthenticatedUser,
    catalog: web::Data<CatalogService>,
    profiles: web::Data<ProfileService>,
) -> Result<HttpResponse> {
    let profile = profiles.get_profile(user.id).await?;
    if !profile.is_setup_complete() {
        debug!(user_id = %user.id, "Profil incomplet, aucune recommandation");
    }
    Ok(HttpResponse::Ok().json(catalog.recommend_for_profile(&profile).await))
}

#[cfg(test)]
mod tests {
    use crate::api::config;
    use crate::models::{NewProfile, Stream};
    use crate::test_utils::{bearer, test_context};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use uuid::Uuid;

    fn ids(body: &Value, key: &str) -> Vec<String> {
        body[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[actix_web::test]
    async fn test_recommend_science() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/v1/recommendations?stream=Science").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(ids(&body, "courses"), vec!["btech", "mbbs", "bsc", "bpharm", "bca"]);
        assert_eq!(ids(&body, "careers"), vec!["software-engineer", "doctor", "data-scientist"]);
        assert_eq!(ids(&body, "exams"), vec!["jee-main", "neet-ug"]);
    }

    #[actix_web::test]
    async fn test_unknown_stream_and_age_cutoff() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/v1/recommendations?stream=Vocational").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["courses"].as_array().unwrap().is_empty());
        assert!(body["careers"].as_array().unwrap().is_empty());

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations?stream=Science&age=25")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["exams"].as_array().unwrap().is_empty());
        assert_eq!(ids(&body, "courses").len(), 5);
    }

    #[actix_web::test]
    async fn test_recommendations_for_profile() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let user_id = Uuid::new_v4();
        ctx.state
            .profiles
            .create_profile(
                user_id,
                NewProfile {
                    full_name: "Ananya Rao".to_string(),
                    email: "ananya@example.in".to_string(),
                    mobile: None,
                    grade: Some(11),
                },
            )
            .await
            .unwrap();
        ctx.state
            .profiles
            .complete_setup(user_id, Stream::Arts, vec!["Law".to_string()], Some(25))
            .await
            .unwrap();

        let req = test::TestRequest::get()
            .uri("/api/v1/recommendations/me")
            .insert_header(bearer(user_id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(ids(&body, "careers"), vec!["lawyer", "civil-servant", "journalist"]);
        assert!(body["exams"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_recommendations_for_me_requires_token() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/v1/recommendations/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
