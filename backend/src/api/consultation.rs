// api/consultation.rs
use crate::api::AuthenticatedUser;
use crate::core::ConsultationService;
use crate::models::{NewConsultation, NewMessage};
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// Configure les routes des consultations avec un conseiller
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/consultations")
            .route("", web::get().to(list_consultations))
            .route("", web::post().to(request_consultation))
            .route("/{id}/cancel", web::post().to(cancel_consultation))
            .route("/{id}/messages", web::get().to(list_messages))
            .route("/{id}/messages", web::post().to(post_message)),
    );
}

async fn list_consultations(
    user: AuthenticatedUser,
    consultations: web::Data<ConsultationService>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(consultations.list_for_user(user.id).await?))
}

async fn request_consultation(
    user: AuthenticatedUser,
    consultations: web::Data<ConsultationService>,
    request: web::Json<NewConsultation>,
) -> Result<HttpResponse> {
    let consultation = consultations
        .request_consultation(user.id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(consultation))
}

async fn cancel_consultation(
    user: AuthenticatedUser,
    consultations: web::Data<ConsultationService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(consultations.cancel(user.id, id.into_inner()).await?))
}

async fn list_messages(
    user: AuthenticatedUser,
    consultations: web::Data<ConsultationService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(consultations.list_messages(user.id, id.into_inner()).await?))
}

async fn post_message(
    user: AuthenticatedUser,
    consultations: web::Data<ConsultationService>,
    id: web::Path<Uuid>,
    message: web::Json<NewMessage>,
) -> Result<HttpResponse> {
    let message = consultations
        .post_message(user.id, id.into_inner(), message.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(message))
}

#[cfg(test)]
mod tests {
    use crate::api::config;
    use crate::test_utils::{bearer, test_context};
    use actix_web::{http::StatusCode, test, App};
    use assert_json_diff::assert_json_include;
    use serde_json::{json, Value};
    use uuid::Uuid;

    #[actix_web::test]
    async fn test_consultation_lifecycle() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;
        let user_id = Uuid::new_v4();

        let req = test::TestRequest::post()
            .uri("/api/v1/consultations")
            .insert_header(bearer(user_id))
            .set_json(json!({ "expert_name": null, "topic": "Should I take PCMB in class 11?" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["status"], "pending");
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/consultations/{}/messages", id))
            .insert_header(bearer(user_id))
            .set_json(json!({ "content": "I enjoy biology and maths equally." }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/consultations/{}/messages", id))
            .insert_header(bearer(user_id))
            .to_request();
        let thread: Value = test::call_and_read_body_json(&app, req).await;
        assert_json_include!(
            actual: thread,
            expected: json!([{ "sender": "student", "content": "I enjoy biology and maths equally." }])
        );

        let req = test::TestRequest::get()
            .uri("/api/v1/consultations")
            .insert_header(bearer(user_id))
            .to_request();
        let mine: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/consultations/{}/cancel", id))
            .insert_header(bearer(user_id))
            .to_request();
        let cancelled: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cancelled["status"], "cancelled");

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/consultations/{}/cancel", id))
            .insert_header(bearer(user_id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::PRECONDITION_FAILED
        );
    }

    #[actix_web::test]
    async fn test_other_students_cannot_cancel() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;
        let owner = Uuid::new_v4();

        let req = test::TestRequest::post()
            .uri("/api/v1/consultations")
            .insert_header(bearer(owner))
            .set_json(json!({ "topic": "Scholarships for B.Com students" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/consultations/{}/cancel", id))
            .insert_header(bearer(Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/v1/consultations")
            .insert_header(bearer(owner))
            .set_json(json!({ "topic": "Hi" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
