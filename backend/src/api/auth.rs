// api/auth.rs
use crate::api::AuthenticatedUser;
use crate::core::{OtpService, ProfileService};
use crate::models::{NewProfile, SuccessResponse};
use crate::services::AuthProvider;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_object, validate_password};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

/// Configure les routes d'authentification
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            // Inscription
            .route("/signup", web::post().to(signup))
            // Connexion email/mot de passe
            .route("/login", web::post().to(login))
            // Rafraîchir la session
            .route("/refresh", web::post().to(refresh))
            // Déconnexion
            .route("/logout", web::post().to(logout))
            // Vérification de l'email par code
            .route("/otp/send", web::post().to(send_otp))
            .route("/otp/verify", web::post().to(verify_otp)),
    );
}

/// Requête d'inscription
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub mobile: Option<String>,
    pub grade: Option<u8>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpSendRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub code: String,
}

/// Crée le compte puis la ligne `profiles` associée (filière à choisir)
async fn signup(
    auth: web::Data<dyn AuthProvider>,
    profiles: web::Data<ProfileService>,
    request: web::Json<SignUpRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    validate_object(&request)?;
    validate_password(&request.password)?;

    let new_profile = NewProfile {
        full_name: request.full_name.trim().to_string(),
        email: request.email.trim().to_lowercase(),
        mobile: request.mobile,
        grade: request.grade,
    };
    validate_object(&new_profile)?;

    let (user, session) = match auth.sign_up(&new_profile.email, &request.password).await {
        Ok(outcome) => (outcome.user, outcome.session),
        // Compte existant : on reprend une inscription dont le profil n'a pas été créé
        Err(AppError::UserAlreadyExists) => {
            let session = auth
                .sign_in(&new_profile.email, &request.password)
                .await
                .map_err(|_| AppError::UserAlreadyExists)?;
            warn!(user_id = %session.user.id, "Reprise d'une inscription sans profil");
            (session.user.clone(), Some(session))
        }
        Err(e) => return Err(e),
    };

    // Un profil déjà présent renvoie 409
    let profile = profiles.create_profile(user.id, new_profile).await?;
    info!(user_id = %user.id, "🎉 Nouvel élève inscrit");

    Ok(HttpResponse::Created().json(json!({
        "user": user,
        "session": session,
        "profile": profile,
    })))
}

async fn login(
    auth: web::Data<dyn AuthProvider>,
    credentials: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    validate_object(&*credentials)?;
    let session = auth
        .sign_in(&credentials.email.trim().to_lowercase(), &credentials.password)
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

async fn refresh(
    auth: web::Data<dyn AuthProvider>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    validate_non_empty_string(&request.refresh_token, "refresh_token")?;
    Ok(HttpResponse::Ok().json(auth.refresh(&request.refresh_token).await?))
}

/// Révoque la session et oublie le profil en cache
async fn logout(
    user: AuthenticatedUser,
    auth: web::Data<dyn AuthProvider>,
    profiles: web::Data<ProfileService>,
) -> Result<HttpResponse> {
    auth.sign_out(&user.access_token).await?;
    profiles.invalidate(user.id).await;
    Ok(HttpResponse::Ok().json(SuccessResponse::with_message((), "Déconnecté")))
}

async fn send_otp(otp: web::Data<OtpService>, request: web::Json<OtpSendRequest>) -> Result<HttpResponse> {
    otp.send_otp(&request.email).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::with_message((), "Code envoyé")))
}

async fn verify_otp(otp: web::Data<OtpService>, request: web::Json<OtpVerifyRequest>) -> Result<HttpResponse> {
    otp.verify_otp(&request.email, request.code.trim()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "verified": true }))))
}

#[cfg(test)]
mod tests {
    use crate::api::config;
    use crate::models::ErrorResponse;
    use crate::test_utils::test_context;
    use actix_web::{http::StatusCode, test, App};
    use assert_json_diff::assert_json_include;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_signup_creates_pending_profile() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({
                "email": "Kavya@Example.in",
                "password": "secret123",
                "full_name": "Kavya Menon",
                "mobile": "+91 98765 43210",
                "grade": 10
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_json_include!(
            actual: body.clone(),
            expected: json!({
                "profile": { "email": "kavya@example.in", "stream": null, "interests": [], "grade": 10 }
            })
        );
        assert!(body["session"]["access_token"].is_string());
        assert_eq!(ctx.store.count("profiles").await, 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({
                "email": "kavya@example.in",
                "password": "secret123",
                "full_name": "Kavya Menon"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_signup_retry_after_profile_failure() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;
        let signup = || {
            test::TestRequest::post()
                .uri("/api/v1/auth/signup")
                .set_json(json!({ "email": "rohan@example.in", "password": "secret123", "full_name": "Rohan Das" }))
                .to_request()
        };

        // Le compte est créé mais l'insertion du profil échoue
        ctx.store.set_failing(true);
        assert_eq!(test::call_service(&app, signup()).await.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ctx.store.count("profiles").await, 0);

        ctx.store.set_failing(false);
        let resp = test::call_service(&app, signup()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["profile"]["email"], "rohan@example.in");
        let access_token = body["session"]["access_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/v1/profile")
            .insert_header(("Authorization", format!("Bearer {}", access_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/v1/profile/setup")
            .insert_header(("Authorization", format!("Bearer {}", access_token)))
            .set_json(json!({ "stream": "Science", "interests": ["Technology"] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        // Profil désormais présent : une nouvelle inscription est un conflit
        assert_eq!(test::call_service(&app, signup()).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_signup_existing_account_wrong_password() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        ctx.store.set_failing(true);
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({ "email": "isha@example.in", "password": "secret123", "full_name": "Isha Rao" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_GATEWAY);
        ctx.store.set_failing(false);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({ "email": "isha@example.in", "password": "another-pass", "full_name": "Isha Rao" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
        assert_eq!(ctx.store.count("profiles").await, 0);
    }

    #[actix_web::test]
    async fn test_signup_rejects_short_password() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({ "email": "a@example.in", "password": "123", "full_name": "Arjun" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(error.code, "BAD_REQUEST");
    }

    #[actix_web::test]
    async fn test_login_refresh_logout() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({ "email": "dev@example.in", "password": "secret123", "full_name": "Dev Patel" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "dev@example.in", "password": "wrong-password" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "dev@example.in", "password": "secret123" }))
            .to_request();
        let session: Value = test::call_and_read_body_json(&app, req).await;
        let access_token = session["access_token"].as_str().unwrap().to_string();
        let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({ "refresh_token": refresh_token }))
            .to_request();
        let refreshed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(refreshed["user"]["email"], "dev@example.in");

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/logout")
            .insert_header(("Authorization", format!("Bearer {}", access_token)))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }

    #[actix_web::test]
    async fn test_otp_send_and_verify() {
        let ctx = test_context();
        let app = test::init_service(App::new().configure(|cfg| ctx.state.register(cfg)).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/otp/send")
            .set_json(json!({ "email": "meera@example.in" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let code = ctx.mailer.last.lock().unwrap().get("meera@example.in").cloned().unwrap();

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/otp/verify")
            .set_json(json!({ "email": "meera@example.in", "code": code }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["verified"], true);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/otp/verify")
            .set_json(json!({ "email": "meera@example.in", "code": code }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
