// backend/src/main.rs
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use disha::api::{self, AppState, TokenVerifier};
use disha::core::{CatalogService, ConsultationService, OtpService, ProfileService};
use disha::models::Catalog;
use disha::services::{AuthClient, AuthProvider, BackendClient, EmailFunctionClient, LogMailer, OtpMailer, RowStore};
use disha::utils::{AppError, CatalogSource, Config};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Chargement de la configuration
    let config = Config::from_env().map_err(to_io_error)?;

    // Initialisation du logging
    setup_tracing(&config);
    info!("🚀 Démarrage de {} v{}", disha::NAME, disha::VERSION);
    info!("🔧 Mode: {}", config.run_mode);

    let state = build_state(&config).await.map_err(|e| {
        error!("❌ Initialisation impossible: {}", e);
        to_io_error(e)
    })?;

    let bind_address = format!("{}:{}", config.server_host, config.server_port);
    let production = config.is_production();
    let frontend_url = config.frontend_url.clone();

    // Configuration du serveur Actix-Web
    let server = HttpServer::new(move || {
        let cors = if production {
            Cors::default()
                .allowed_origin(&frontend_url)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            Cors::permissive()
        };

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(|cfg| state.register(cfg))
            .configure(api::config)
            .default_service(web::route().to(|| async { "🎓 Disha backend est en cours d'exécution!" }))
    })
    .bind(&bind_address)?
    .workers(config.workers)
    .shutdown_timeout(10);

    info!("✅ Backend démarré avec succès!");
    info!("🔗 API disponible sur http://{}", bind_address);

    server.run().await
}

/// Construit les clients du backend hébergé et les services
async fn build_state(config: &Config) -> disha::Result<AppState> {
    let store: Arc<dyn RowStore> = Arc::new(
        BackendClient::new(
            &config.backend_url,
            &config.backend_anon_key,
            config.http_timeout_seconds,
        )?
        .with_service_role(&config.backend_service_role_key),
    );

    let auth: Arc<dyn AuthProvider> = Arc::new(AuthClient::new(
        &config.backend_url,
        &config.backend_anon_key,
        config.http_timeout_seconds,
    )?);

    // Sans nom de fonction, les codes sont seulement journalisés
    let mailer: Arc<dyn OtpMailer> = if config.otp_function_name.trim().is_empty() {
        warn!("⚠️  OTP_FUNCTION_NAME vide : les codes ne sont pas envoyés par email");
        Arc::new(LogMailer)
    } else {
        Arc::new(EmailFunctionClient::new(
            &config.backend_url,
            &config.otp_function_name,
            &config.backend_anon_key,
            config.http_timeout_seconds,
        )?)
    };

    let catalog = load_catalog(config, store.clone()).await?;

    Ok(AppState::new(
        catalog,
        ProfileService::new(store.clone()),
        OtpService::new(
            mailer,
            chrono::Duration::minutes(config.otp_ttl_minutes),
            config.otp_max_attempts,
        ),
        ConsultationService::new(store),
        auth,
        TokenVerifier::new(&config.backend_jwt_secret),
    ))
}

/// Catalogue embarqué ou tables hébergées, selon CATALOG_SOURCE
async fn load_catalog(config: &Config, store: Arc<dyn RowStore>) -> disha::Result<CatalogService> {
    let service = CatalogService::new(Catalog::seed()?, store);

    match config.catalog_source {
        CatalogSource::Seed => {
            info!("📚 Catalogue embarqué chargé");
            if config.catalog_sync_on_start {
                let report = service.sync_to_backend().await?;
                info!(?report, "✅ Tables du catalogue synchronisées");
            }
        }
        CatalogSource::Backend => {
            if let Err(e) = service.load_from_backend().await {
                warn!("⚠️  Catalogue hébergé indisponible, données embarquées conservées: {}", e);
            }
        }
    }

    Ok(service)
}

/// Configure le tracing pour le logging structuré
fn setup_tracing(config: &Config) {
    let log_level = config.log_level.parse().unwrap_or(tracing::Level::INFO);

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level.into()),
        )
        .with(if config.log_format == "json" {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        } else {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .with_file(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        });

    subscriber.init();
}

fn to_io_error(err: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}
