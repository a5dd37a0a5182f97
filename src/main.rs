mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, VerificationMode};
use crate::middleware::AuthPolicy;
use crate::services::{FirebaseVerifier, PaymentGateway, StripeGateway};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    log::info!("🚀 Starting Parcel Service...");
    log::info!("📊 Database: {}", config.database_name);

    // Initialize MongoDB connection
    let db = match database::MongoDB::new(&config.database_url, &config.database_name, config.use_transactions).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };
    let db_data = web::Data::new(db);

    log::info!("✅ MongoDB connected successfully");
    if !config.use_transactions {
        log::warn!("⚠️  Transactions disabled: payment recording uses compensating writes");
    }

    let gateway: Arc<dyn PaymentGateway> = match StripeGateway::new(&config.stripe_secret_key, &config.stripe_api_base) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let gateway_data: web::Data<dyn PaymentGateway> = web::Data::from(gateway);

    let policy = match (&config.verification, &config.firebase_project_id) {
        (VerificationMode::Required, Some(project_id)) => {
            match FirebaseVerifier::new(project_id, &config.firebase_jwks_url) {
                Ok(verifier) => {
                    log::info!("🔐 Identity verification enabled for project {}", project_id);
                    AuthPolicy::Required(Arc::new(verifier))
                }
                Err(e) => {
                    log::error!("❌ {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => {
            log::warn!("⚠️  Identity verification disabled: GET /payments is open");
            AuthPolicy::Disabled
        }
    };

    let bind_address = config.bind_address();
    let allowed_origins = config.cors_allowed_origins.clone();

    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if allowed_origins.is_empty() {
            Cors::permissive()
        } else {
            allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    actix_web::http::header::AUTHORIZATION,
                    actix_web::http::header::CONTENT_TYPE,
                    actix_web::http::header::ACCEPT,
                ])
                .max_age(3600)
        };

        let openapi = api::swagger::ApiDoc::openapi();
        let policy = policy.clone();

        App::new()
            .app_data(db_data.clone())
            .app_data(gateway_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(move |cfg| api::configure(cfg, policy))
    })
    .bind(bind_address)?
    .run()
    .await
}
