use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use crate::database::MongoDB;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: bool,
    pub timestamp: i64,
}

/// Liveness text, kept for clients that probe `/`
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = String, content_type = "text/plain")
    )
)]
pub async fn root() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("App is running in the server")
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status, including store reachability", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<MongoDB>) -> impl Responder {
    let database = match db.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("⚠️  Health check: database unreachable: {}", e);
            false
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if database { "healthy" } else { "degraded" }.to_string(),
        service: "parcel-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        timestamp: chrono::Utc::now().timestamp(),
    })
}
