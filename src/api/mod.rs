pub mod health;
pub mod parcels;
pub mod payments;
pub mod swagger;
pub mod tracking;
pub mod users;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{guard, web, HttpRequest};
use crate::middleware::{AuthMiddleware, AuthPolicy};
use crate::utils::error::AppError;

/// Route table. `policy` guards `GET /payments` only.
pub fn configure(cfg: &mut web::ServiceConfig, policy: AuthPolicy) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        // Liveness & health
        .route("/", web::get().to(health::root))
        .route("/health", web::get().to(health::health_check))
        // Users
        .route("/users", web::post().to(users::register_user))
        // Parcels
        .service(
            web::resource("/parcels")
                .route(web::get().to(parcels::list_parcels))
                .route(web::post().to(parcels::create_parcel)),
        )
        .service(
            web::resource("/parcels/{id}")
                .route(web::get().to(parcels::get_parcel))
                .route(web::delete().to(parcels::delete_parcel)),
        )
        // Payments
        .route("/create-payment-intent", web::post().to(payments::create_payment_intent))
        .service(
            web::resource("/payments")
                .guard(guard::Get())
                .wrap(AuthMiddleware::new(policy))
                .route(web::get().to(payments::list_payments)),
        )
        .service(web::resource("/payments").route(web::post().to(payments::record_payment)))
        // Tracking
        .route("/tracking", web::post().to(tracking::append_tracking));
}

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("⚠️  {} {} - bad JSON body: {}", req.method(), req.path(), err);
    AppError::InvalidRequest(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("⚠️  {} {} - bad query: {}", req.method(), req.path(), err);
    AppError::InvalidRequest(err.to_string()).into()
}

fn path_error(err: PathError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("⚠️  {} {} - bad path: {}", req.method(), req.path(), err);
    AppError::InvalidRequest(err.to_string()).into()
}
