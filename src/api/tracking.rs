use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{TrackingRequest, TrackingResponse},
    services::tracking_service,
    utils::error::AppError,
};

/// POST /tracking - Append a delivery status update
#[utoipa::path(
    post,
    path = "/tracking",
    tag = "Tracking",
    request_body = TrackingRequest,
    responses(
        (status = 200, description = "Entry stored", body = TrackingResponse),
        (status = 400, description = "Malformed parcel id")
    )
)]
pub async fn append_tracking(
    db: web::Data<MongoDB>,
    request: web::Json<TrackingRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🚚 POST /tracking - {} -> {}", request.tracking_id, request.status);

    let id = tracking_service::append_entry(&db, &request).await?;

    Ok(HttpResponse::Ok().json(TrackingResponse {
        success: true,
        inserted_id: id.to_hex(),
    }))
}
