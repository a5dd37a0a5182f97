use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{DeleteAck, InsertAck, ParcelQuery},
    services::parcel_service,
    utils::{error::AppError, json},
};

/// GET /parcels - All parcels, or those created by `email`, newest first
#[utoipa::path(
    get,
    path = "/parcels",
    tag = "Parcels",
    params(ParcelQuery),
    responses(
        (status = 200, description = "Parcels, newest first", body = [Object])
    )
)]
pub async fn list_parcels(
    db: web::Data<MongoDB>,
    query: web::Query<ParcelQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("📦 GET /parcels - email: {}", query.email.as_deref().unwrap_or("*"));

    let parcels = parcel_service::list_parcels(&db, &query).await?;

    log::info!("✅ Listed {} parcels", parcels.len());
    Ok(HttpResponse::Ok().json(json::documents_to_json(parcels)))
}

/// GET /parcels/{id} - One parcel, `null` when it does not exist
#[utoipa::path(
    get,
    path = "/parcels/{id}",
    tag = "Parcels",
    params(("id" = String, Path, description = "Parcel id (24 hex characters)")),
    responses(
        (status = 200, description = "The parcel, or null", body = Object),
        (status = 400, description = "Malformed parcel id")
    )
)]
pub async fn get_parcel(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("📦 GET /parcels/{}", id);

    let parcel = parcel_service::get_parcel(&db, &id).await?;

    Ok(HttpResponse::Ok().json(match parcel {
        Some(doc) => json::document_to_json(doc),
        None => serde_json::Value::Null,
    }))
}

/// POST /parcels - Store a new parcel as sent by the client
#[utoipa::path(
    post,
    path = "/parcels",
    tag = "Parcels",
    request_body(content = Object, description = "Parcel fields, e.g. created_by, createdAt, payment_status"),
    responses(
        (status = 200, description = "Insert acknowledgment", body = InsertAck),
        (status = 400, description = "Body is not a JSON object")
    )
)]
pub async fn create_parcel(
    db: web::Data<MongoDB>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /parcels");

    let ack = parcel_service::create_parcel(&db, body.into_inner()).await?;

    log::info!("✅ Parcel created: {}", ack.inserted_id);
    Ok(HttpResponse::Ok().json(ack))
}

/// DELETE /parcels/{id}
#[utoipa::path(
    delete,
    path = "/parcels/{id}",
    tag = "Parcels",
    params(("id" = String, Path, description = "Parcel id (24 hex characters)")),
    responses(
        (status = 200, description = "Delete acknowledgment; deletedCount is 0 when nothing matched", body = DeleteAck),
        (status = 400, description = "Malformed parcel id")
    )
)]
pub async fn delete_parcel(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /parcels/{}", id);

    let ack = parcel_service::delete_parcel(&db, &id).await?;

    log::info!("✅ Deleted {} parcel(s)", ack.deleted_count);
    Ok(HttpResponse::Ok().json(ack))
}
