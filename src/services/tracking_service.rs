use crate::{
    database::MongoDB,
    models::{tracking_document, TrackingRequest},
    utils::{error::AppError, parse_object_id},
};
use mongodb::bson::{oid::ObjectId, DateTime};

/// Append a delivery log entry stamped with the server time
pub async fn append_entry(db: &MongoDB, request: &TrackingRequest) -> Result<ObjectId, AppError> {
    let parcel_id = match request.parcel_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => Some(parse_object_id(id, "parcel")?),
        None => None,
    };

    let entry = tracking_document(request, parcel_id, DateTime::now());
    let result = db.tracking().insert_one(entry).await?;

    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Serialization("Inserted tracking entry has no ObjectId".to_string()))
}
