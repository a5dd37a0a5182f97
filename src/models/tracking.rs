use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};

/// Body of `POST /tracking`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TrackingRequest {
    pub tracking_id: String,
    pub parcel_id: Option<String>,
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub updated_by: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
    pub success: bool,
    pub inserted_id: String,
}

/// Stored log entry; `parcel_id` is left out when the caller did not send one
pub fn tracking_document(request: &TrackingRequest, parcel_id: Option<ObjectId>, time: DateTime) -> Document {
    let mut entry = doc! { "tracking_id": request.tracking_id.as_str() };
    if let Some(parcel_id) = parcel_id {
        entry.insert("parcel_id", parcel_id);
    }
    entry.insert("status", request.status.as_str());
    entry.insert("message", request.message.as_str());
    entry.insert("time", time);
    entry.insert("updated_by", request.updated_by.as_str());
    entry
}
