use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

/// Body of `POST /create-payment-intent`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    /// Amount in the smallest currency unit (cents)
    pub amount_incent: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

/// Body of `POST /payments`
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub parcel_id: String,
    pub amount: f64,
    pub transaction_id: String,
    pub email: String,
    pub payment_method: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentResponse {
    pub message: String,
    pub payment_id: String,
}

/// Query string of `GET /payments`
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentQuery {
    pub email: Option<String>,
}

impl PaymentQuery {
    pub fn filter(&self) -> Document {
        match self.email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => doc! { "email": email },
            None => doc! {},
        }
    }
}

/// Stored payment document. Both timestamps come from the same instant.
pub fn payment_document(request: &RecordPaymentRequest, parcel_id: ObjectId, paid_at: DateTime<Utc>) -> Document {
    doc! {
        "parcelId": parcel_id,
        "amount": request.amount,
        "transactionId": request.transaction_id.as_str(),
        "email": request.email.as_str(),
        "paymentMethod": request.payment_method.as_str(),
        "paid_at_string": paid_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "paid_At": mongodb::bson::DateTime::from_millis(paid_at.timestamp_millis()),
    }
}
