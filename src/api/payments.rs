use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{
        CreateIntentRequest, CreateIntentResponse, PaymentQuery, RecordPaymentRequest,
        RecordPaymentResponse,
    },
    services::{identity_service::Identity, payment_gateway::PaymentGateway, payment_service},
    utils::{error::AppError, json},
};

/// POST /create-payment-intent - Card payment intent in USD
#[utoipa::path(
    post,
    path = "/create-payment-intent",
    tag = "Payments",
    request_body = CreateIntentRequest,
    responses(
        (status = 200, description = "Client secret for the payment form", body = CreateIntentResponse),
        (status = 400, description = "Rejected by the payment gateway; `error` carries its message")
    )
)]
pub async fn create_payment_intent(
    gateway: web::Data<dyn PaymentGateway>,
    request: web::Json<CreateIntentRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("💳 POST /create-payment-intent - amount: {}", request.amount_incent);

    let client_secret = payment_service::create_intent(gateway.get_ref(), request.amount_incent).await?;

    Ok(HttpResponse::Ok().json(CreateIntentResponse { client_secret }))
}

/// GET /payments - Payment history, latest first
///
/// When identity verification is on, the verified email must match `email`.
#[utoipa::path(
    get,
    path = "/payments",
    tag = "Payments",
    params(PaymentQuery),
    responses(
        (status = 200, description = "Payments, latest first", body = [Object]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Token does not belong to the requested email")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_payments(
    db: web::Data<MongoDB>,
    query: web::Query<PaymentQuery>,
    identity: Option<web::ReqData<Identity>>,
) -> Result<HttpResponse, AppError> {
    log::info!("📋 GET /payments - email: {}", query.email.as_deref().unwrap_or("*"));

    if let Some(identity) = identity {
        if let Err(e) = payment_service::authorize_history(&identity, &query) {
            log::warn!(
                "🚫 {} tried to read payments of {}",
                identity.email.as_deref().unwrap_or(&identity.uid),
                query.email.as_deref().unwrap_or("*")
            );
            return Err(e);
        }
    }

    let payments = payment_service::list_payments(&db, &query).await?;

    log::info!("✅ Listed {} payments", payments.len());
    Ok(HttpResponse::Ok().json(json::documents_to_json(payments)))
}

/// POST /payments - Record a completed payment and mark its parcel paid
#[utoipa::path(
    post,
    path = "/payments",
    tag = "Payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment saved and parcel updated", body = RecordPaymentResponse),
        (status = 400, description = "Malformed parcel id")
    )
)]
pub async fn record_payment(
    db: web::Data<MongoDB>,
    request: web::Json<RecordPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "💰 POST /payments - parcel: {}, transaction: {}",
        request.parcel_id,
        request.transaction_id
    );

    let payment_id = payment_service::record_payment(&db, &request).await?;

    log::info!("✅ Payment recorded: {}", payment_id);
    Ok(HttpResponse::Ok().json(RecordPaymentResponse {
        message: "Payment saved and parcel updated".to_string(),
        payment_id: payment_id.to_hex(),
    }))
}
