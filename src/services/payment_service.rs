// ==================== PAYMENTS ====================
// Payment recording marks the parcel paid and stores the payment record so
// that both writes become visible together. With transactions enabled both
// run in one MongoDB transaction; otherwise a failed insert rolls the parcel
// status back to what it was.

use crate::{
    database::MongoDB,
    models::{payment_document, PaymentQuery, RecordPaymentRequest, STATUS_PAID},
    services::{identity_service::Identity, payment_gateway::PaymentGateway},
    utils::{error::AppError, parse_object_id},
};
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};

pub async fn create_intent(gateway: &dyn PaymentGateway, amount: i64) -> Result<String, AppError> {
    gateway.create_intent(amount).await
}

/// Returns the new payment's id. The parcel reference is not required to
/// exist.
pub async fn record_payment(db: &MongoDB, request: &RecordPaymentRequest) -> Result<ObjectId, AppError> {
    let parcel_id = parse_object_id(&request.parcel_id, "parcel")?;
    let payment = payment_document(request, parcel_id, Utc::now());

    let payment_id = if db.use_transactions() {
        record_in_transaction(db, parcel_id, payment).await?
    } else {
        record_with_compensation(db, parcel_id, payment).await?
    };

    payment_id
        .as_object_id()
        .ok_or_else(|| AppError::Serialization("Inserted payment has no ObjectId".to_string()))
}

async fn record_in_transaction(db: &MongoDB, parcel_id: ObjectId, payment: Document) -> Result<Bson, AppError> {
    let mut session = db.client().start_session().await?;
    session.start_transaction().await?;

    let outcome = async {
        db.parcels()
            .update_one(doc! { "_id": parcel_id }, doc! { "$set": { "payment_status": STATUS_PAID } })
            .session(&mut session)
            .await?;
        let inserted = db.payments().insert_one(payment).session(&mut session).await?;
        Ok::<_, mongodb::error::Error>(inserted.inserted_id)
    }
    .await;

    match outcome {
        Ok(payment_id) => {
            session.commit_transaction().await?;
            Ok(payment_id)
        }
        Err(e) => {
            if let Err(abort_err) = session.abort_transaction().await {
                log::warn!("⚠️  Failed to abort payment transaction: {}", abort_err);
            }
            Err(e.into())
        }
    }
}

async fn record_with_compensation(db: &MongoDB, parcel_id: ObjectId, payment: Document) -> Result<Bson, AppError> {
    let parcels = db.parcels();

    // returns the document as it was before the update
    let previous = parcels
        .find_one_and_update(doc! { "_id": parcel_id }, doc! { "$set": { "payment_status": STATUS_PAID } })
        .await?;

    match db.payments().insert_one(payment).await {
        Ok(inserted) => Ok(inserted.inserted_id),
        Err(e) => {
            if let Some(previous) = previous {
                let undo = match previous.get("payment_status") {
                    Some(status) => doc! { "$set": { "payment_status": status.clone() } },
                    None => doc! { "$unset": { "payment_status": "" } },
                };
                if let Err(undo_err) = parcels.update_one(doc! { "_id": parcel_id }, undo).await {
                    log::error!(
                        "❌ Parcel {} left marked paid without a payment record: {}",
                        parcel_id,
                        undo_err
                    );
                }
            }
            Err(e.into())
        }
    }
}

/// A verified caller may only read their own payment history. Runs before
/// any store access.
pub fn authorize_history(identity: &Identity, query: &PaymentQuery) -> Result<(), AppError> {
    match (identity.email.as_deref(), query.email.as_deref()) {
        (Some(owner), Some(requested)) if owner == requested => Ok(()),
        _ => Err(AppError::Forbidden("forbidden access".to_string())),
    }
}

/// Payments matching the optional email filter, latest first
pub async fn list_payments(db: &MongoDB, query: &PaymentQuery) -> Result<Vec<Document>, AppError> {
    let cursor = db
        .payments()
        .find(query.filter())
        .sort(doc! { "paid_At": -1 })
        .await?;

    Ok(cursor.try_collect().await?)
}
