use crate::{
    database::MongoDB,
    models::{DeleteAck, InsertAck, ParcelQuery},
    utils::{error::AppError, parse_object_id},
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};

/// Parcels matching the optional owner filter, newest first
pub async fn list_parcels(db: &MongoDB, query: &ParcelQuery) -> Result<Vec<Document>, AppError> {
    let cursor = db
        .parcels()
        .find(query.filter())
        .sort(doc! { "createdAt": -1 })
        .await?;

    Ok(cursor.try_collect().await?)
}

pub async fn get_parcel(db: &MongoDB, id: &str) -> Result<Option<Document>, AppError> {
    let oid = parse_object_id(id, "parcel")?;
    Ok(db.parcels().find_one(doc! { "_id": oid }).await?)
}

/// Stores the caller's JSON object as-is; the store assigns `_id`
pub async fn create_parcel(db: &MongoDB, body: serde_json::Value) -> Result<InsertAck, AppError> {
    if !body.is_object() {
        return Err(AppError::InvalidRequest("Parcel must be a JSON object".to_string()));
    }

    let mut parcel = mongodb::bson::to_document(&body)?;
    parcel.remove("_id");

    let result = db.parcels().insert_one(parcel).await?;
    let id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Serialization("Inserted parcel has no ObjectId".to_string()))?;

    Ok(InsertAck::new(id))
}

pub async fn delete_parcel(db: &MongoDB, id: &str) -> Result<DeleteAck, AppError> {
    let oid = parse_object_id(id, "parcel")?;
    let result = db.parcels().delete_one(doc! { "_id": oid }).await?;

    Ok(DeleteAck {
        acknowledged: true,
        deleted_count: result.deleted_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::{lazy_db, live_db};
    use crate::models::STATUS_UNPAID;

    #[tokio::test]
    async fn test_malformed_ids_fail_before_store() {
        // lazy handle never connects, so reaching the store would time out instead
        let db = lazy_db().await;
        assert!(matches!(get_parcel(&db, "nope").await, Err(AppError::InvalidIdentifier(_))));
        assert!(matches!(delete_parcel(&db, "1234").await, Err(AppError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_non_object_body_rejected() {
        let db = lazy_db().await;
        let result = create_parcel(&db, serde_json::json!(["not", "a", "parcel"])).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_parcel_round_trip_and_listing() {
        let db = live_db("parcel_service_parcels").await;

        let older = create_parcel(&db, serde_json::json!({
            "title": "Books",
            "created_by": "a@b.com",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "payment_status": STATUS_UNPAID,
        }))
        .await
        .unwrap();
        let newer = create_parcel(&db, serde_json::json!({
            "title": "Laptop",
            "created_by": "a@b.com",
            "createdAt": "2024-05-02T10:00:00.000Z",
            "payment_status": STATUS_UNPAID,
        }))
        .await
        .unwrap();
        create_parcel(&db, serde_json::json!({
            "title": "Shoes",
            "created_by": "other@b.com",
            "createdAt": "2024-05-03T10:00:00.000Z",
        }))
        .await
        .unwrap();

        let fetched = get_parcel(&db, &older.inserted_id).await.unwrap().unwrap();
        assert_eq!(fetched.get_str("title").unwrap(), "Books");
        assert_eq!(fetched.get_str("payment_status").unwrap(), STATUS_UNPAID);

        let mine = list_parcels(&db, &ParcelQuery { email: Some("a@b.com".into()) }).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].get_object_id("_id").unwrap().to_hex(), newer.inserted_id);

        let all = list_parcels(&db, &ParcelQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].get_str("title").unwrap(), "Shoes");

        let ack = delete_parcel(&db, &older.inserted_id).await.unwrap();
        assert_eq!(ack.deleted_count, 1);
        let ack = delete_parcel(&db, &older.inserted_id).await.unwrap();
        assert_eq!(ack.deleted_count, 0);
        assert!(get_parcel(&db, &older.inserted_id).await.unwrap().is_none());
    }
}
