use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

pub const STATUS_UNPAID: &str = "unpaid";
pub const STATUS_PAID: &str = "paid";

/// Query string of `GET /parcels`
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ParcelQuery {
    /// Only parcels whose `created_by` equals this email
    pub email: Option<String>,
}

impl ParcelQuery {
    pub fn filter(&self) -> Document {
        match self.email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => doc! { "created_by": email },
            None => doc! {},
        }
    }
}

/// Acknowledgment returned after inserting a document
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertAck {
    pub fn new(id: ObjectId) -> Self {
        Self { acknowledged: true, inserted_id: id.to_hex() }
    }
}

/// Acknowledgment returned after deleting by id
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_with_email() {
        let q = ParcelQuery { email: Some("a@b.com".into()) };
        assert_eq!(q.filter(), doc! { "created_by": "a@b.com" });
    }

    #[test]
    fn test_filter_without_email() {
        assert_eq!(ParcelQuery::default().filter(), doc! {});
        let q = ParcelQuery { email: Some(String::new()) };
        assert_eq!(q.filter(), doc! {});
    }

    #[test]
    fn test_ack_shapes() {
        let oid = ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap();
        let json = serde_json::to_value(InsertAck::new(oid)).unwrap();
        assert_eq!(json, serde_json::json!({ "acknowledged": true, "insertedId": "64b7f0c2a1b2c3d4e5f60718" }));

        let json = serde_json::to_value(DeleteAck { acknowledged: true, deleted_count: 0 }).unwrap();
        assert_eq!(json["deletedCount"], 0);
    }
}
