pub mod error;
pub mod json;

pub use error::*;

use mongodb::bson::oid::ObjectId;

/// Parse a 24-hex-character store id; `what` names the entity in the error
pub fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id.trim()).map_err(|_| AppError::invalid_id(what))
}
