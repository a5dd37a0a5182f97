use crate::{database::MongoDB, models::DEFAULT_ROLE, utils::error::AppError};
use mongodb::bson::{doc, DateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::UpdateOptions;

const DUPLICATE_KEY: i32 = 11000;

/// Insert-if-absent by email. Returns the stored user and whether this call
/// created it. The unique index on `email` backs the single-record guarantee.
pub async fn register_user(db: &MongoDB, email: &str) -> Result<(Document, bool), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::InvalidRequest("email is required".to_string()));
    }

    let users = db.users();
    let options = UpdateOptions::builder().upsert(true).build();

    let inserted = match users
        .update_one(
            doc! { "email": email },
            doc! { "$setOnInsert": { "role": DEFAULT_ROLE, "createdAt": DateTime::now() } },
        )
        .with_options(options)
        .await
    {
        Ok(result) => result.upserted_id.is_some(),
        // a concurrent registration won the insert
        Err(e) if is_duplicate_key(&e) => false,
        Err(e) => return Err(e.into()),
    };

    let user = users
        .find_one(doc! { "email": email })
        .await?
        .unwrap_or_else(|| doc! { "email": email, "role": DEFAULT_ROLE });

    Ok((user, inserted))
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY,
        _ => false,
    }
}
