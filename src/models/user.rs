use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "user";

/// Body of `POST /users`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterUserRequest {
    pub email: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RegisterUserResponse {
    pub message: String,
    /// Stored user document
    #[schema(value_type = Object)]
    pub user: serde_json::Value,
    pub inserted: bool,
}
