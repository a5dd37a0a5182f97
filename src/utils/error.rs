use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Error type shared by every service function and handler.
///
/// Store and serialization failures are logged in full but reach the client
/// only as an opaque 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid {0} ID")]
    InvalidIdentifier(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Payment gateway rejection; the provider message is passed through as-is
    #[error("{0}")]
    Gateway(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl AppError {
    pub fn invalid_id(what: &str) -> Self {
        AppError::InvalidIdentifier(what.to_string())
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Configuration(_) | AppError::Database(_) | AppError::Serialization(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Gateway(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            log::error!("❌ {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::invalid_id("parcel").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Gateway("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Serialization("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_gateway_message_passes_through() {
        let err = AppError::Gateway("Amount must be at least $0.50 usd".into());
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Amount must be at least $0.50 usd");
    }

    #[actix_web::test]
    async fn test_internal_errors_are_opaque() {
        let err = AppError::Serialization("document too deep at key `x`".into());
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["success"], false);
    }
}
