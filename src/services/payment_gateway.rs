// ==================== PAYMENT GATEWAY ====================
// Stripe PaymentIntents API: one call, fixed currency, card only.

use crate::utils::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const CURRENCY: &str = "usd";
pub const PAYMENT_METHOD: &str = "card";

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount` in the smallest currency unit and
    /// return its client secret
    async fn create_intent(&self, amount: i64) -> Result<String, AppError>;
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub struct StripeGateway {
    secret_key: String,
    api_base_url: String,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>, api_base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            secret_key: secret_key.into(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount: i64) -> Result<String, AppError> {
        log::info!("💳 Creating payment intent: {} {}", amount, CURRENCY);

        let amount = amount.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", CURRENCY),
            ("payment_method_types[]", PAYMENT_METHOD),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Payment gateway unreachable: {}", e);
                AppError::Gateway(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<StripeErrorBody>().await {
                Ok(body) => {
                    log::warn!(
                        "⚠️  Payment gateway rejected intent ({}, {}): {:?}",
                        status,
                        body.error.kind.as_deref().unwrap_or("unknown"),
                        body.error.message
                    );
                    body.error
                        .message
                        .unwrap_or_else(|| format!("Payment gateway error: {}", status))
                }
                Err(_) => format!("Payment gateway error: {}", status),
            };
            return Err(AppError::Gateway(message));
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse payment intent: {}", e)))?;

        let client_secret = intent
            .client_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Gateway("Payment intent has no client secret".to_string()))?;

        log::info!("✅ Payment intent created: {}", intent.id);
        Ok(client_secret)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Stripe stand-in: positive amounts succeed, anything else is rejected
    pub(crate) async fn stripe_server() -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(body_string_contains("amount=-"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "type": "invalid_request_error",
                    "message": "This value must be greater than or equal to 1."
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(body_string_contains("amount=0&"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "type": "invalid_request_error",
                    "message": "This value must be greater than or equal to 1."
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("authorization", "Bearer sk_test_parcel"))
            .and(body_string_contains("currency=usd"))
            .and(body_string_contains("payment_method_types%5B%5D=card"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "object": "payment_intent",
                "amount": 1000,
                "currency": "usd",
                "client_secret": "pi_123_secret_abc"
            })))
            .mount(&server)
            .await;

        server
    }

    pub(crate) fn gateway_for(server: &MockServer) -> StripeGateway {
        StripeGateway::new("sk_test_parcel", server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_create_intent_returns_client_secret() {
        let server = stripe_server().await;
        let secret = gateway_for(&server).create_intent(1000).await.unwrap();
        assert_eq!(secret, "pi_123_secret_abc");
    }

    #[tokio::test]
    async fn test_rejected_amounts_surface_provider_message() {
        let server = stripe_server().await;
        let gateway = gateway_for(&server);

        for amount in [0, -5] {
            match gateway.create_intent(amount).await {
                Err(AppError::Gateway(msg)) => {
                    assert_eq!(msg, "This value must be greater than or equal to 1.")
                }
                other => panic!("expected gateway error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let gateway = StripeGateway::new("sk_test_parcel", "http://127.0.0.1:1").unwrap();
        assert!(matches!(gateway.create_intent(1000).await, Err(AppError::Gateway(_))));
    }

    #[tokio::test]
    async fn test_missing_client_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "pi_1" })))
            .mount(&server)
            .await;
        assert!(gateway_for(&server).create_intent(1000).await.is_err());
    }
}
