use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Parcel Service API",
        version = "1.0.0",
        description = "Parcel delivery backend: parcels, user registration, card payments and delivery tracking.\n\n**Authentication:** `GET /payments` requires an identity-provider ID token as a Bearer token when identity verification is enabled."
    ),
    paths(
        // Health
        crate::api::health::root,
        crate::api::health::health_check,

        // Users
        crate::api::users::register_user,

        // Parcels
        crate::api::parcels::list_parcels,
        crate::api::parcels::get_parcel,
        crate::api::parcels::create_parcel,
        crate::api::parcels::delete_parcel,

        // Payments
        crate::api::payments::create_payment_intent,
        crate::api::payments::list_payments,
        crate::api::payments::record_payment,

        // Tracking
        crate::api::tracking::append_tracking,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::models::InsertAck,
            crate::models::DeleteAck,
            crate::models::RegisterUserRequest,
            crate::models::RegisterUserResponse,
            crate::models::CreateIntentRequest,
            crate::models::CreateIntentResponse,
            crate::models::RecordPaymentRequest,
            crate::models::RecordPaymentResponse,
            crate::models::TrackingRequest,
            crate::models::TrackingResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and health endpoints."),
        (name = "Users", description = "User registration."),
        (name = "Parcels", description = "Parcel records."),
        (name = "Payments", description = "Payment intents, payment recording and payment history."),
        (name = "Tracking", description = "Delivery status log."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Identity provider ID token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/health", "/users", "/parcels", "/parcels/{id}", "/create-payment-intent", "/payments", "/tracking"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
