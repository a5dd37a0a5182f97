pub mod identity_service;
pub mod parcel_service;
pub mod payment_gateway;
pub mod payment_service;
pub mod tracking_service;
pub mod user_service;

pub use identity_service::{FirebaseVerifier, Identity, IdentityVerifier};
pub use payment_gateway::{PaymentGateway, StripeGateway};
