pub mod auth;
pub mod security_headers;

pub use auth::{AuthMiddleware, AuthPolicy};
pub use security_headers::SecurityHeaders;
