use crate::utils::error::AppError;
use std::env;

/// Secret and restricted keys; publishable keys cannot create intents
const STRIPE_KEY_PREFIXES: &[&str] = &["sk_test_", "sk_live_", "rk_test_", "rk_live_"];

const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Whether `GET /payments` requires a verified bearer identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationMode {
    Required,
    Disabled,
}

/// Service configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
    /// Record payments inside a multi-document transaction (needs a replica set)
    pub use_transactions: bool,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub verification: VerificationMode,
    pub firebase_project_id: Option<String>,
    pub firebase_jwks_url: String,
    /// Empty means any origin
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source (the process env in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| AppError::Configuration(format!("PORT is not a valid port: {}", p)))?,
            None => 3000,
        };

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = var("DB_USER");
                let pass = var("DB_PASS");
                let db_host = var("DB_HOST");
                match (user, pass, db_host) {
                    (Some(user), Some(pass), Some(db_host)) => format!(
                        "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
                        user, pass, db_host
                    ),
                    _ => {
                        return Err(AppError::Configuration(
                            "DATABASE_URL or DB_USER/DB_PASS/DB_HOST must be set".to_string(),
                        ))
                    }
                }
            }
        };
        let database_name = var("DATABASE_NAME").unwrap_or_else(|| "parcelDB".to_string());

        let use_transactions = match var("MONGODB_TRANSACTIONS").as_deref() {
            None => true,
            Some(v) => parse_bool(v).ok_or_else(|| {
                AppError::Configuration(format!("MONGODB_TRANSACTIONS must be true/false, got {}", v))
            })?,
        };

        // PAYMETN_GATEWAY is the key's name in older .env files
        let stripe_secret_key = var("STRIPE_SECRET_KEY")
            .or_else(|| var("PAYMETN_GATEWAY"))
            .ok_or_else(|| AppError::Configuration("STRIPE_SECRET_KEY not set".to_string()))?;
        if !STRIPE_KEY_PREFIXES.iter().any(|p| stripe_secret_key.starts_with(p)) {
            return Err(AppError::Configuration(format!(
                "STRIPE_SECRET_KEY must start with one of {}",
                STRIPE_KEY_PREFIXES.join(", ")
            )));
        }
        let stripe_api_base =
            var("STRIPE_API_BASE").unwrap_or_else(|| "https://api.stripe.com".to_string());

        let verification = match var("IDENTITY_VERIFICATION").as_deref() {
            None | Some("required") => VerificationMode::Required,
            Some("disabled") => VerificationMode::Disabled,
            Some(other) => {
                return Err(AppError::Configuration(format!(
                    "IDENTITY_VERIFICATION must be 'required' or 'disabled', got {}",
                    other
                )))
            }
        };
        let firebase_project_id = var("FIREBASE_PROJECT_ID");
        if verification == VerificationMode::Required && firebase_project_id.is_none() {
            return Err(AppError::Configuration(
                "FIREBASE_PROJECT_ID must be set when IDENTITY_VERIFICATION=required".to_string(),
            ));
        }
        let firebase_jwks_url = var("FIREBASE_JWKS_URL").unwrap_or_else(|| DEFAULT_JWKS_URL.to_string());

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            database_url,
            database_name,
            use_transactions,
            stripe_secret_key,
            stripe_api_base,
            verification,
            firebase_project_id,
            firebase_jwks_url,
            cors_allowed_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
