// ==================== IDENTITY VERIFICATION ====================
// Verifies Firebase ID tokens (RS256) against the provider's published JWKS.
// Keys are cached for the max-age the provider advertises.

use crate::utils::error::AppError;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(3600);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Caller identity extracted from a verified bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AppError>;
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

struct CachedKeys {
    keys: JwkSet,
    expires_at: Instant,
    fetched_at: Instant,
}

pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    client: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            client,
            cache: RwLock::new(None),
        })
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    /// Returns the decoding key for `kid`, refreshing the key set when it is
    /// stale or does not know the kid (the provider rotates keys). Refreshes
    /// for unknown kids are limited to one per `MIN_REFRESH_INTERVAL`.
    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AppError> {
        if let Some(key) = Self::cached_key(self.cache.read().await.as_ref(), kid) {
            return key;
        }

        // one refresh at a time; late arrivals reuse its result
        let mut cache = self.cache.write().await;
        if let Some(key) = Self::cached_key(cache.as_ref(), kid) {
            return key;
        }

        let (keys, ttl) = self.fetch_keys().await?;
        let now = Instant::now();
        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|e| AppError::Unauthorized(format!("Invalid signing key: {}", e)))?;

        *cache = Some(CachedKeys {
            keys,
            expires_at: now + ttl,
            fetched_at: now,
        });

        key.ok_or_else(|| AppError::Unauthorized("Unknown signing key".to_string()))
    }

    /// `None` when the cache must be refreshed
    fn cached_key(cached: Option<&CachedKeys>, kid: &str) -> Option<Result<DecodingKey, AppError>> {
        let cached = cached?;
        if cached.expires_at <= Instant::now() {
            return None;
        }

        match cached.keys.find(kid) {
            Some(jwk) => Some(
                DecodingKey::from_jwk(jwk)
                    .map_err(|e| AppError::Unauthorized(format!("Invalid signing key: {}", e))),
            ),
            None if cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL => {
                log::debug!("🔑 Unknown key id {}, key set refreshed recently", kid);
                Some(Err(AppError::Unauthorized("Unknown signing key".to_string())))
            }
            None => None,
        }
    }

    async fn fetch_keys(&self) -> Result<(JwkSet, Duration), AppError> {
        log::debug!("🔑 Fetching identity provider keys from {}", self.jwks_url);

        let response = self
            .client
            .get(&self.jwks_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Failed to fetch identity provider keys: {}", e);
                AppError::Unauthorized("Unable to verify token".to_string())
            })?;

        if !response.status().is_success() {
            log::error!("❌ Identity provider keys endpoint returned {}", response.status());
            return Err(AppError::Unauthorized("Unable to verify token".to_string()));
        }

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_KEYS_TTL);

        let keys: JwkSet = response.json().await.map_err(|e| {
            log::error!("❌ Failed to parse identity provider keys: {}", e);
            AppError::Unauthorized("Unable to verify token".to_string())
        })?;

        Ok((keys, ttl))
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized("Invalid token algorithm".to_string()));
        }
        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Token has no key id".to_string()))?;

        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);

        let claims = decode::<FirebaseClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if claims.sub.is_empty() {
            return Err(AppError::Unauthorized("Invalid token: empty subject".to_string()));
        }

        Ok(Identity {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
        })
    }
}

/// `max-age` directive of a Cache-Control header value
fn max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) const PROJECT: &str = "parcel-app";
    const KID: &str = "test-key-1";
    const PRIVATE_KEY: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/identity_rsa.pem"));
    const JWKS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/identity_jwks.json"));

    pub(crate) fn sign(claims: serde_json::Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    pub(crate) fn claims_for(email: &str) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        serde_json::json!({
            "iss": format!("https://securetoken.google.com/{}", PROJECT),
            "aud": PROJECT,
            "sub": "uid-123",
            "email": email,
            "email_verified": true,
            "iat": now - 10,
            "exp": now + 3600,
        })
    }

    pub(crate) fn valid_token(email: &str) -> String {
        sign(claims_for(email), KID)
    }

    pub(crate) async fn jwks_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "public, max-age=600, must-revalidate")
                    .set_body_raw(JWKS, "application/json"),
            )
            .mount(&server)
            .await;
        server
    }

    pub(crate) fn verifier_for(server: &MockServer) -> FirebaseVerifier {
        FirebaseVerifier::new(PROJECT, format!("{}/jwks", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token() {
        let server = jwks_server().await;
        let verifier = verifier_for(&server);

        let identity = verifier.verify(&valid_token("a@b.com")).await.unwrap();
        assert_eq!(identity.uid, "uid-123");
        assert_eq!(identity.email.as_deref(), Some("a@b.com"));
        assert!(identity.email_verified);
    }

    #[tokio::test]
    async fn test_keys_are_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
            .expect(1)
            .mount(&server)
            .await;
        let verifier = verifier_for(&server);

        verifier.verify(&valid_token("a@b.com")).await.unwrap();
        verifier.verify(&valid_token("c@d.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_kids_do_not_refetch_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
            .expect(1)
            .mount(&server)
            .await;
        let verifier = verifier_for(&server);

        verifier.verify(&valid_token("a@b.com")).await.unwrap();
        for i in 0..20 {
            let forged = sign(claims_for("a@b.com"), &format!("bogus-{}", i));
            assert!(matches!(verifier.verify(&forged).await, Err(AppError::Unauthorized(_))));
        }
        verifier.verify(&valid_token("c@d.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_kid_on_cold_cache_fetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
            .expect(1)
            .mount(&server)
            .await;
        let verifier = verifier_for(&server);

        for i in 0..5 {
            let forged = sign(claims_for("a@b.com"), &format!("bogus-{}", i));
            assert!(verifier.verify(&forged).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_rejects_wrong_audience_and_issuer() {
        let server = jwks_server().await;
        let verifier = verifier_for(&server);

        let mut claims = claims_for("a@b.com");
        claims["aud"] = "other-project".into();
        assert!(matches!(
            verifier.verify(&sign(claims, KID)).await,
            Err(AppError::Unauthorized(_))
        ));

        let mut claims = claims_for("a@b.com");
        claims["iss"] = "https://evil.example.com".into();
        assert!(verifier.verify(&sign(claims, KID)).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_expired_unknown_kid_and_garbage() {
        let server = jwks_server().await;
        let verifier = verifier_for(&server);

        let mut claims = claims_for("a@b.com");
        let now = chrono::Utc::now().timestamp();
        claims["iat"] = (now - 7200).into();
        claims["exp"] = (now - 3600).into();
        assert!(verifier.verify(&sign(claims, KID)).await.is_err());

        assert!(verifier.verify(&sign(claims_for("a@b.com"), "rotated-away")).await.is_err());
        assert!(verifier.verify("not.a.jwt").await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_empty_subject() {
        let server = jwks_server().await;
        let verifier = verifier_for(&server);

        let mut claims = claims_for("a@b.com");
        claims["sub"] = "".into();
        assert!(verifier.verify(&sign(claims, KID)).await.is_err());
    }

    #[tokio::test]
    async fn test_provider_outage_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let verifier = verifier_for(&server);

        assert!(matches!(
            verifier.verify(&valid_token("a@b.com")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_max_age() {
        assert_eq!(
            max_age("public, max-age=19204, must-revalidate, no-transform"),
            Some(Duration::from_secs(19204))
        );
        assert_eq!(max_age("no-cache"), None);
    }
}
