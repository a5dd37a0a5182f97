use crate::services::identity_service::IdentityVerifier;
use crate::utils::error::AppError;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// Whether wrapped routes need a verified bearer identity
#[derive(Clone)]
pub enum AuthPolicy {
    Required(Arc<dyn IdentityVerifier>),
    Disabled,
}

/// Verifies the bearer token before the handler runs. On success the
/// `Identity` is stored in request extensions; every failure ends the request
/// with 401.
pub struct AuthMiddleware {
    policy: AuthPolicy,
}

impl AuthMiddleware {
    pub fn new(policy: AuthPolicy) -> Self {
        Self { policy }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            policy: self.policy.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    policy: AuthPolicy,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verifier = match &self.policy {
            AuthPolicy::Disabled => {
                let fut = self.service.call(req);
                return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
            }
            AuthPolicy::Required(verifier) => verifier.clone(),
        };

        let header = req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok());
        let token = match bearer_token(header).map(str::to_string) {
            Ok(token) => token,
            Err(e) => {
                log::warn!("🔒 {} {} - {}", req.method(), req.path(), e);
                let response = req.into_response(e.error_response()).map_into_right_body();
                return Box::pin(async move { Ok(response) });
            }
        };

        let service = self.service.clone();
        Box::pin(async move {
            match verifier.verify(&token).await {
                Ok(identity) => {
                    log::debug!("🔓 Verified identity {}", identity.uid);
                    req.extensions_mut().insert(identity);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(e) => {
                    log::warn!("🔒 {} {} - {}", req.method(), req.path(), e);
                    Ok(req.into_response(e.error_response()).map_into_right_body())
                }
            }
        })
    }
}

/// Token part of an `Authorization: Bearer <token>` header
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header = header.ok_or_else(|| AppError::Unauthorized("unauthorized access".to_string()))?;

    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().map(str::trim).unwrap_or_default();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::Unauthorized("unauthorized access".to_string()));
    }

    Ok(token)
}
