//! Bearer token authentication and role gate.
//!
//! [`RequireRoles`] verifies the `Authorization: Bearer <token>` header with a
//! shared [`TokenVerifier`], checks that the principal holds at least one of
//! the allowed roles and stores the [`Principal`] in the request extensions.
//! Handlers read it back with the [`Authenticated`] extractor.
//!
//! ```rust,ignore
//! web::scope("/api/students")
//!     .wrap(RequireRoles::new(verifier.clone(), [Role::Professor, Role::Admin]))
//!     .route("", web::get().to(list_students))
//! ```

use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use crypto_core::jwt::{Principal, RoleSet, TokenVerifier};
use tracing::{debug, error, warn};

use crate::correlation_id::CorrelationId;
use crate::error::AuthzError;

/// Role gate middleware factory.
#[derive(Clone)]
pub struct RequireRoles {
    verifier: Arc<TokenVerifier>,
    allowed: Rc<RoleSet>,
}

impl RequireRoles {
    pub fn new(verifier: Arc<TokenVerifier>, allowed: impl Into<RoleSet>) -> Self {
        Self {
            verifier,
            allowed: Rc::new(allowed.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Transform = RequireRolesService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRolesService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RequireRolesService<S> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier>,
    allowed: Rc<RoleSet>,
}

impl<S, B> Service<ServiceRequest> for RequireRolesService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();
        let allowed = self.allowed.clone();

        Box::pin(async move {
            match authorize(&req, &verifier, &allowed).await {
                Ok(principal) => {
                    debug!(subject_id = principal.id, roles = %principal.roles, path = %req.path(), "request authorized");
                    req.extensions_mut().insert(principal);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    let correlation_id = req.extensions().get::<CorrelationId>().map(|c| c.0.clone());
                    let response = err.response_with(correlation_id);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

async fn authorize(
    req: &ServiceRequest,
    verifier: &TokenVerifier,
    allowed: &RoleSet,
) -> Result<Principal, AuthzError> {
    let token = bearer_token(req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok()))
        .ok_or_else(|| {
            debug!(path = %req.path(), "no bearer token");
            AuthzError::MissingToken
        })?;

    let principal = verifier.verify(token).await.map_err(|e| {
        if e.is_internal() {
            error!(path = %req.path(), error = %e, "token verification failed on our side");
        } else {
            warn!(path = %req.path(), error = %e, "token rejected");
        }
        AuthzError::from(e)
    })?;

    if !principal.has_any_role(allowed) {
        warn!(
            subject_id = principal.id,
            roles = %principal.roles,
            required = %allowed,
            path = %req.path(),
            "insufficient role"
        );
        return Err(AuthzError::Forbidden);
    }

    Ok(principal)
}

/// Token part of a `Bearer` authorization header value. The scheme is case
/// insensitive; an empty token counts as absent.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verified principal of the current request.
///
/// Only available behind [`RequireRoles`]; elsewhere extraction fails with 401.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl std::ops::Deref for Authenticated {
    type Target = Principal;

    fn deref(&self) -> &Principal {
        &self.0
    }
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Principal>() {
            Some(principal) => ready(Ok(Authenticated(principal.clone()))),
            None => ready(Err(AuthzError::Unauthenticated.into())),
        }
    }
}
