//! Own-record restriction, evaluated after [`RequireRoles`](crate::RequireRoles).
//!
//! A principal holding a bypass role (professor, admin) may act on any record.
//! A principal holding a restricted role (student) may only act on the record
//! whose path parameter equals its own subject id.
//!
//! Must be registered on a resource (not a scope) so the path parameter is
//! already matched when the guard runs, and inside `RequireRoles`:
//!
//! ```rust,ignore
//! web::resource("/{student_id}")
//!     .wrap(OwnershipGuard::new("student_id"))
//!     .wrap(RequireRoles::new(verifier, [Role::Student, Role::Professor]))
//!     .route(web::get().to(get_student))
//! ```

use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use crypto_core::jwt::{Principal, Role, RoleSet};
use tracing::warn;

use crate::correlation_id::CorrelationId;
use crate::error::AuthzError;

/// Which roles skip the check and which are held to their own records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipPolicy {
    pub bypass: RoleSet,
    pub restricted: RoleSet,
}

impl Default for OwnershipPolicy {
    fn default() -> Self {
        Self {
            bypass: RoleSet::from([Role::Professor, Role::Admin]),
            restricted: RoleSet::from([Role::Student]),
        }
    }
}

/// Decide whether `principal` may act on the record identified by `raw_param`.
///
/// An absent or non-numeric parameter never matches a subject id.
pub fn check_ownership(
    principal: &Principal,
    raw_param: Option<&str>,
    policy: &OwnershipPolicy,
) -> Result<(), AuthzError> {
    if principal.has_any_role(&policy.bypass) {
        return Ok(());
    }

    if principal.has_any_role(&policy.restricted) {
        let owns = raw_param
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .is_some_and(|resource_id| principal.is_owner(resource_id));
        if !owns {
            return Err(AuthzError::NotOwner);
        }
    }

    Ok(())
}

/// Ownership middleware factory.
#[derive(Clone)]
pub struct OwnershipGuard {
    param: Rc<str>,
    policy: Rc<OwnershipPolicy>,
}

impl OwnershipGuard {
    pub fn new(param: &str) -> Self {
        Self::with_policy(param, OwnershipPolicy::default())
    }

    pub fn with_policy(param: &str, policy: OwnershipPolicy) -> Self {
        Self {
            param: Rc::from(param),
            policy: Rc::new(policy),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for OwnershipGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Transform = OwnershipGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(OwnershipGuardService {
            service: Rc::new(service),
            param: self.param.clone(),
            policy: self.policy.clone(),
        }))
    }
}

pub struct OwnershipGuardService<S> {
    service: Rc<S>,
    param: Rc<str>,
    policy: Rc<OwnershipPolicy>,
}

impl<S, B> Service<ServiceRequest> for OwnershipGuardService<S>
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
        let principal = req.extensions().get::<Principal>().cloned();
        let outcome = match principal {
            None => Err(AuthzError::Unauthenticated),
            Some(principal) => {
                let raw = req.match_info().get(&self.param);
                check_ownership(&principal, raw, &self.policy).map_err(|err| {
                    warn!(
                        subject_id = principal.id,
                        param = %self.param,
                        value = raw.unwrap_or(""),
                        "ownership check failed"
                    );
                    err
                })
            }
        };

        match outcome {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                let correlation_id = req.extensions().get::<CorrelationId>().map(|c| c.0.clone());
                let response = err.response_with(correlation_id);
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: i64, roles: impl Into<RoleSet>) -> Principal {
        Principal {
            id,
            roles: roles.into(),
        }
    }

    #[test]
    fn test_student_owns_own_record() {
        let policy = OwnershipPolicy::default();
        let student = principal(7, [Role::Student]);

        assert!(check_ownership(&student, Some("7"), &policy).is_ok());
        assert!(matches!(
            check_ownership(&student, Some("8"), &policy),
            Err(AuthzError::NotOwner)
        ));
    }

    #[test]
    fn test_bypass_roles_see_everything() {
        let policy = OwnershipPolicy::default();

        assert!(check_ownership(&principal(1, [Role::Professor]), Some("99"), &policy).is_ok());
        assert!(check_ownership(&principal(1, [Role::Admin]), Some("99"), &policy).is_ok());
        // Holding both: the elevated role wins.
        assert!(
            check_ownership(&principal(1, [Role::Student, Role::Professor]), Some("99"), &policy)
                .is_ok()
        );
    }

    #[test]
    fn test_unparsable_parameter_is_a_mismatch() {
        let policy = OwnershipPolicy::default();
        let student = principal(7, [Role::Student]);

        for raw in [Some("seven"), Some(""), Some("7.0"), None] {
            assert!(check_ownership(&student, raw, &policy).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = OwnershipPolicy {
            bypass: RoleSet::from([Role::Admin]),
            restricted: RoleSet::from([Role::Professor]),
        };

        assert!(check_ownership(&principal(3, [Role::Professor]), Some("3"), &policy).is_ok());
        assert!(check_ownership(&principal(3, [Role::Professor]), Some("4"), &policy).is_err());
        assert!(check_ownership(&principal(3, [Role::Admin]), Some("4"), &policy).is_ok());
    }
}
