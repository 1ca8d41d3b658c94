//! # Actix Middleware Library
//!
//! Shared request pipeline for the campus services
//!
//! ## Modules
//! - `jwt_auth`: bearer token verification and role gate
//! - `ownership`: own-record restriction for path parameters
//! - `correlation_id`: request correlation IDs
//! - `logging`: tracing subscriber setup for the binaries
//! - `rate_limit`: per-IP rate limiting (login endpoints)
//! - `propagation`: forwarding caller credentials to downstream services

pub mod correlation_id;
pub mod error;
pub mod jwt_auth;
pub mod logging;
pub mod ownership;
pub mod propagation;
pub mod rate_limit;

pub use correlation_id::{
    get_correlation_id, CorrelationId, CorrelationIdMiddleware, CORRELATION_ID_HEADER,
};
pub use error::AuthzError;
pub use jwt_auth::{bearer_token, Authenticated, RequireRoles};
pub use logging::{init_tracing, LogFormat};
pub use ownership::{check_ownership, OwnershipGuard, OwnershipPolicy};
pub use propagation::ForwardedAuth;
pub use rate_limit::{RateLimitConfig, RateLimitMiddleware};
