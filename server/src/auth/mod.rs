//! Authentication and per-request security scope.
//!
//! # Pre-conditions
//! - The server is configured with exactly one token verification key.
//!
//! # Post-conditions
//! - Every authenticated request yields a `SecurityContext` with a user id.
//!
//! # Invariants
//! - Verification configuration is immutable once loaded.

pub mod context;
pub mod jwt;
pub mod jwt_config;

pub use context::{
    AgeRestriction, AgeRestrictionMode, ContentRestrictions, Principal, SecurityContext,
};
pub use jwt::{Claims, JwtError, verify_token};
pub use jwt_config::{JwtConfig, JwtConfigError};
