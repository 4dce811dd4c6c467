//! Auth (Authentication) Core
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Auth components and configuration
//! - `infra/` - PostgreSQL and in-memory repositories
//!
//! ## Components
//! - `OtpAuthority` - short-lived email/SMS one-time passwords
//! - `TwoFactorEnrollment` - authenticator-app (TOTP) 2FA lifecycle
//! - `RefreshTokenLedger` - one refresh token per user, revocation
//! - `PermissionCatalog` - RBAC permission CRUD
//! - `UserSessionGuard` - per-request subject liveness check
//!
//! ## Security Model
//! - Codes are compared in constant time
//! - An OTP challenge verifies at most once
//! - A new login atomically replaces the user's previous refresh token
//! - Deactivated users are rejected on their next request

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;


// Re-exports for convenience
pub use application::{
    AuthConfig, ConfigError, IssuedOtp, OtpAuthority, PermissionCatalog, RefreshTokenLedger,
    TwoFactorEnrollment, TwoFactorSetupOutput, UserSessionGuard,
};
pub use error::{AuthError, AuthFailureReason, AuthResult, EntityType};
pub use infra::{MemoryAuthRepository, PgAuthRepository};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}
