//! Auth Error Types
//!
//! Auth-core failures, one variant per failure reason. They integrate with
//! the shared `kernel::error::AppError` so the request boundary can map them
//! to responses without knowing the auth domain.

use derive_more::Display;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Entity named by [`AuthError::EntityNotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EntityType {
    #[display("user")]
    User,
    #[display("otp")]
    Otp,
    #[display("refresh token")]
    RefreshToken,
    #[display("permission")]
    Permission,
}

/// Why a presented credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuthFailureReason {
    /// No matching credential
    #[display("invalid")]
    Invalid,
    /// Past its expiry time
    #[display("expired")]
    Expired,
    /// Explicitly revoked
    #[display("revoked")]
    Revoked,
    /// The factor is not enabled for the account
    #[display("disabled")]
    Disabled,
}

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    EntityNotFound { entity: EntityType, id: String },

    /// OTP validity window has closed
    #[error("One-time password expired")]
    OtpExpired,

    /// OTP code does not match (or was already used)
    #[error("Invalid one-time password")]
    OtpInvalid,

    /// Credential rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(AuthFailureReason),

    /// Access token subject is gone or inactive
    #[error("Unauthorized")]
    Unauthorized,

    /// Permission name already held by another permission
    #[error("Permission name already exists: {0}")]
    PermissionNameTaken(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn not_found(entity: EntityType, id: impl ToString) -> Self {
        AuthError::EntityNotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::EntityNotFound { .. } => ErrorKind::NotFound,
            AuthError::OtpExpired => ErrorKind::Gone,
            AuthError::OtpInvalid
            | AuthError::AuthenticationFailure(_)
            | AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::PermissionNameTaken(_) => ErrorKind::Conflict,
            AuthError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => {
                ErrorKind::ServiceUnavailable
            }
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError, logging at a level matching the failure
    ///
    /// Store and internal details stay in the log; the message handed to the
    /// boundary is generic for those.
    pub fn to_app_error(&self) -> AppError {
        self.log();
        match self {
            AuthError::Database(_) => AppError::new(self.kind(), "Database error"),
            AuthError::Internal(_) => AppError::internal("Internal error"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::OtpInvalid => {
                tracing::warn!("Invalid one-time password attempt");
            }
            AuthError::AuthenticationFailure(reason) => {
                tracing::warn!(reason = %reason, "Credential rejected");
            }
            AuthError::Unauthorized => {
                tracing::warn!("Access token subject rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}
