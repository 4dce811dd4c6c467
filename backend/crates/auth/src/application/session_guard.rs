//! User Session Guard
//!
//! Per-request liveness check for access tokens. The token itself is
//! validated elsewhere; this re-reads the subject so that a deactivated
//! account is locked out immediately rather than at token expiry.

use std::sync::Arc;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Access-token subject liveness check
pub struct UserSessionGuard<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UserSessionGuard<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Check the raw `sub` claim of an access token
    pub async fn check_subject(&self, subject: &str) -> AuthResult<User> {
        let user_id = UserId::parse_str(subject).map_err(|_| {
            tracing::warn!(subject = %subject, "Malformed access token subject");
            AuthError::Unauthorized
        })?;
        self.check(&user_id).await
    }

    /// The subject must exist and be active
    pub async fn check(&self, user_id: &UserId) -> AuthResult<User> {
        let user = self.user_repo.find_by_id(user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "Access token subject no longer exists");
            AuthError::Unauthorized
        })?;

        if !user.is_active {
            tracing::warn!(user_id = %user_id, "Access token subject is inactive");
            return Err(AuthError::Unauthorized);
        }

        Ok(user)
    }
}
