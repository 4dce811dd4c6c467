//! Refresh Token Entity
//!
//! Long-lived opaque credential used to mint access tokens. At most one
//! exists per user; issuing a new one replaces every earlier one.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{RefreshTokenId, UserId};
use crate::error::{AuthError, AuthFailureReason, AuthResult};

/// Refresh token entity
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub refresh_token_id: RefreshTokenId,
    pub user_id: UserId,
    /// Opaque, globally unique token value
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(user_id: UserId, token: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            refresh_token_id: RefreshTokenId::new(),
            user_id,
            token,
            expires_at: now + ttl,
            revoked: false,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Reject the token if it has expired or been revoked (checked in that order)
    pub fn ensure_usable_at(&self, now: DateTime<Utc>) -> AuthResult<()> {
        if self.is_expired_at(now) {
            return Err(AuthError::AuthenticationFailure(AuthFailureReason::Expired));
        }
        if self.revoked {
            return Err(AuthError::AuthenticationFailure(AuthFailureReason::Revoked));
        }
        Ok(())
    }

    /// Revoke the token. Returns `false` if it was already revoked.
    pub fn revoke(&mut self) -> bool {
        !std::mem::replace(&mut self.revoked, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(now: DateTime<Utc>) -> RefreshToken {
        RefreshToken::new(UserId::new(), "t1".into(), now, Duration::days(7))
    }

    #[test]
    fn test_usable_until_expiry() {
        let now = Utc::now();
        let token = token(now);
        assert!(token.ensure_usable_at(now).is_ok());
        assert!(token.ensure_usable_at(now + Duration::days(7)).is_ok());
        assert!(matches!(
            token.ensure_usable_at(now + Duration::days(7) + Duration::seconds(1)),
            Err(AuthError::AuthenticationFailure(AuthFailureReason::Expired))
        ));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let now = Utc::now();
        let mut token = token(now);

        assert!(token.revoke());
        assert!(token.revoked);
        assert!(!token.revoke());
        assert!(token.revoked);

        assert!(matches!(
            token.ensure_usable_at(now),
            Err(AuthError::AuthenticationFailure(AuthFailureReason::Revoked))
        ));
    }

    #[test]
    fn test_expiry_reported_before_revocation() {
        let now = Utc::now();
        let mut token = token(now);
        token.revoke();

        assert!(matches!(
            token.ensure_usable_at(now + Duration::days(8)),
            Err(AuthError::AuthenticationFailure(AuthFailureReason::Expired))
        ));
    }
}
