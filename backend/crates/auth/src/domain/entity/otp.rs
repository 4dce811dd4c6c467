//! OTP Entity
//!
//! A short-lived one-time-password challenge bound to a user. The secret is
//! fixed at creation; `verified` flips false -> true at most once.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    totp_secret::{TotpPolicy, TotpSecret},
    OtpId, UserId,
};
use crate::error::{AuthError, AuthResult};

/// One-time-password challenge
#[derive(Debug, Clone)]
pub struct Otp {
    pub otp_id: OtpId,
    pub user_id: UserId,
    /// Server-side only; never returned to callers
    pub secret: TotpSecret,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}

impl Otp {
    /// Create a new challenge issued at `now`
    ///
    /// TTL is provided by the application layer (config).
    pub fn new(user_id: UserId, secret: TotpSecret, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            otp_id: OtpId::new(),
            user_id,
            secret,
            created_at: now,
            expires_at: now + ttl,
            verified: false,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Code for the step containing `now`
    pub fn code_at(&self, policy: &TotpPolicy, now: DateTime<Utc>) -> AuthResult<String> {
        Ok(self.secret.code_at(policy, unix_secs(now))?)
    }

    /// Check a submitted code at `now`
    ///
    /// Expiry wins over code correctness. An already verified challenge is
    /// treated like a wrong code.
    pub fn check_at(&self, code: &str, policy: &TotpPolicy, now: DateTime<Utc>) -> AuthResult<()> {
        if self.is_expired_at(now) {
            return Err(AuthError::OtpExpired);
        }

        let matched = self.secret.matches_at(policy, code, unix_secs(now))?;
        if !matched || self.verified {
            return Err(AuthError::OtpInvalid);
        }

        Ok(())
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
    }
}

/// Seconds since the Unix epoch, clamped at zero
pub(crate) fn unix_secs(time: DateTime<Utc>) -> u64 {
    u64::try_from(time.timestamp()).unwrap_or(0)
}
