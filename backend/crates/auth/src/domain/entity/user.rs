//! User Entity
//!
//! The user aggregate is owned by the account service. The auth core reads
//! its liveness and 2FA state and writes the 2FA fields and `last_login_at`.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{email::Email, totp_secret::TotpSecret, UserId};

/// User entity (auth-core view)
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Email, also the authenticator account label
    pub email: Email,
    /// Whether TOTP 2FA is enabled
    pub otp_enabled: bool,
    /// Persistent TOTP secret for 2FA
    pub otp_secret: Option<TotpSecret>,
    /// Deactivated accounts fail the per-request liveness check
    pub is_active: bool,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user without 2FA
    pub fn new(email: Email) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            otp_enabled: false,
            otp_secret: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Store a 2FA secret and turn 2FA on
    pub fn enable_two_factor(&mut self, secret: TotpSecret) {
        self.otp_secret = Some(secret);
        self.otp_enabled = true;
        self.updated_at = Utc::now();
    }

    /// Clear the 2FA secret and turn 2FA off
    pub fn disable_two_factor(&mut self) {
        self.otp_secret = None;
        self.otp_enabled = false;
        self.updated_at = Utc::now();
    }

    /// The 2FA secret, only while 2FA is enabled
    pub fn two_factor_secret(&self) -> Option<&TotpSecret> {
        if self.otp_enabled {
            self.otp_secret.as_ref()
        } else {
            None
        }
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(Email::new("alice@example.com").unwrap())
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert!(user.is_active);
        assert!(!user.otp_enabled);
        assert!(user.two_factor_secret().is_none());
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_two_factor_toggle() {
        let mut user = user();
        let secret = TotpSecret::generate();

        user.enable_two_factor(secret.clone());
        assert!(user.otp_enabled);
        assert_eq!(user.two_factor_secret(), Some(&secret));

        user.disable_two_factor();
        assert!(!user.otp_enabled);
        assert!(user.otp_secret.is_none());
    }

    #[test]
    fn test_secret_hidden_while_disabled() {
        let mut user = user();
        user.otp_secret = Some(TotpSecret::generate());
        user.otp_enabled = false;
        assert!(user.two_factor_secret().is_none());
    }
}
