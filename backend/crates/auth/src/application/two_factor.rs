//! Two-Factor Enrollment
//!
//! Persistent TOTP secret on the user aggregate, for third-party
//! authenticator apps. Verification uses the same window check as
//! [`OtpAuthority`](super::otp_authority::OtpAuthority).

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::{AuthConfig, ConfigError};
use crate::domain::entity::{otp::unix_secs, user::User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{totp_secret::TotpSecret, UserId};
use crate::error::{AuthError, AuthFailureReason, AuthResult, EntityType};

/// 2FA setup output
pub struct TwoFactorSetupOutput {
    /// Secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
    /// QR code of the URL as base64-encoded PNG
    pub qr_code_base64: String,
}

/// 2FA enrollment use case
pub struct TwoFactorEnrollment<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> TwoFactorEnrollment<U>
where
    U: UserRepository,
{
    /// Fails if `config` does not pass [`AuthConfig::validate`]
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { user_repo, config })
    }

    async fn load_user(&self, user_id: &UserId) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found(EntityType::User, user_id))
    }

    /// Generate a new secret, enable 2FA and return the enrollment payload
    ///
    /// Replaces any secret enrolled earlier.
    pub async fn setup_two_factor_auth(&self, user_id: &UserId) -> AuthResult<TwoFactorSetupOutput> {
        let mut user = self.load_user(user_id).await?;

        let secret = TotpSecret::generate();
        let provisioning = secret.provisioning(
            &self.config.totp_policy(),
            &self.config.totp_issuer,
            user.email.as_str(),
        )?;

        user.enable_two_factor(secret.clone());
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user_id, "TOTP enabled");

        Ok(TwoFactorSetupOutput {
            secret: secret.as_base32().to_string(),
            otpauth_url: provisioning.otpauth_url,
            qr_code_base64: provisioning.qr_code_base64,
        })
    }

    /// Verify an authenticator code and record the login
    ///
    /// Only the login time is written back; a concurrent disable or
    /// re-enrollment is never overwritten.
    pub async fn verify_two_factor_token(&self, user_id: &UserId, code: &str) -> AuthResult<()> {
        let user = self.load_user(user_id).await?;

        let secret = user
            .two_factor_secret()
            .ok_or(AuthError::AuthenticationFailure(AuthFailureReason::Disabled))?;

        let valid = secret.matches_at(&self.config.totp_policy(), code, unix_secs(Utc::now()))?;
        if !valid {
            tracing::warn!(user_id = %user_id, "Invalid TOTP code");
            return Err(AuthError::OtpInvalid);
        }

        self.user_repo.record_login(user_id, Utc::now()).await?;

        tracing::info!(user_id = %user_id, "TOTP verified");
        Ok(())
    }

    /// Clear the secret and disable 2FA
    pub async fn disable_two_factor_auth(&self, user_id: &UserId) -> AuthResult<User> {
        let mut user = self.load_user(user_id).await?;

        user.disable_two_factor();
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user_id, "TOTP disabled");
        Ok(user)
    }
}
