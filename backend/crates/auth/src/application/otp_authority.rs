//! OTP Authority
//!
//! Issues and verifies short-lived one-time passwords bound to a user. Each
//! challenge gets its own secret, which stays on the server; only the code is
//! handed out (for delivery over email, SMS, ...).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::{AuthConfig, ConfigError};
use crate::domain::entity::otp::Otp;
use crate::domain::repository::{OtpRepository, UserRepository};
use crate::domain::value_object::{totp_secret::TotpSecret, UserId};
use crate::error::{AuthError, AuthResult, EntityType};

/// Issued OTP output
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    /// Code to deliver to the user
    pub code: String,
    /// After this instant the code is rejected as expired
    pub expires_at: DateTime<Utc>,
}

/// OTP issuance and verification
pub struct OtpAuthority<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    user_repo: Arc<U>,
    otp_repo: Arc<O>,
    config: Arc<AuthConfig>,
}

impl<U, O> OtpAuthority<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    /// Fails if `config` does not pass [`AuthConfig::validate`]
    pub fn new(
        user_repo: Arc<U>,
        otp_repo: Arc<O>,
        config: Arc<AuthConfig>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            user_repo,
            otp_repo,
            config,
        })
    }

    /// Issue a fresh challenge for the user
    ///
    /// A later challenge supersedes an earlier unexpired one.
    pub async fn generate_otp(&self, user_id: &UserId) -> AuthResult<IssuedOtp> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found(EntityType::User, user_id))?;

        let now = Utc::now();
        let otp = Otp::new(*user_id, TotpSecret::generate(), now, self.config.otp_ttl()?);
        let code = otp.code_at(&self.config.totp_policy(), now)?;

        self.otp_repo.create(&otp).await?;

        tracing::info!(
            user_id = %user_id,
            otp_id = %otp.otp_id,
            expires_at = %otp.expires_at,
            "OTP issued"
        );

        Ok(IssuedOtp {
            code,
            expires_at: otp.expires_at,
        })
    }

    /// Verify a submitted code against the user's latest challenge
    ///
    /// Succeeds at most once per challenge.
    pub async fn verify_otp(&self, user_id: &UserId, code: &str) -> AuthResult<()> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found(EntityType::User, user_id))?;

        let otp = self
            .otp_repo
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found(EntityType::Otp, user_id))?;

        if let Err(e) = otp.check_at(code, &self.config.totp_policy(), Utc::now()) {
            tracing::warn!(user_id = %user_id, otp_id = %otp.otp_id, error = %e, "OTP rejected");
            return Err(e);
        }

        // Lost a race with a concurrent verification of the same code
        if !self.otp_repo.mark_verified(&otp.otp_id).await? {
            tracing::warn!(user_id = %user_id, otp_id = %otp.otp_id, "OTP already used");
            return Err(AuthError::OtpInvalid);
        }

        tracing::info!(user_id = %user_id, otp_id = %otp.otp_id, "OTP verified");
        Ok(())
    }
}
