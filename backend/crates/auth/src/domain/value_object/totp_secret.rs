//! TOTP Secret Value Object
//!
//! Wraps a base32 TOTP secret. Both the ephemeral OTP challenges and the
//! persistent 2FA enrollment use this type, so they share one verification
//! algorithm: RFC 6238 over HMAC-SHA1, checked against the current step and
//! one step either side, compared in constant time.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use totp_rs::{Algorithm, Secret, TOTP};

/// Steps accepted on each side of the current one
const TOTP_SKEW: u8 = 1;

/// Account label used when no human-facing label is needed
const INTERNAL_ACCOUNT: &str = "otp";

/// Code shape and time step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotpPolicy {
    /// Code length (6..=8)
    pub digits: usize,
    /// Time step in seconds
    pub step_secs: u64,
}

impl Default for TotpPolicy {
    fn default() -> Self {
        Self {
            digits: 6,
            step_secs: 30,
        }
    }
}

/// Authenticator enrollment payload
#[derive(Debug, Clone)]
pub struct Provisioning {
    /// `otpauth://totp/<issuer>:<account>?secret=...&issuer=<issuer>`
    pub otpauth_url: String,
    /// QR code of the URL as base64-encoded PNG
    pub qr_code_base64: String,
}

/// TOTP Secret for one-time passwords and two-factor authentication
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpSecret {
    /// Base32-encoded secret
    secret_base32: String,
}

impl TotpSecret {
    /// Generate a new random 160-bit secret from the OS CSPRNG
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        Self {
            secret_base32: secret.to_encoded().to_string(),
        }
    }

    /// Create from a base32-encoded string (from database)
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_str = secret.into();
        Secret::Encoded(secret_str.clone())
            .to_bytes()
            .map_err(|e| AppError::bad_request(format!("Invalid TOTP secret: {}", e)))?;

        Ok(Self {
            secret_base32: secret_str,
        })
    }

    /// Get the base32-encoded secret for storage
    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    fn to_totp(
        &self,
        policy: &TotpPolicy,
        issuer: Option<&str>,
        account_name: &str,
    ) -> AppResult<TOTP> {
        let secret = Secret::Encoded(self.secret_base32.clone());

        TOTP::new(
            Algorithm::SHA1,
            policy.digits,
            TOTP_SKEW,
            policy.step_secs,
            secret
                .to_bytes()
                .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?,
            issuer.map(str::to_string),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Code for the step containing `unix_time`
    pub fn code_at(&self, policy: &TotpPolicy, unix_time: u64) -> AppResult<String> {
        let totp = self.to_totp(policy, None, INTERNAL_ACCOUNT)?;
        Ok(totp.generate(unix_time))
    }

    /// Check `code` against the step containing `unix_time` and its neighbours
    ///
    /// `unix_time` must be at least one step past the epoch.
    pub fn matches_at(&self, policy: &TotpPolicy, code: &str, unix_time: u64) -> AppResult<bool> {
        let totp = self.to_totp(policy, None, INTERNAL_ACCOUNT)?;
        Ok(totp.check(code, unix_time))
    }

    /// Build the otpauth URL and its QR code for authenticator apps
    pub fn provisioning(
        &self,
        policy: &TotpPolicy,
        issuer: &str,
        account_name: &str,
    ) -> AppResult<Provisioning> {
        let totp = self.to_totp(policy, Some(issuer), account_name)?;
        let qr_code_base64 = totp
            .get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to generate QR code: {}", e)))?;

        Ok(Provisioning {
            otpauth_url: totp.get_url(),
            qr_code_base64,
        })
    }
}

impl std::fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TotpSecret(***)")
    }
}
