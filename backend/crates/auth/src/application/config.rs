//! Application Configuration
//!
//! Built once at startup and shared as `Arc<AuthConfig>`; never reloaded.

use std::time::Duration;

use thiserror::Error;

use crate::domain::value_object::totp_secret::TotpPolicy;
use crate::error::{AuthError, AuthResult};

const ENV_OTP_EXPIRATION_MINUTES: &str = "AUTH_OTP_EXPIRATION_MINUTES";
const ENV_OTP_STEP_SECONDS: &str = "AUTH_OTP_STEP_SECONDS";
const ENV_OTP_DIGITS: &str = "AUTH_OTP_DIGITS";
const ENV_REFRESH_TOKEN_DAYS: &str = "AUTH_REFRESH_TOKEN_DAYS";
const ENV_TOTP_ISSUER: &str = "AUTH_TOTP_ISSUER";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an unparsable value: {value:?}")]
    Unparsable { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OTP challenge lifetime (5 minutes)
    pub otp_expiration: Duration,
    /// TOTP time step in seconds (30)
    pub otp_step_secs: u64,
    /// TOTP code length (6)
    pub otp_digits: usize,
    /// Refresh token lifetime (7 days)
    pub refresh_token_ttl: Duration,
    /// Issuer label shown in authenticator apps
    pub totp_issuer: String,
    /// Random bytes in a server-minted refresh token
    pub refresh_token_bytes: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            otp_expiration: Duration::from_secs(5 * 60),
            otp_step_secs: 30,
            otp_digits: 6,
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            totp_issuer: "authcore".to_string(),
            refresh_token_bytes: 32,
        }
    }
}

impl AuthConfig {
    /// Load from `AUTH_*` environment variables, defaulting what is unset
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let parse = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(key)
                .map(|value| {
                    value.trim().parse::<u64>().map_err(|_| ConfigError::Unparsable {
                        key,
                        value: value.clone(),
                    })
                })
                .transpose()
        };

        let config = Self {
            otp_expiration: parse(ENV_OTP_EXPIRATION_MINUTES)?
                .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
                .unwrap_or(defaults.otp_expiration),
            otp_step_secs: parse(ENV_OTP_STEP_SECONDS)?.unwrap_or(defaults.otp_step_secs),
            otp_digits: parse(ENV_OTP_DIGITS)?
                .map(|digits| digits as usize)
                .unwrap_or(defaults.otp_digits),
            refresh_token_ttl: parse(ENV_REFRESH_TOKEN_DAYS)?
                .map(|days| Duration::from_secs(days.saturating_mul(24 * 3600)))
                .unwrap_or(defaults.refresh_token_ttl),
            totp_issuer: lookup(ENV_TOTP_ISSUER).unwrap_or(defaults.totp_issuer),
            refresh_token_bytes: defaults.refresh_token_bytes,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values authenticator apps or the token store cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.otp_expiration.is_zero() {
            return Err(ConfigError::Invalid("OTP expiration must be positive"));
        }
        if self.otp_step_secs == 0 {
            return Err(ConfigError::Invalid("OTP step must be positive"));
        }
        if !(6..=8).contains(&self.otp_digits) {
            return Err(ConfigError::Invalid("OTP digits must be between 6 and 8"));
        }
        if self.refresh_token_ttl.is_zero() {
            return Err(ConfigError::Invalid("refresh token lifetime must be positive"));
        }
        if self.totp_issuer.is_empty() || self.totp_issuer.contains(':') {
            return Err(ConfigError::Invalid(
                "TOTP issuer must be non-empty and must not contain ':'",
            ));
        }
        if self.refresh_token_bytes < 16 {
            return Err(ConfigError::Invalid("refresh tokens need at least 16 random bytes"));
        }
        Ok(())
    }

    pub fn totp_policy(&self) -> TotpPolicy {
        TotpPolicy {
            digits: self.otp_digits,
            step_secs: self.otp_step_secs,
        }
    }

    pub fn otp_ttl(&self) -> AuthResult<chrono::Duration> {
        chrono::Duration::from_std(self.otp_expiration)
            .map_err(|e| AuthError::Internal(format!("Invalid OTP expiration: {e}")))
    }

    pub fn refresh_ttl(&self) -> AuthResult<chrono::Duration> {
        chrono::Duration::from_std(self.refresh_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid refresh token TTL: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.otp_expiration, Duration::from_secs(300));
        assert_eq!(config.otp_step_secs, 30);
        assert_eq!(config.otp_digits, 6);
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(604_800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = AuthConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.otp_expiration, AuthConfig::default().otp_expiration);
        assert_eq!(config.totp_issuer, "authcore");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = AuthConfig::from_lookup(lookup(&[
            ("AUTH_OTP_EXPIRATION_MINUTES", "10"),
            ("AUTH_OTP_STEP_SECONDS", "60"),
            ("AUTH_OTP_DIGITS", "8"),
            ("AUTH_REFRESH_TOKEN_DAYS", "30"),
            ("AUTH_TOTP_ISSUER", "Example Corp"),
        ]))
        .unwrap();

        assert_eq!(config.otp_expiration, Duration::from_secs(600));
        assert_eq!(config.otp_step_secs, 60);
        assert_eq!(config.otp_digits, 8);
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(30 * 86_400));
        assert_eq!(config.totp_issuer, "Example Corp");
        assert_eq!(
            config.totp_policy(),
            TotpPolicy {
                digits: 8,
                step_secs: 60
            }
        );
    }

    #[test]
    fn test_from_lookup_unparsable() {
        let err = AuthConfig::from_lookup(lookup(&[("AUTH_OTP_DIGITS", "six")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Unparsable {
                key: "AUTH_OTP_DIGITS",
                value: "six".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            AuthConfig {
                otp_digits: 4,
                ..Default::default()
            },
            AuthConfig {
                otp_step_secs: 0,
                ..Default::default()
            },
            AuthConfig {
                otp_expiration: Duration::ZERO,
                ..Default::default()
            },
            AuthConfig {
                refresh_token_ttl: Duration::ZERO,
                ..Default::default()
            },
            AuthConfig {
                totp_issuer: "a:b".to_string(),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_chrono_durations() {
        let config = AuthConfig::default();
        assert_eq!(config.otp_ttl().unwrap(), chrono::Duration::minutes(5));
        assert_eq!(config.refresh_ttl().unwrap(), chrono::Duration::days(7));
    }
}
