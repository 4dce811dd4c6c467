//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod otp_authority;
pub mod permission_catalog;
pub mod refresh_token_ledger;
pub mod session_guard;
pub mod two_factor;

// Re-exports
pub use config::{AuthConfig, ConfigError};
pub use otp_authority::{IssuedOtp, OtpAuthority};
pub use permission_catalog::PermissionCatalog;
pub use refresh_token_ledger::RefreshTokenLedger;
pub use session_guard::UserSessionGuard;
pub use two_factor::{TwoFactorEnrollment, TwoFactorSetupOutput};
