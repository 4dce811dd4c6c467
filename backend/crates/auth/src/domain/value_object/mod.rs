//! Value Object Module

pub mod email;
pub mod totp_secret;

pub use kernel::id::{OtpId, PermissionId, RefreshTokenId, UserId};
