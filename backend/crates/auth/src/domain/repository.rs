//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.
//! Each call is atomic for the records it touches; errors are surfaced to
//! the caller unchanged, with no retry.

use chrono::{DateTime, Utc};

use crate::domain::entity::{
    otp::Otp, permission::Permission, refresh_token::RefreshToken, user::User,
};
use crate::domain::value_object::{OtpId, PermissionId, UserId};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Set `last_login_at` (and `updated_at`) to `at`, leaving every other column alone
    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()>;
}

/// OTP challenge repository trait
#[trait_variant::make(OtpRepository: Send)]
pub trait LocalOtpRepository {
    /// Create a new challenge
    async fn create(&self, otp: &Otp) -> AuthResult<()>;

    /// Latest challenge issued to the user
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Otp>>;

    /// Update challenge. Verification goes through `mark_verified` instead.
    async fn update(&self, otp: &Otp) -> AuthResult<()>;

    /// Flip `verified` false -> true.
    /// Returns false if the challenge is missing or was already verified.
    async fn mark_verified(&self, otp_id: &OtpId) -> AuthResult<bool>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Insert a token. Logins go through `replace_for_user` instead.
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Find by opaque token value
    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>>;

    /// Delete every token owned by the user
    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Update token (revocation flag)
    async fn update(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Delete every token of `token.user_id` and insert `token`, as one step.
    /// Concurrent calls for the same user are serialized.
    async fn replace_for_user(&self, token: &RefreshToken) -> AuthResult<u64>;

    /// Delete tokens that expired before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Permission repository trait
#[trait_variant::make(PermissionRepository: Send)]
pub trait LocalPermissionRepository {
    async fn find_by_id(&self, permission_id: &PermissionId) -> AuthResult<Option<Permission>>;

    async fn find_by_name(&self, name: &str) -> AuthResult<Option<Permission>>;

    /// All permissions, ordered by name
    async fn find_all(&self) -> AuthResult<Vec<Permission>>;

    /// Permissions on one resource, ordered by name
    async fn find_by_resource(&self, resource: &str) -> AuthResult<Vec<Permission>>;

    /// Insert. Fails with `PermissionNameTaken` on a duplicate name.
    async fn create(&self, permission: &Permission) -> AuthResult<Permission>;

    /// Overwrite an existing permission. Fails with `EntityNotFound` if absent.
    async fn update(&self, permission: &Permission) -> AuthResult<Permission>;

    /// Returns false if nothing was deleted
    async fn delete(&self, permission_id: &PermissionId) -> AuthResult<bool>;
}
