//! In-Memory Repository Implementations
//!
//! Process-local store for tests and database-less embedders. Each method
//! takes the lock it needs once, so every call is atomic.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::{
    otp::Otp, permission::Permission, refresh_token::RefreshToken, user::User,
};
use crate::domain::repository::{
    OtpRepository, PermissionRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{OtpId, PermissionId, UserId};
use crate::error::{AuthError, AuthResult, EntityType};

/// In-memory auth repository
#[derive(Default)]
pub struct MemoryAuthRepository {
    users: RwLock<HashMap<UserId, User>>,
    /// Insertion order; the last entry for a user is the live challenge
    otps: RwLock<Vec<Otp>>,
    /// Keyed by token value
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
    permissions: RwLock<HashMap<PermissionId, Permission>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user; registration lives outside the auth core
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.user_id, user);
    }

    /// Number of refresh tokens held for a user
    pub async fn refresh_token_count(&self, user_id: &UserId) -> usize {
        self.refresh_tokens
            .read()
            .await
            .values()
            .filter(|t| &t.user_id == user_id)
            .count()
    }
}

fn sorted_by_name(mut permissions: Vec<Permission>) -> Vec<Permission> {
    permissions.sort_by(|a, b| a.name.cmp(&b.name));
    permissions
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for MemoryAuthRepository {
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        // Like an UPDATE with no matching row: silently a no-op
        if let Some(stored) = self.users.write().await.get_mut(&user.user_id) {
            *stored = user.clone();
        }
        Ok(())
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(stored) = self.users.write().await.get_mut(user_id) {
            stored.last_login_at = Some(at);
            stored.updated_at = at;
        }
        Ok(())
    }
}

// ============================================================================
// OTP Repository Implementation
// ============================================================================

impl OtpRepository for MemoryAuthRepository {
    async fn create(&self, otp: &Otp) -> AuthResult<()> {
        self.otps.write().await.push(otp.clone());
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Otp>> {
        Ok(self
            .otps
            .read()
            .await
            .iter()
            .rev()
            .find(|otp| &otp.user_id == user_id)
            .cloned())
    }

    async fn update(&self, otp: &Otp) -> AuthResult<()> {
        if let Some(stored) = self
            .otps
            .write()
            .await
            .iter_mut()
            .find(|stored| stored.otp_id == otp.otp_id)
        {
            *stored = otp.clone();
        }
        Ok(())
    }

    async fn mark_verified(&self, otp_id: &OtpId) -> AuthResult<bool> {
        let mut otps = self.otps.write().await;
        match otps.iter_mut().find(|otp| &otp.otp_id == otp_id) {
            Some(otp) if !otp.verified => {
                otp.mark_verified();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for MemoryAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(&token.token) {
            return Err(AuthError::Internal(
                "Refresh token value already exists".to_string(),
            ));
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.refresh_tokens.read().await.get(token).cloned())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut tokens = self.refresh_tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| &t.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn update(&self, token: &RefreshToken) -> AuthResult<()> {
        if let Some(stored) = self.refresh_tokens.write().await.get_mut(&token.token) {
            *stored = token.clone();
        }
        Ok(())
    }

    async fn replace_for_user(&self, token: &RefreshToken) -> AuthResult<u64> {
        // One write guard across delete and insert
        let mut tokens = self.refresh_tokens.write().await;
        if tokens
            .get(&token.token)
            .is_some_and(|existing| existing.user_id != token.user_id)
        {
            return Err(AuthError::Internal(
                "Refresh token value already exists".to_string(),
            ));
        }

        let before = tokens.len();
        tokens.retain(|_, t| t.user_id != token.user_id);
        let deleted = (before - tokens.len()) as u64;

        tokens.insert(token.token.clone(), token.clone());
        Ok(deleted)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut tokens = self.refresh_tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - tokens.len()) as u64)
    }
}

// ============================================================================
// Permission Repository Implementation
// ============================================================================

impl PermissionRepository for MemoryAuthRepository {
    async fn find_by_id(&self, permission_id: &PermissionId) -> AuthResult<Option<Permission>> {
        Ok(self.permissions.read().await.get(permission_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AuthResult<Option<Permission>> {
        Ok(self
            .permissions
            .read()
            .await
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn find_all(&self) -> AuthResult<Vec<Permission>> {
        Ok(sorted_by_name(
            self.permissions.read().await.values().cloned().collect(),
        ))
    }

    async fn find_by_resource(&self, resource: &str) -> AuthResult<Vec<Permission>> {
        Ok(sorted_by_name(
            self.permissions
                .read()
                .await
                .values()
                .filter(|p| p.resource == resource)
                .cloned()
                .collect(),
        ))
    }

    async fn create(&self, permission: &Permission) -> AuthResult<Permission> {
        let mut permissions = self.permissions.write().await;
        if permissions.values().any(|p| p.name == permission.name) {
            return Err(AuthError::PermissionNameTaken(permission.name.clone()));
        }
        permissions.insert(permission.permission_id, permission.clone());
        Ok(permission.clone())
    }

    async fn update(&self, permission: &Permission) -> AuthResult<Permission> {
        let mut permissions = self.permissions.write().await;
        if permissions
            .values()
            .any(|p| p.name == permission.name && p.permission_id != permission.permission_id)
        {
            return Err(AuthError::PermissionNameTaken(permission.name.clone()));
        }

        let stored = permissions
            .get_mut(&permission.permission_id)
            .ok_or_else(|| AuthError::not_found(EntityType::Permission, permission.permission_id))?;
        *stored = permission.clone();
        Ok(permission.clone())
    }

    async fn delete(&self, permission_id: &PermissionId) -> AuthResult<bool> {
        Ok(self.permissions.write().await.remove(permission_id).is_some())
    }
}
