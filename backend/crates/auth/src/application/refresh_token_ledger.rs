//! Refresh Token Ledger
//!
//! Access tokens are stateless and never revoked individually, so every way
//! of ending a session goes through this ledger. It keeps at most one refresh
//! token per user: a new login replaces all earlier tokens.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::{AuthConfig, ConfigError};
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthFailureReason, AuthResult, EntityType};

/// Refresh token ledger
pub struct RefreshTokenLedger<U, R>
where
    U: UserRepository,
    R: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<U, R> RefreshTokenLedger<U, R>
where
    U: UserRepository,
    R: RefreshTokenRepository,
{
    /// Fails if `config` does not pass [`AuthConfig::validate`]
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<R>,
        config: Arc<AuthConfig>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            user_repo,
            token_repo,
            config,
        })
    }

    /// Record `token` as the user's only refresh token
    ///
    /// Callers must have authenticated the user already; existence is not
    /// checked here.
    pub async fn create_refresh_token(
        &self,
        user_id: &UserId,
        token: impl Into<String>,
    ) -> AuthResult<RefreshToken> {
        let refresh_token =
            RefreshToken::new(*user_id, token.into(), Utc::now(), self.config.refresh_ttl()?);

        let replaced = self.token_repo.replace_for_user(&refresh_token).await?;

        tracing::info!(
            user_id = %user_id,
            refresh_token_id = %refresh_token.refresh_token_id,
            replaced = replaced,
            "Refresh token created"
        );

        Ok(refresh_token)
    }

    /// Mint a random opaque token and record it
    pub async fn issue_refresh_token(&self, user_id: &UserId) -> AuthResult<RefreshToken> {
        let token = platform::crypto::random_token(self.config.refresh_token_bytes);
        self.create_refresh_token(user_id, token).await
    }

    /// Return the token if it exists, has not expired and is not revoked
    pub async fn validate_refresh_token(&self, token: &str) -> AuthResult<RefreshToken> {
        let refresh_token = self
            .token_repo
            .find_by_token(token)
            .await?
            .ok_or(AuthError::AuthenticationFailure(AuthFailureReason::Invalid))?;

        refresh_token.ensure_usable_at(Utc::now())?;
        Ok(refresh_token)
    }

    /// Revoke one token. Revoking an already revoked token succeeds.
    pub async fn revoke_refresh_token(&self, token: &str) -> AuthResult<()> {
        let mut refresh_token = self
            .token_repo
            .find_by_token(token)
            .await?
            .ok_or(AuthError::AuthenticationFailure(AuthFailureReason::Invalid))?;

        if !refresh_token.revoke() {
            tracing::debug!(
                refresh_token_id = %refresh_token.refresh_token_id,
                "Refresh token already revoked"
            );
            return Ok(());
        }

        self.token_repo.update(&refresh_token).await?;

        tracing::info!(
            user_id = %refresh_token.user_id,
            refresh_token_id = %refresh_token.refresh_token_id,
            "Refresh token revoked"
        );
        Ok(())
    }

    /// Delete every token of the user (logout everywhere)
    pub async fn revoke_all_refresh_tokens(&self, user_id: &UserId) -> AuthResult<u64> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found(EntityType::User, user_id))?;

        let deleted = self.token_repo.delete_by_user_id(user_id).await?;

        tracing::info!(user_id = %user_id, deleted = deleted, "All refresh tokens revoked");
        Ok(deleted)
    }

    /// Delete expired tokens. Meant to be run by the embedding app, e.g. at startup.
    pub async fn purge_expired(&self) -> AuthResult<u64> {
        let deleted = self.token_repo.delete_expired(Utc::now()).await?;

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired refresh tokens");
        Ok(deleted)
    }
}
