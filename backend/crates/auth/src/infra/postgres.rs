//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    otp::Otp, permission::Permission, refresh_token::RefreshToken, user::User,
};
use crate::domain::repository::{
    OtpRepository, PermissionRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{
    OtpId, PermissionId, RefreshTokenId, UserId, email::Email, totp_secret::TotpSecret,
};
use crate::error::{AuthError, AuthResult, EntityType};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_permission_write_error(e: sqlx::Error, name: &str) -> AuthError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AuthError::PermissionNameTaken(name.to_string())
        }
        _ => AuthError::Database(e),
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                otp_enabled,
                otp_secret,
                is_active,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                otp_enabled = $3,
                otp_secret = $4,
                is_active = $5,
                last_login_at = $6,
                updated_at = $7
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.otp_enabled)
        .bind(user.otp_secret.as_ref().map(|s| s.as_base32()))
        .bind(user.is_active)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// OTP Repository Implementation
// ============================================================================

impl OtpRepository for PgAuthRepository {
    async fn create(&self, otp: &Otp) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO otps (
                otp_id,
                user_id,
                secret,
                created_at,
                expires_at,
                verified
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(otp.otp_id.as_uuid())
        .bind(otp.user_id.as_uuid())
        .bind(otp.secret.as_base32())
        .bind(otp.created_at)
        .bind(otp.expires_at)
        .bind(otp.verified)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Otp>> {
        let row = sqlx::query_as::<_, OtpRow>(
            r#"
            SELECT
                otp_id,
                user_id,
                secret,
                created_at,
                expires_at,
                verified
            FROM otps
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_otp()).transpose()
    }

    async fn update(&self, otp: &Otp) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE otps SET
                expires_at = $2,
                verified = $3
            WHERE otp_id = $1
            "#,
        )
        .bind(otp.otp_id.as_uuid())
        .bind(otp.expires_at)
        .bind(otp.verified)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_verified(&self, otp_id: &OtpId) -> AuthResult<bool> {
        let updated = sqlx::query(
            "UPDATE otps SET verified = TRUE WHERE otp_id = $1 AND verified = FALSE",
        )
        .bind(otp_id.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                refresh_token_id,
                user_id,
                token,
                expires_at,
                revoked,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.refresh_token_id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT
                refresh_token_id,
                user_id,
                token,
                expires_at,
                revoked,
                created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_refresh_token()))
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn update(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens SET
                expires_at = $2,
                revoked = $3
            WHERE refresh_token_id = $1
            "#,
        )
        .bind(token.refresh_token_id.as_uuid())
        .bind(token.expires_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace_for_user(&self, token: &RefreshToken) -> AuthResult<u64> {
        let mut tx = self.pool.begin().await?;

        // Per-user lock, released at commit; serializes concurrent logins
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(token.user_id.to_string())
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(token.user_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                refresh_token_id,
                user_id,
                token,
                expires_at,
                revoked,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.refresh_token_id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(deleted)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Permission Repository Implementation
// ============================================================================

impl PermissionRepository for PgAuthRepository {
    async fn find_by_id(&self, permission_id: &PermissionId) -> AuthResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                permission_id,
                name,
                description,
                resource,
                action,
                created_at,
                updated_at
            FROM permissions
            WHERE permission_id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_permission()))
    }

    async fn find_by_name(&self, name: &str) -> AuthResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                permission_id,
                name,
                description,
                resource,
                action,
                created_at,
                updated_at
            FROM permissions
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_permission()))
    }

    async fn find_all(&self) -> AuthResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                permission_id,
                name,
                description,
                resource,
                action,
                created_at,
                updated_at
            FROM permissions
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_permission()).collect())
    }

    async fn find_by_resource(&self, resource: &str) -> AuthResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                permission_id,
                name,
                description,
                resource,
                action,
                created_at,
                updated_at
            FROM permissions
            WHERE resource = $1
            ORDER BY name
            "#,
        )
        .bind(resource)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_permission()).collect())
    }

    async fn create(&self, permission: &Permission) -> AuthResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (
                permission_id,
                name,
                description,
                resource,
                action,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                permission_id,
                name,
                description,
                resource,
                action,
                created_at,
                updated_at
            "#,
        )
        .bind(permission.permission_id.as_uuid())
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(&permission.resource)
        .bind(&permission.action)
        .bind(permission.created_at)
        .bind(permission.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_permission_write_error(e, &permission.name))?;

        Ok(row.into_permission())
    }

    async fn update(&self, permission: &Permission) -> AuthResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            UPDATE permissions SET
                name = $2,
                description = $3,
                resource = $4,
                action = $5,
                updated_at = $6
            WHERE permission_id = $1
            RETURNING
                permission_id,
                name,
                description,
                resource,
                action,
                created_at,
                updated_at
            "#,
        )
        .bind(permission.permission_id.as_uuid())
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(&permission.resource)
        .bind(&permission.action)
        .bind(permission.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_permission_write_error(e, &permission.name))?;

        row.map(|r| r.into_permission())
            .ok_or_else(|| AuthError::not_found(EntityType::Permission, permission.permission_id))
    }

    async fn delete(&self, permission_id: &PermissionId) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM permissions WHERE permission_id = $1")
            .bind(permission_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    otp_enabled: bool,
    otp_secret: Option<String>,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let otp_secret = self
            .otp_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            otp_enabled: self.otp_enabled,
            otp_secret,
            is_active: self.is_active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    otp_id: Uuid,
    user_id: Uuid,
    secret: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    verified: bool,
}

impl OtpRow {
    fn into_otp(self) -> AuthResult<Otp> {
        let secret = TotpSecret::from_base32(self.secret)
            .map_err(|e| AuthError::Internal(format!("Invalid OTP secret: {}", e)))?;

        Ok(Otp {
            otp_id: OtpId::from_uuid(self.otp_id),
            user_id: UserId::from_uuid(self.user_id),
            secret,
            created_at: self.created_at,
            expires_at: self.expires_at,
            verified: self.verified,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    refresh_token_id: Uuid,
    user_id: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_refresh_token(self) -> RefreshToken {
        RefreshToken {
            refresh_token_id: RefreshTokenId::from_uuid(self.refresh_token_id),
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            expires_at: self.expires_at,
            revoked: self.revoked,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    permission_id: Uuid,
    name: String,
    description: String,
    resource: String,
    action: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self) -> Permission {
        Permission {
            permission_id: PermissionId::from_uuid(self.permission_id),
            name: self.name,
            description: self.description,
            resource: self.resource,
            action: self.action,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
