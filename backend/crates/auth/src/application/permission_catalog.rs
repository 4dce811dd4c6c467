//! Permission Catalog
//!
//! Administrative CRUD for RBAC permissions. Lookups sit on authorization
//! hot paths, so a miss is `None` (or an empty list), not an error.
//! Deleting a missing permission is not an error and reports `false`.

use std::sync::Arc;

use crate::domain::entity::permission::Permission;
use crate::domain::repository::PermissionRepository;
use crate::domain::value_object::PermissionId;
use crate::error::{AuthError, AuthResult};

/// Permission catalog
pub struct PermissionCatalog<P>
where
    P: PermissionRepository,
{
    permission_repo: Arc<P>,
}

impl<P> PermissionCatalog<P>
where
    P: PermissionRepository,
{
    pub fn new(permission_repo: Arc<P>) -> Self {
        Self { permission_repo }
    }

    pub async fn find_by_id(&self, permission_id: &PermissionId) -> AuthResult<Option<Permission>> {
        self.permission_repo.find_by_id(permission_id).await
    }

    pub async fn find_by_name(&self, name: &str) -> AuthResult<Option<Permission>> {
        self.permission_repo.find_by_name(name).await
    }

    pub async fn find_all(&self) -> AuthResult<Vec<Permission>> {
        self.permission_repo.find_all().await
    }

    pub async fn find_by_resource(&self, resource: &str) -> AuthResult<Vec<Permission>> {
        self.permission_repo.find_by_resource(resource).await
    }

    /// Create a permission; its name must not be in use
    pub async fn create(&self, permission: &Permission) -> AuthResult<Permission> {
        if self
            .permission_repo
            .find_by_name(&permission.name)
            .await?
            .is_some()
        {
            return Err(AuthError::PermissionNameTaken(permission.name.clone()));
        }

        let created = self.permission_repo.create(permission).await?;

        tracing::info!(
            permission_id = %created.permission_id,
            name = %created.name,
            "Permission created"
        );
        Ok(created)
    }

    /// Overwrite an existing permission
    ///
    /// Renaming onto a name held by another permission is rejected.
    pub async fn update(&self, permission: &Permission) -> AuthResult<Permission> {
        if let Some(holder) = self.permission_repo.find_by_name(&permission.name).await? {
            if holder.permission_id != permission.permission_id {
                return Err(AuthError::PermissionNameTaken(permission.name.clone()));
            }
        }

        let mut permission = permission.clone();
        permission.touch();
        let updated = self.permission_repo.update(&permission).await?;

        tracing::info!(
            permission_id = %updated.permission_id,
            name = %updated.name,
            "Permission updated"
        );
        Ok(updated)
    }

    /// Delete a permission. `Ok(false)` if it was not there.
    pub async fn delete(&self, permission_id: &PermissionId) -> AuthResult<bool> {
        let deleted = self.permission_repo.delete(permission_id).await?;

        if deleted {
            tracing::info!(permission_id = %permission_id, "Permission deleted");
        } else {
            tracing::debug!(permission_id = %permission_id, "Permission already gone");
        }
        Ok(deleted)
    }
}
