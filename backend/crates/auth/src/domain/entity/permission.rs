//! Permission Entity
//!
//! Atomic RBAC grant. `name` is globally unique; `(resource, action)` is a
//! naming convention only and may repeat across permissions.

use chrono::{DateTime, Utc};

use crate::domain::value_object::PermissionId;

/// Permission entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub permission_id: PermissionId,
    /// Unique name, e.g. `users:read`
    pub name: String,
    pub description: String,
    /// Resource the grant applies to, e.g. `users`
    pub resource: String,
    /// Action on the resource, e.g. `read`
    pub action: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            permission_id: PermissionId::new(),
            name: name.into(),
            description: description.into(),
            resource: resource.into(),
            action: action.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at` before writing an edited permission
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
