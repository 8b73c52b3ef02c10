//! Roles and the permissions they grant.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Capability checked by the authorization policy before a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "permission")]
pub enum Permission {
    WidgetView,
    UserView,
    UserCreate,
    UserEdit,
    UserDelete,
    StoryView,
    StoryEdit,
    StoryDelete,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::WidgetView,
        Permission::UserView,
        Permission::UserCreate,
        Permission::UserEdit,
        Permission::UserDelete,
        Permission::StoryView,
        Permission::StoryEdit,
        Permission::StoryDelete,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub permissions: Vec<Permission>,
}
