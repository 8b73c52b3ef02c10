//! Administrative user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::role::Role;

/// Full user record with its role resolved. Carries the password; never serialize to the API.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// User response DTO, excludes the password field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role_id: Uuid,
}

impl CreateUserRequest {
    pub fn into_parts(self) -> (NewUserInput, Uuid) {
        (
            NewUserInput {
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
            },
            self.role_id,
        )
    }
}

/// Caller-supplied fields for provisioning a user.
#[derive(Debug, Clone, Default)]
pub struct NewUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

/// Insert payload handed to the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<Uuid>,
}
