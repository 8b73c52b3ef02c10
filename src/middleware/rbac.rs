//! Permission checks invoked explicitly by each handler.

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::role::Permission;

/// Decides whether an authenticated caller may perform an action.
///
/// Handlers receive the policy through `AppState` and call it before touching
/// the store:
/// ```ignore
/// state.policy.authorize(&user, Permission::WidgetView)?;
/// ```
pub trait AuthorizationPolicy: Send + Sync {
    fn authorize(&self, user: &CurrentUser, required: Permission) -> Result<(), AppError>;
}

/// Grants access when the caller's token carries the required permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionPolicy;

impl AuthorizationPolicy for PermissionPolicy {
    fn authorize(&self, user: &CurrentUser, required: Permission) -> Result<(), AppError> {
        if user.permissions.contains(&required) {
            return Ok(());
        }
        tracing::warn!(user_id = %user.id, permission = ?required, "Permission denied");
        Err(AppError::Forbidden(format!("Missing permission: {required:?}")))
    }
}
