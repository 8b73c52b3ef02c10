//! User provisioning and the user CRUD entity.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pagination::{ListQuery, PagedResult};
use crate::models::role::Permission;
use crate::models::user::{NewUser, NewUserInput, User, UserPatch, UserResponse};
use crate::services::crud::{not_found, CrudEntity, CrudPermissions};
use crate::store::{RecordQuery, RecordStore, StoreError, UserStore};

/// Create a user attached to `role_id`.
///
/// Fails with [`AppError::EmailInUse`] when the email is already registered
/// and also when it is empty or absent: both cases are reported to clients
/// the same way. The password starts empty; setting it is not this
/// service's job. The existence check and the insert are separate store
/// calls, so a concurrent duplicate is caught by the store's uniqueness
/// constraint and reported as `EmailInUse` as well.
pub async fn create_user<S: UserStore + ?Sized>(
    store: &S,
    input: NewUserInput,
    role_id: Uuid,
) -> Result<User, AppError> {
    let email = input.email.unwrap_or_default();

    let existing = if email.is_empty() {
        None
    } else {
        store.find_unique_user(&email).await?
    };

    if existing.is_some() || email.is_empty() {
        tracing::info!(email = %email, "User creation rejected: email in use");
        return Err(AppError::EmailInUse);
    }

    let user = store
        .create_user(NewUser {
            first_name: input.first_name,
            last_name: input.last_name,
            email,
            password: String::new(),
            role_id,
        })
        .await
        .map_err(email_conflict)?;

    tracing::info!(user_id = %user.id, role_id = %user.role.id, "User created");
    Ok(user)
}

/// Translate a uniqueness violation on write into the client-facing error.
fn email_conflict(e: StoreError) -> AppError {
    match e {
        StoreError::ConstraintViolation(constraint) => {
            tracing::info!(%constraint, "Email uniqueness enforced by store");
            AppError::EmailInUse
        }
        other => AppError::Store(other),
    }
}

#[async_trait]
impl CrudEntity for User {
    const NAME: &'static str = "User";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["firstName", "lastName"];
    const PERMISSIONS: CrudPermissions = CrudPermissions {
        view: Permission::UserView,
        edit: Permission::UserEdit,
        delete: Permission::UserDelete,
    };

    type Item = UserResponse;
    type Patch = UserPatch;

    async fn list(
        store: &dyn RecordStore,
        query: &ListQuery,
    ) -> Result<PagedResult<UserResponse>, AppError> {
        let page = store
            .list_users(RecordQuery::new(query, Self::SEARCHABLE_FIELDS))
            .await?;
        Ok(PagedResult::new(page.items, page.total, query).map(UserResponse::from))
    }

    async fn get(store: &dyn RecordStore, id: Uuid) -> Result<UserResponse, AppError> {
        store
            .find_user_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| not_found::<Self>(id))
    }

    /// Email changes follow the creation rule: non-empty and not held by
    /// another user.
    async fn update(
        store: &dyn RecordStore,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<UserResponse, AppError> {
        if let Some(email) = patch.email.as_deref() {
            if email.is_empty() {
                return Err(AppError::EmailInUse);
            }
            if let Some(holder) = store.find_unique_user(email).await? {
                if holder.id != id {
                    return Err(AppError::EmailInUse);
                }
            }
        }

        let user = store
            .update_user(id, patch)
            .await
            .map_err(email_conflict)?
            .ok_or_else(|| not_found::<Self>(id))?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user.into())
    }

    async fn delete(store: &dyn RecordStore, id: Uuid) -> Result<(), AppError> {
        if !store.delete_user(id).await? {
            return Err(not_found::<Self>(id));
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
