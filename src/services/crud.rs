//! Entity descriptions consumed by the generic CRUD routes.
//!
//! An entity declares which fields the list endpoint searches, which
//! permission guards each operation, and how to read, patch and delete it
//! through a [`RecordStore`]. `routes::crud::crud_routes` turns that
//! description into list/get/update/delete handlers; anything an entity needs
//! beyond those four is registered as an extra route next to them.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pagination::{ListQuery, PagedResult};
use crate::models::role::Permission;
use crate::store::RecordStore;

/// Permission required for each generic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrudPermissions {
    pub view: Permission,
    pub edit: Permission,
    pub delete: Permission,
}

#[async_trait]
pub trait CrudEntity: Send + Sync + 'static {
    /// Singular name used in not-found messages.
    const NAME: &'static str;

    /// API field names matched by `?search=`.
    const SEARCHABLE_FIELDS: &'static [&'static str];

    const PERMISSIONS: CrudPermissions;

    /// Shape returned to clients.
    type Item: Serialize + Send + 'static;

    /// Body accepted by `PUT /{id}`.
    type Patch: DeserializeOwned + Send + 'static;

    async fn list(
        store: &dyn RecordStore,
        query: &ListQuery,
    ) -> Result<PagedResult<Self::Item>, AppError>;

    async fn get(store: &dyn RecordStore, id: Uuid) -> Result<Self::Item, AppError>;

    async fn update(
        store: &dyn RecordStore,
        id: Uuid,
        patch: Self::Patch,
    ) -> Result<Self::Item, AppError>;

    async fn delete(store: &dyn RecordStore, id: Uuid) -> Result<(), AppError>;
}

pub(crate) fn not_found<E: CrudEntity>(id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {id} not found", E::NAME))
}
