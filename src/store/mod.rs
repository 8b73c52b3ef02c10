//! Persistence capability consumed by the services.
//!
//! The services never touch a connection pool directly. They receive a
//! `&dyn RecordStore` (or one of its per-entity parts) from the caller, so the
//! same business rules run against PostgreSQL in production and against the
//! in-process [`MemoryStore`] in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::pagination::ListQuery;
use crate::models::role::{NewRole, Role};
use crate::models::story::{NewStory, Story, StoryPatch};
use crate::models::user::{NewUser, User, UserPatch};

pub use memory::MemoryStore;
pub use postgres::PgRecordStore;

/// Failure reported by a store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Filtered, paged read over one entity.
///
/// `search` is matched case-insensitively as a substring of any of `fields`.
/// Field names use the API spelling (`firstName`); adapters ignore names they
/// do not recognise.
#[derive(Debug, Clone, Copy)]
pub struct RecordQuery<'a> {
    pub search: Option<&'a str>,
    pub fields: &'a [&'a str],
    pub limit: i64,
    pub offset: i64,
}

impl<'a> RecordQuery<'a> {
    pub fn new(query: &'a ListQuery, fields: &'a [&'a str]) -> Self {
        Self {
            search: query.search_term(),
            fields,
            limit: query.limit(),
            offset: query.offset(),
        }
    }
}

/// One page of records plus the unpaged match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive email lookup.
    async fn find_unique_user(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a user and return it with the role resolved. Fails with
    /// [`StoreError::ConstraintViolation`] when the email is already taken.
    async fn create_user(&self, data: NewUser) -> Result<User, StoreError>;

    async fn list_users(&self, query: RecordQuery<'_>) -> Result<Page<User>, StoreError>;

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;

    /// Returns `false` when no user had that id.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn find_all_stories(&self) -> Result<Vec<Story>, StoreError>;

    /// Stories whose `created_date` is strictly after `after`.
    async fn find_stories_created_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Vec<Story>, StoreError>;

    async fn find_story_by_id(&self, id: Uuid) -> Result<Option<Story>, StoreError>;

    async fn create_story(&self, data: NewStory) -> Result<Story, StoreError>;

    async fn list_stories(&self, query: RecordQuery<'_>) -> Result<Page<Story>, StoreError>;

    async fn update_story(&self, id: Uuid, patch: StoryPatch)
        -> Result<Option<Story>, StoreError>;

    async fn delete_story(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, StoreError>;

    async fn create_role(&self, data: NewRole) -> Result<Role, StoreError>;

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait RecordStore: UserStore + StoryStore + RoleStore {
    /// Cheap connectivity check for the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Case-insensitive substring match used by adapters that filter in process.
pub(crate) fn matches_search(needle: &str, haystacks: &[&str]) -> bool {
    let needle = needle.to_lowercase();
    haystacks
        .iter()
        .any(|h| h.to_lowercase().contains(&needle))
}
