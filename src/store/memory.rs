//! In-process record store used by tests and local experiments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    matches_search, Page, RecordQuery, RecordStore, RoleStore, StoreError, StoryStore, UserStore,
};
use crate::models::role::{NewRole, Role};
use crate::models::story::{NewStory, Story, StoryPatch};
use crate::models::user::{NewUser, User, UserPatch};

/// Holds every record behind one lock. Email uniqueness is enforced under the
/// write lock, mirroring the unique index of the PostgreSQL schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    roles: HashMap<Uuid, Role>,
    // Vecs keep insertion order, which doubles as creation order.
    users: Vec<UserRecord>,
    stories: Vec<Story>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    role_id: Uuid,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "firstName" => Some(&self.first_name),
            "lastName" => Some(&self.last_name),
            "email" => Some(&self.email),
            _ => None,
        }
    }
}

impl Inner {
    fn resolve(&self, record: &UserRecord) -> Result<User, StoreError> {
        let role = self.roles.get(&record.role_id).ok_or_else(|| {
            StoreError::Backend(format!("Role {} not found", record.role_id))
        })?;
        Ok(User {
            id: record.id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            password: record.password.clone(),
            role: role.clone(),
            created_at: record.created_at,
        })
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn require_role(&self, role_id: Uuid) -> Result<(), StoreError> {
        if self.roles.contains_key(&role_id) {
            Ok(())
        } else {
            Err(StoreError::Backend(format!("Role {role_id} not found")))
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(matched: Vec<T>, query: RecordQuery<'_>) -> Page<T> {
    let total = matched.len() as i64;
    let offset = usize::try_from(query.offset).unwrap_or(0);
    let limit = usize::try_from(query.limit).unwrap_or(0);
    Page {
        items: matched.into_iter().skip(offset).take(limit).collect(),
        total,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_unique_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| inner.resolve(u))
            .transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| inner.resolve(u))
            .transpose()
    }

    async fn create_user(&self, data: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&data.email, None) {
            return Err(StoreError::ConstraintViolation("users.email".to_string()));
        }
        inner.require_role(data.role_id)?;

        let record = UserRecord {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            password: data.password,
            role_id: data.role_id,
            created_at: Utc::now(),
        };
        let user = inner.resolve(&record)?;
        inner.users.push(record);
        Ok(user)
    }

    async fn list_users(&self, query: RecordQuery<'_>) -> Result<Page<User>, StoreError> {
        let inner = self.inner.read().await;
        let matched = inner
            .users
            .iter()
            .filter(|u| match query.search {
                Some(term) => {
                    let values: Vec<&str> =
                        query.fields.iter().filter_map(|f| u.field(f)).collect();
                    matches_search(term, &values)
                }
                None => true,
            })
            .map(|u| inner.resolve(u))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paginate(matched, query))
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &patch.email {
            if inner.email_taken(email, Some(id)) {
                return Err(StoreError::ConstraintViolation("users.email".to_string()));
            }
        }
        if let Some(role_id) = patch.role_id {
            inner.require_role(role_id)?;
        }

        let Some(record) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = patch.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            record.last_name = last_name;
        }
        if let Some(email) = patch.email {
            record.email = email;
        }
        if let Some(role_id) = patch.role_id {
            record.role_id = role_id;
        }
        let record = record.clone();
        inner.resolve(&record).map(Some)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        Ok(inner.users.len() != before)
    }
}

#[async_trait]
impl StoryStore for MemoryStore {
    async fn find_all_stories(&self) -> Result<Vec<Story>, StoreError> {
        Ok(self.inner.read().await.stories.clone())
    }

    async fn find_stories_created_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Vec<Story>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .stories
            .iter()
            .filter(|s| s.created_date > after)
            .cloned()
            .collect())
    }

    async fn find_story_by_id(&self, id: Uuid) -> Result<Option<Story>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.stories.iter().find(|s| s.id == id).cloned())
    }

    async fn create_story(&self, data: NewStory) -> Result<Story, StoreError> {
        let story = Story {
            id: Uuid::new_v4(),
            title: data.title,
            created_date: data.created_date.unwrap_or_else(Utc::now),
        };
        self.inner.write().await.stories.push(story.clone());
        Ok(story)
    }

    async fn list_stories(&self, query: RecordQuery<'_>) -> Result<Page<Story>, StoreError> {
        let inner = self.inner.read().await;
        let matched: Vec<Story> = inner
            .stories
            .iter()
            .filter(|s| match query.search {
                Some(term) => {
                    query.fields.contains(&"title") && matches_search(term, &[s.title.as_str()])
                }
                None => true,
            })
            .cloned()
            .collect();
        Ok(paginate(matched, query))
    }

    async fn update_story(
        &self,
        id: Uuid,
        patch: StoryPatch,
    ) -> Result<Option<Story>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(story) = inner.stories.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            story.title = title;
        }
        Ok(Some(story.clone()))
    }

    async fn delete_story(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.stories.len();
        inner.stories.retain(|s| s.id != id);
        Ok(inner.stories.len() != before)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        Ok(self.inner.read().await.roles.get(&id).cloned())
    }

    async fn create_role(&self, data: NewRole) -> Result<Role, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.roles.values().any(|r| r.name == data.name) {
            return Err(StoreError::ConstraintViolation("roles.name".to_string()));
        }
        let role = Role {
            id: Uuid::new_v4(),
            name: data.name,
            permissions: data.permissions,
        };
        inner.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let inner = self.inner.read().await;
        let mut roles: Vec<Role> = inner.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
