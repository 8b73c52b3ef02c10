//! Story CRUD entity.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pagination::{ListQuery, PagedResult};
use crate::models::role::Permission;
use crate::models::story::{Story, StoryPatch};
use crate::services::crud::{not_found, CrudEntity, CrudPermissions};
use crate::store::{RecordQuery, RecordStore};

#[async_trait]
impl CrudEntity for Story {
    const NAME: &'static str = "Story";
    const SEARCHABLE_FIELDS: &'static [&'static str] = &["title"];
    const PERMISSIONS: CrudPermissions = CrudPermissions {
        view: Permission::StoryView,
        edit: Permission::StoryEdit,
        delete: Permission::StoryDelete,
    };

    type Item = Story;
    type Patch = StoryPatch;

    async fn list(store: &dyn RecordStore, query: &ListQuery) -> Result<PagedResult<Story>, AppError> {
        let page = store
            .list_stories(RecordQuery::new(query, Self::SEARCHABLE_FIELDS))
            .await?;
        Ok(PagedResult::new(page.items, page.total, query))
    }

    async fn get(store: &dyn RecordStore, id: Uuid) -> Result<Story, AppError> {
        store
            .find_story_by_id(id)
            .await?
            .ok_or_else(|| not_found::<Self>(id))
    }

    async fn update(store: &dyn RecordStore, id: Uuid, patch: StoryPatch) -> Result<Story, AppError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        let story = store
            .update_story(id, patch)
            .await?
            .ok_or_else(|| not_found::<Self>(id))?;
        tracing::info!(story_id = %story.id, "Story updated");
        Ok(story)
    }

    async fn delete(store: &dyn RecordStore, id: Uuid) -> Result<(), AppError> {
        if !store.delete_story(id).await? {
            return Err(not_found::<Self>(id));
        }
        tracing::info!(story_id = %id, "Story deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::story::NewStory;
    use crate::store::{MemoryStore, StoryStore};

    async fn seeded() -> (MemoryStore, Story) {
        let store = MemoryStore::new();
        let story = store
            .create_story(NewStory {
                title: "Morning briefing".to_string(),
                created_date: None,
            })
            .await
            .unwrap();
        store
            .create_story(NewStory {
                title: "Evening recap".to_string(),
                created_date: None,
            })
            .await
            .unwrap();
        (store, story)
    }

    #[tokio::test]
    async fn list_filters_by_title() {
        let (store, _) = seeded().await;
        let query = ListQuery {
            search: Some("BRIEF".to_string()),
            ..Default::default()
        };
        let page = Story::list(&store, &query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Morning briefing");
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (store, story) = seeded().await;
        let patch = StoryPatch {
            title: Some("  ".to_string()),
        };
        let err = Story::update(&store, story.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_keeps_created_date() {
        let (store, story) = seeded().await;
        let patch = StoryPatch {
            title: Some("Renamed".to_string()),
        };
        let updated = Story::update(&store, story.id, patch).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.created_date, story.created_date);
    }

    #[tokio::test]
    async fn deleted_story_is_gone() {
        let (store, story) = seeded().await;
        Story::delete(&store, story.id).await.unwrap();
        assert!(Story::get(&store, story.id).await.unwrap_err().is_not_found());
    }
}
