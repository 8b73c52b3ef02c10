//! Story content items. Counted by the dashboard, managed through the CRUD routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub created_date: DateTime<Utc>,
}

/// Insert payload. `created_date` defaults to now when omitted.
#[derive(Debug, Clone)]
pub struct NewStory {
    pub title: String,
    pub created_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoryPatch {
    pub title: Option<String>,
}
