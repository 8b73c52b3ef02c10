//! PostgreSQL record store backed by a sqlx connection pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Page, RecordQuery, RecordStore, RoleStore, StoreError, StoryStore, UserStore};
use crate::models::role::{NewRole, Permission, Role};
use crate::models::story::{NewStory, Story, StoryPatch};
use crate::models::user::{NewUser, User, UserPatch};

const USER_COLUMNS: &str = "u.id, u.first_name, u.last_name, u.email, u.password, u.created_at, \
     r.id AS role_id, r.name AS role_name, r.permissions AS role_permissions";

#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// User joined with its role in a single row.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    role_id: Uuid,
    role_name: String,
    role_permissions: Vec<Permission>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password: row.password,
            role: Role {
                id: row.role_id,
                name: row.role_name,
                permissions: row.role_permissions,
            },
            created_at: row.created_at,
        }
    }
}

/// Map unique-index failures to [`StoreError::ConstraintViolation`].
fn classify(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::ConstraintViolation(
                db_err
                    .constraint()
                    .unwrap_or("unique constraint")
                    .to_string(),
            )
        }
        _ => StoreError::Database(e),
    }
}

fn user_column(field: &str) -> Option<&'static str> {
    match field {
        "firstName" => Some("u.first_name"),
        "lastName" => Some("u.last_name"),
        "email" => Some("u.email"),
        _ => None,
    }
}

fn story_column(field: &str) -> Option<&'static str> {
    match field {
        "title" => Some("title"),
        _ => None,
    }
}

/// Build the `WHERE` clause for a search over whitelisted columns.
///
/// Returns the clause (possibly empty) and the `ILIKE` pattern to bind as `$1`.
fn search_clause(
    query: &RecordQuery<'_>,
    column_for: fn(&str) -> Option<&'static str>,
) -> (String, Option<String>) {
    let Some(term) = query.search else {
        return (String::new(), None);
    };
    let columns: Vec<&str> = query.fields.iter().filter_map(|f| column_for(f)).collect();
    if columns.is_empty() {
        return (String::new(), None);
    }

    let conditions: Vec<String> = columns.iter().map(|c| format!("{c} ILIKE $1")).collect();
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    (
        format!("WHERE ({})", conditions.join(" OR ")),
        Some(format!("%{escaped}%")),
    )
}

#[async_trait]
impl UserStore for PgRecordStore {
    async fn find_unique_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id WHERE u.email = $1"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, data: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            WITH u AS (
                INSERT INTO users (first_name, last_name, email, password, role_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u JOIN roles r ON r.id = u.role_id
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(&data.password)
            .bind(data.role_id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(row.into())
    }

    async fn list_users(&self, query: RecordQuery<'_>) -> Result<Page<User>, StoreError> {
        let (where_clause, pattern) = search_clause(&query, user_column);

        let count_sql = format!("SELECT COUNT(*) FROM users u {where_clause}");
        let data_sql = format!(
            "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id {where_clause} \
             ORDER BY u.created_at ASC LIMIT {} OFFSET {}",
            query.limit, query.offset
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut data_query = sqlx::query_as::<_, UserRow>(&data_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p);
            data_query = data_query.bind(p);
        }

        let total = count_query.fetch_one(&self.pool).await?;
        let rows = data_query.fetch_all(&self.pool).await?;
        Ok(Page {
            items: rows.into_iter().map(User::from).collect(),
            total,
        })
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE($4, email),
                role_id    = COALESCE($5, role_id)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.email)
        .bind(patch.role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        match updated {
            Some(id) => self.find_user_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StoryStore for PgRecordStore {
    async fn find_all_stories(&self) -> Result<Vec<Story>, StoreError> {
        let rows = sqlx::query_as::<_, Story>(
            "SELECT id, title, created_date FROM stories ORDER BY created_date ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_stories_created_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Vec<Story>, StoreError> {
        let rows = sqlx::query_as::<_, Story>(
            "SELECT id, title, created_date FROM stories WHERE created_date > $1 \
             ORDER BY created_date ASC",
        )
        .bind(after)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_story_by_id(&self, id: Uuid) -> Result<Option<Story>, StoreError> {
        let row = sqlx::query_as::<_, Story>(
            "SELECT id, title, created_date FROM stories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_story(&self, data: NewStory) -> Result<Story, StoreError> {
        let row = sqlx::query_as::<_, Story>(
            r#"
            INSERT INTO stories (title, created_date)
            VALUES ($1, COALESCE($2, NOW()))
            RETURNING id, title, created_date
            "#,
        )
        .bind(&data.title)
        .bind(data.created_date)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row)
    }

    async fn list_stories(&self, query: RecordQuery<'_>) -> Result<Page<Story>, StoreError> {
        let (where_clause, pattern) = search_clause(&query, story_column);

        let count_sql = format!("SELECT COUNT(*) FROM stories {where_clause}");
        let data_sql = format!(
            "SELECT id, title, created_date FROM stories {where_clause} \
             ORDER BY created_date ASC LIMIT {} OFFSET {}",
            query.limit, query.offset
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut data_query = sqlx::query_as::<_, Story>(&data_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p);
            data_query = data_query.bind(p);
        }

        let total = count_query.fetch_one(&self.pool).await?;
        let items = data_query.fetch_all(&self.pool).await?;
        Ok(Page { items, total })
    }

    async fn update_story(
        &self,
        id: Uuid,
        patch: StoryPatch,
    ) -> Result<Option<Story>, StoreError> {
        let row = sqlx::query_as::<_, Story>(
            r#"
            UPDATE stories SET title = COALESCE($2, title)
            WHERE id = $1
            RETURNING id, title, created_date
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_story(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleStore for PgRecordStore {
    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, Role>("SELECT id, name, permissions FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_role(&self, data: NewRole) -> Result<Role, StoreError> {
        let row = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name, permissions) VALUES ($1, $2) RETURNING id, name, permissions",
        )
        .bind(&data.name)
        .bind(&data.permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query_as::<_, Role>("SELECT id, name, permissions FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_clause_is_empty_without_term() {
        let q = RecordQuery {
            search: None,
            fields: &["firstName"],
            limit: 25,
            offset: 0,
        };
        let (clause, pattern) = search_clause(&q, user_column);
        assert!(clause.is_empty());
        assert!(pattern.is_none());
    }

    #[test]
    fn search_clause_ors_known_columns() {
        let q = RecordQuery {
            search: Some("ada"),
            fields: &["firstName", "lastName", "password"],
            limit: 25,
            offset: 0,
        };
        let (clause, pattern) = search_clause(&q, user_column);
        assert_eq!(clause, "WHERE (u.first_name ILIKE $1 OR u.last_name ILIKE $1)");
        assert_eq!(pattern.as_deref(), Some("%ada%"));
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let q = RecordQuery {
            search: Some("50%_off"),
            fields: &["title"],
            limit: 25,
            offset: 0,
        };
        let (_, pattern) = search_clause(&q, story_column);
        assert_eq!(pattern.as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn unknown_fields_disable_search() {
        let q = RecordQuery {
            search: Some("x"),
            fields: &["nope"],
            limit: 25,
            offset: 0,
        };
        let (clause, _) = search_clause(&q, story_column);
        assert!(clause.is_empty());
    }
}
