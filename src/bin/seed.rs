//! Seed script for development: populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` environment variables (reads .env).
//! Prints an access token for the admin user so the API can be called directly.

use chrono::{Duration, Utc};
use verbal_admin::config::AppConfig;
use verbal_admin::models::role::{NewRole, Permission, Role};
use verbal_admin::models::story::NewStory;
use verbal_admin::models::user::{NewUserInput, User};
use verbal_admin::services::{auth, users};
use verbal_admin::store::{PgRecordStore, RoleStore, StoryStore, UserStore};

const ADMIN_ROLE: &str = "Administrator";
const ADMIN_EMAIL: &str = "admin@verbal.local";

/// Story ages in days; roughly half fall inside the dashboard's one-month window.
const STORY_AGES: [i64; 8] = [0, 2, 5, 11, 19, 33, 47, 60];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = verbal_admin::db::create_pool(&config.database_url, 5).await?;
    verbal_admin::db::migrate(&pool).await?;
    let store = PgRecordStore::new(pool);

    println!("=== Admin API Seed Script ===");

    let role = seed_admin_role(&store).await?;
    let admin = seed_admin_user(&store, &role).await?;
    seed_stories(&store).await?;

    let token = auth::issue_token(&admin, &config.jwt_secret, config.jwt_access_token_expiry_secs)?;

    println!("\n=== Seed complete! ===");
    println!("Admin: {ADMIN_EMAIL}");
    println!("Access token (valid {}s):\n{}", token.expires_in, token.access_token);

    Ok(())
}

async fn seed_admin_role(store: &PgRecordStore) -> anyhow::Result<Role> {
    if let Some(role) = store
        .list_roles()
        .await?
        .into_iter()
        .find(|r| r.name == ADMIN_ROLE)
    {
        println!("[skip] Role '{ADMIN_ROLE}' already exists");
        return Ok(role);
    }

    let role = store
        .create_role(NewRole {
            name: ADMIN_ROLE.to_string(),
            permissions: Permission::ALL.to_vec(),
        })
        .await?;
    println!("[done] Created role '{ADMIN_ROLE}'");
    Ok(role)
}

async fn seed_admin_user(store: &PgRecordStore, role: &Role) -> anyhow::Result<User> {
    if let Some(user) = store.find_unique_user(ADMIN_EMAIL).await? {
        println!("[skip] Admin user already exists");
        return Ok(user);
    }

    let user = users::create_user(
        store,
        NewUserInput {
            first_name: "Site".to_string(),
            last_name: "Administrator".to_string(),
            email: Some(ADMIN_EMAIL.to_string()),
        },
        role.id,
    )
    .await?;
    println!("[done] Created admin user");
    Ok(user)
}

async fn seed_stories(store: &PgRecordStore) -> anyhow::Result<()> {
    if !store.find_all_stories().await?.is_empty() {
        println!("[skip] Stories already present");
        return Ok(());
    }

    let now = Utc::now();
    for days in STORY_AGES {
        store
            .create_story(NewStory {
                title: format!("Sample story from {days} days ago"),
                created_date: Some(now - Duration::days(days)),
            })
            .await?;
    }
    println!("[done] Created {} stories", STORY_AGES.len());
    Ok(())
}
