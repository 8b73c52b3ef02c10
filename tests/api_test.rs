//! HTTP-level tests driving the full router over the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use verbal_admin::config::AppConfig;
use verbal_admin::middleware::rbac::PermissionPolicy;
use verbal_admin::models::role::{NewRole, Permission, Role};
use verbal_admin::models::story::NewStory;
use verbal_admin::models::user::User;
use verbal_admin::services::auth;
use verbal_admin::store::{MemoryStore, RecordStore, RoleStore, StoryStore};
use verbal_admin::{routes, AppState};

const JWT_SECRET: &str = "test-jwt-secret-for-api-tests-only";

struct TestApp {
    app: Router,
    store: Arc<MemoryStore>,
    role: Role,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_access_token_expiry_secs: 900,
        frontend_url: "http://localhost:5173".to_string(),
    }
}

async fn setup() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let role = store
        .create_role(NewRole {
            name: "Editor".to_string(),
            permissions: vec![Permission::StoryView],
        })
        .await
        .expect("role");

    let state = AppState {
        store: store.clone() as Arc<dyn RecordStore>,
        policy: Arc::new(PermissionPolicy),
        config: test_config(),
    };

    TestApp {
        app: routes::router(state),
        store,
        role,
    }
}

/// Bearer token for a caller holding exactly `permissions`.
fn token(permissions: &[Permission]) -> String {
    let caller = User {
        id: Uuid::new_v4(),
        first_name: "Test".to_string(),
        last_name: "Caller".to_string(),
        email: "caller@test.local".to_string(),
        password: String::new(),
        role: Role {
            id: Uuid::new_v4(),
            name: "Caller".to_string(),
            permissions: permissions.to_vec(),
        },
        created_at: Utc::now(),
    };
    let issued = auth::issue_token(&caller, JWT_SECRET, 900).expect("token");
    format!("Bearer {}", issued.access_token)
}

fn admin() -> String {
    token(&Permission::ALL)
}

fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("json body")
}

async fn create_user(t: &TestApp, email: Value) -> (StatusCode, Vec<u8>) {
    let body = json!({
        "firstName": "A",
        "lastName": "B",
        "email": email,
        "roleId": t.role.id,
    });
    send(&t.app, request("POST", "/users", Some(&admin()), Some(body))).await
}

#[tokio::test]
async fn create_user_then_duplicate() {
    let t = setup().await;

    let (status, body) = create_user(&t, json!("a@x.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, body) = create_user(&t, json!("a@x.com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        as_json(&body)["message"],
        "Email address already in use, please use a different email address."
    );
}

#[tokio::test]
async fn create_user_with_empty_or_missing_email_is_rejected() {
    let t = setup().await;

    let (status, _) = create_user(&t, json!("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = create_user(&t, Value::Null).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["message"].is_string());
}

#[tokio::test]
async fn create_user_with_unknown_role_is_opaque_500() {
    let t = setup().await;
    let body = json!({
        "firstName": "A",
        "lastName": "B",
        "email": "a@x.com",
        "roleId": Uuid::new_v4(),
    });
    let (status, body) = send(&t.app, request("POST", "/users", Some(&admin()), Some(body))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[tokio::test]
async fn create_user_without_role_id_is_opaque_500() {
    let t = setup().await;
    let body = json!({ "firstName": "A", "lastName": "B", "email": "q@x.com" });
    let (status, body) = send(&t.app, request("POST", "/users", Some(&admin()), Some(body))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());

    let body = json!({ "email": "q@x.com", "roleId": "not-a-uuid" });
    let (status, body) = send(&t.app, request("POST", "/users", Some(&admin()), Some(body))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[tokio::test]
async fn list_with_huge_page_returns_empty_page() {
    let t = setup().await;
    create_user(&t, json!("a@x.com")).await;

    let uri = format!("/users?page={}&per_page=100", i64::MAX);
    let (status, body) = send(&t.app, request("GET", &uri, Some(&admin()), None)).await;
    assert_eq!(status, StatusCode::OK);
    let page = as_json(&body);
    assert_eq!(page["items"], json!([]));
    assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let t = setup().await;
    let (status, _) = send(&t.app, request("GET", "/users/dashboard-stats", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &t.app,
        request("GET", "/users/dashboard-stats", Some("Bearer not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let t = setup().await;
    let viewer = token(&[Permission::UserView]);

    let (status, _) = send(
        &t.app,
        request("GET", "/users/dashboard-stats", Some(&viewer), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let body = json!({ "email": "a@x.com", "roleId": t.role.id });
    let (status, _) = send(&t.app, request("POST", "/users", Some(&viewer), Some(body))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_stats_on_empty_store() {
    let t = setup().await;
    let widget = token(&[Permission::WidgetView]);
    let (status, body) = send(
        &t.app,
        request("GET", "/users/dashboard-stats", Some(&widget), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({ "totalStories": 0, "totalStories30": 0 }));
}

#[tokio::test]
async fn dashboard_stats_counts_trailing_month() {
    let t = setup().await;
    let now = Utc::now();
    for days in [0, 10, 40] {
        t.store
            .create_story(NewStory {
                title: format!("{days}d"),
                created_date: Some(now - Duration::days(days)),
            })
            .await
            .unwrap();
    }

    let widget = token(&[Permission::WidgetView]);
    let (status, body) = send(
        &t.app,
        request("GET", "/users/dashboard-stats", Some(&widget), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({ "totalStories": 3, "totalStories30": 2 }));
}

#[tokio::test]
async fn user_crud_lifecycle() {
    let t = setup().await;
    let admin = admin();

    for (first, email) in [("Ada", "ada@x.com"), ("Grace", "grace@x.com")] {
        let body = json!({
            "firstName": first,
            "lastName": "Test",
            "email": email,
            "roleId": t.role.id,
        });
        let (status, _) = send(&t.app, request("POST", "/users", Some(&admin), Some(body))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&t.app, request("GET", "/users?search=gra", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    let page = as_json(&body);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["email"], "grace@x.com");
    assert_eq!(page["items"][0]["role"]["id"], json!(t.role.id));
    assert!(page["items"][0].get("password").is_none());
    let id = page["items"][0]["id"].as_str().unwrap().to_string();

    let patch = json!({ "lastName": "Hopper" });
    let (status, body) = send(
        &t.app,
        request("PUT", &format!("/users/{id}"), Some(&admin), Some(patch)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["lastName"], "Hopper");

    let patch = json!({ "email": "ada@x.com" });
    let (status, _) = send(
        &t.app,
        request("PUT", &format!("/users/{id}"), Some(&admin), Some(patch)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, request("DELETE", &format!("/users/{id}"), Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&t.app, request("GET", &format!("/users/{id}"), Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(as_json(&body)["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn stories_are_listed_and_edited_through_crud_routes() {
    let t = setup().await;
    let story = t
        .store
        .create_story(NewStory {
            title: "Original".to_string(),
            created_date: None,
        })
        .await
        .unwrap();

    let viewer = token(&[Permission::StoryView]);
    let (status, body) = send(&t.app, request("GET", "/stories", Some(&viewer), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["total"], 1);

    // viewing does not grant editing
    let patch = json!({ "title": "Renamed" });
    let uri = format!("/stories/{}", story.id);
    let (status, _) = send(&t.app, request("PUT", &uri, Some(&viewer), Some(patch.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let editor = token(&[Permission::StoryEdit]);
    let (status, body) = send(&t.app, request("PUT", &uri, Some(&editor), Some(patch))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["title"], "Renamed");
}

#[tokio::test]
async fn health_probes() {
    let t = setup().await;
    let (status, body) = send(&t.app, request("GET", "/health/live", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (status, body) = send(&t.app, request("GET", "/health/ready", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["store"], "connected");
}
