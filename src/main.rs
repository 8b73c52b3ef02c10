use std::sync::Arc;

use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verbal_admin::config::AppConfig;
use verbal_admin::middleware::rbac::PermissionPolicy;
use verbal_admin::store::PgRecordStore;
use verbal_admin::{db, routes, AppState};

// M-MIMALLOC-APP: Use mimalloc as global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verbal_admin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::migrate(&pool).await?;
    tracing::info!("Database migrations applied");

    let addr = config.bind_address();
    let state = AppState {
        store: Arc::new(PgRecordStore::new(pool)),
        policy: Arc::new(PermissionPolicy),
        config,
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(host = %addr, "Starting admin API server");
    axum::serve(listener, app).await?;

    Ok(())
}
