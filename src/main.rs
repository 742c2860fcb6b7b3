use anyhow::Context;
use certdesk::{
    build_router,
    config::AppConfig,
    inventory::{InMemoryInventoryRepository, InventoryRepository, PostgresInventoryRepository},
    shared::AppState,
    user::{
        repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
        UserService,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (
    Arc<dyn UserRepository + Send + Sync>,
    Arc<dyn InventoryRepository + Send + Sync>,
);

/// PostgreSQL when DATABASE_URL is set, in-memory otherwise
async fn create_repositories(database_url: Option<&str>) -> anyhow::Result<Repositories> {
    let Some(database_url) = database_url else {
        warn!("DATABASE_URL not set, data is kept in memory and lost on restart");
        return Ok((
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryInventoryRepository::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("Database pool created and migrations applied");

    Ok((
        Arc::new(PostgresUserRepository::new(pool.clone())),
        Arc::new(PostgresInventoryRepository::new(pool)),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting certdesk");

    let config = AppConfig::from_env().context("invalid configuration")?;
    let (user_repository, inventory_repository) =
        create_repositories(config.database_url.as_deref()).await?;

    if let Some(admin) = &config.admin {
        let created = UserService::new(Arc::clone(&user_repository))
            .ensure_user(&admin.login, &admin.password)
            .await
            .context("failed to bootstrap admin user")?;
        if created {
            info!(login = %admin.login, "Admin account created");
        }
    }

    let app_state = AppState::new(config.auth, user_repository, inventory_repository);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
