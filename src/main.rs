use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use storefront_auth::config::Config;
use storefront_auth::directory::PgAdminDirectory;
use storefront_auth::middleware::ip_guard;
use storefront_auth::routes;
use storefront_auth::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("failed to load configuration from environment")?;

    tracing::info!(
        host = %config.server_host,
        port = config.server_port,
        "starting storefront-auth"
    );

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run migrations")?;
    tracing::info!("database connection pool initialized");

    let redis_client =
        redis::Client::open(config.redis_url.clone()).context("invalid REDIS_URL")?;
    let redis = ConnectionManager::new(redis_client)
        .await
        .context("failed to connect to Redis")?;
    tracing::info!("redis connection initialized");

    // The mirror is a cache of the durable block history; rebuild it so
    // blocks survive a Redis restart.
    ip_guard::rehydrate_block_mirror(&db, &redis)
        .await
        .context("failed to rehydrate block mirror")?;

    let directory = Arc::new(PgAdminDirectory::new(db.clone()));
    let state = AppState::new(db, redis, directory, config.clone());
    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server failed")?;

    Ok(())
}
