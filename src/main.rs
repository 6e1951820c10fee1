use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use payment_orchestrator::cache::RedisStore;
use payment_orchestrator::config::Config;
use payment_orchestrator::gateway::HttpGateway;
use payment_orchestrator::registry::Registry;
use payment_orchestrator::{create_app, db, reload, AppState};
use sqlx::migrate::Migrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Database pool
    let pool = db::create_pool(&config).await?;
    tracing::info!("Database connection established");

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let cache = RedisStore::new(&config.redis_url)?;
    if let Err(e) = cache.ping().await {
        // The caches are best-effort; serve without them until Redis is back.
        tracing::warn!(error = %e, "Redis is not reachable, caching disabled until it recovers");
    }

    let gateway = HttpGateway::new(&config.gateway);
    tracing::info!(base_url = %config.gateway.base_url, "Payment gateway client initialized");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let registry = Arc::new(Registry::new(
        pool,
        Arc::new(cache),
        Arc::new(gateway),
        config,
    ));

    #[cfg(unix)]
    {
        let registry = registry.clone();
        tokio::spawn(async move {
            if let Err(e) = reload::watch_sighup(registry).await {
                tracing::error!(error = %e, "Configuration reload listener stopped");
            }
        });
    }

    let app = create_app(AppState::new(registry));

    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
