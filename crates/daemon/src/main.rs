//! QGate Daemon - Main Entry Point
//!
//! Composition root: logging, configuration, database, service wiring,
//! scheduled cleanup. Reloads configuration on SIGHUP.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qgate_core::application::{AdminService, CleanupScheduler};
use qgate_core::config::ConfigHandle;
use qgate_core::port::{SystemTimeProvider, UuidProvider};
use qgate_infra_sqlite::{create_pool, run_migrations, SqliteAccessRepository, SqliteQueueRepository};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("QGATE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("qgate=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("QGate daemon v{} starting...", VERSION);

    // 2. Load configuration (optional file + QGATE_* environment)
    let config_path = std::env::var("QGATE_CONFIG")
        .ok()
        .map(|p| shellexpand::tilde(&p).into_owned());

    let config = Arc::new(
        ConfigHandle::load(config_path.as_deref())
            .map_err(|e| anyhow::anyhow!("Config load failed: {}", e))?,
    );
    let database_url = config.snapshot().database_url.clone();

    info!(database_url = %database_url, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&database_url)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let queue_repo = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let access_repo = Arc::new(SqliteAccessRepository::new(pool.clone()));

    let admin = AdminService::new(
        queue_repo.clone(),
        access_repo.clone(),
        id_provider.clone(),
        config.clone(),
    );

    // 5. Migrate any tokens still stored in plaintext
    match admin.rehash_legacy_tokens().await {
        Ok(0) => {}
        Ok(count) => info!(rehashed = count, "Legacy token migration completed"),
        Err(e) => tracing::error!(error = ?e, "Legacy token migration failed"),
    }

    // 6. Start scheduled cleanup
    info!("Starting cleanup scheduler...");
    let cleanup = CleanupScheduler::new(queue_repo.clone(), time_provider.clone(), config.clone());
    tokio::spawn(async move {
        cleanup.run().await;
    });

    // 7. Reload configuration on SIGHUP
    #[cfg(unix)]
    {
        let reload_config = config.clone();
        tokio::spawn(async move {
            let mut hangup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to install SIGHUP handler");
                    return;
                }
            };
            while hangup.recv().await.is_some() {
                if let Err(e) = reload_config.reload() {
                    tracing::error!(error = ?e, "Config reload failed, keeping previous snapshot");
                }
            }
        });
    }

    info!("System ready.");
    info!("Press Ctrl+C to shutdown");

    // 8. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");
    pool.close().await;
    info!("Shutdown complete.");

    Ok(())
}
