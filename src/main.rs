//! Kinetic Quotes binary entry point

use kinetic_quotes::{App, config};
use tokio_stream::StreamExt as _;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize App
/// 4. Start background tasks (snapshot log, backup scheduler)
/// 5. Run until Ctrl-C
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter().into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting Kinetic Quotes...");
    kinetic_quotes::metrics::init_metrics();
    tracing::info!(
        database = %config.database.path.display(),
        backups_enabled = config.backup.enabled,
        "Configuration loaded"
    );

    // 3. Initialize application state
    let app = App::new(config.clone()).await?;

    // 4. Start background tasks
    spawn_snapshot_logger(app.clone());
    if config.backup.enabled {
        spawn_backup_task(app.clone());
    }

    // 5. Run until interrupted
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    tracing::debug!(metrics = %kinetic_quotes::metrics::render(), "Final metrics");

    Ok(())
}

/// Log every snapshot the store publishes
fn spawn_snapshot_logger(app: App) {
    tokio::spawn(async move {
        let mut snapshots = app.store.subscribe_all();

        while let Some(snapshot) = snapshots.next().await {
            tracing::info!(
                count = snapshot.len(),
                newest = snapshot.first().map(|quote| quote.id),
                newest_theme = snapshot.first().map(|quote| quote.theme.label()),
                "Collection updated"
            );
        }
    });
}

/// Spawn background backup task
fn spawn_backup_task(app: App) {
    tokio::spawn(async move {
        app.backup.run().await;
    });

    tracing::info!("Backup task spawned");
}
