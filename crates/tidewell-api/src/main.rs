//! Tidewell API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tidewell_api::config::Config;
use tidewell_api::error::AppError;
use tidewell_api::notifier::BroadcastNotifier;
use tidewell_api::state::AppState;
use tidewell_content::application::loader::{default_catalog, load_catalog_from_path};
use tidewell_core::clock::{Clock, SystemClock};
use tidewell_core::repository::SnapshotRepository;
use tidewell_engine::application::command_handlers::ModeratorConsole;
use tidewell_engine::application::snapshots::{restore_or_fresh, save_snapshot};
use tidewell_engine::application::store::GameStore;
use tidewell_engine::application::tick_scheduler::run_scheduler;
use tidewell_snapshot_store::file_snapshot_repository::FileSnapshotRepository;
use tidewell_snapshot_store::pg_snapshot_repository::PgSnapshotRepository;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;

const NOTIFICATION_BUFFER: usize = 1024;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Tidewell game server");

    let config = Config::from_env()?;

    let catalog = Arc::new(match &config.content_path {
        Some(path) => load_catalog_from_path(path)?,
        None => default_catalog()?,
    });
    tracing::info!(fingerprint = %catalog.fingerprint, "content catalog loaded");

    let snapshots: Arc<dyn SnapshotRepository> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            let repo = PgSnapshotRepository::new(pool);
            repo.ensure_schema().await?;
            Arc::new(repo)
        }
        None => {
            let repo = FileSnapshotRepository::new(&config.snapshot_path);
            tracing::info!(path = %repo.path().display(), "using file snapshots");
            Arc::new(repo)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = restore_or_fresh(
        snapshots.as_ref(),
        &catalog,
        config.player_count,
        clock.now(),
    )
    .await?;

    let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);
    let store = Arc::new(GameStore::new(
        state,
        Arc::clone(&catalog),
        clock,
        Arc::new(BroadcastNotifier::new(notifications.clone())),
    ));
    let console = Arc::new(ModeratorConsole::new(
        Arc::clone(&store),
        Arc::clone(&snapshots),
        config.player_count,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(run_scheduler(
        Arc::clone(&store),
        config.tick_interval,
        shutdown_rx,
    ));

    let app_state = AppState::new(
        Arc::clone(&store),
        console,
        notifications,
        config.admin_token.as_str(),
    );
    let app = tidewell_api::build_router(app_state);

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    // The receiver may already be gone if the scheduler task panicked.
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.await {
        tracing::warn!(error = %e, "tick scheduler task ended abnormally");
    }

    if config.save_on_shutdown {
        save_snapshot(&store, snapshots.as_ref()).await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
