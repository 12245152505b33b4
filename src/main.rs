use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkoutkeys::config::Config;
use checkoutkeys::db::{AppState, create_pool, init_db};
use checkoutkeys::handlers;
use checkoutkeys::settings::MemorySettings;

#[derive(Parser, Debug)]
#[command(name = "checkoutkeys")]
#[command(about = "Local mirror of checkoutkeys.com license keys")]
struct Cli {
    /// Run one license sync and exit (for cron), without starting the server
    #[arg(long)]
    sync_once: bool,
}

fn spawn_sync_task(state: AppState, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            match state.sync.run().await {
                Ok(result) => {
                    tracing::debug!("Scheduled sync reconciled {} licenses", result.count);
                }
                Err(e) => {
                    tracing::warn!("Scheduled sync failed: {}", e);
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkoutkeys=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("checkoutkeys/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client");

    let settings = Arc::new(MemorySettings::from_config(&config));
    if config.debug_mode {
        tracing::info!("Debug mode: remote API responses will be logged");
    }

    let state = AppState::new(
        db_pool,
        settings,
        http_client,
        config.timeouts,
        config.nonce_key.clone(),
    );

    if cli.sync_once {
        return match state.sync.run().await {
            Ok(result) => {
                tracing::info!(
                    "Synced {} licenses ({} new, {} updated, {} skipped)",
                    result.count,
                    result.inserted,
                    result.updated,
                    result.errors.len()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Sync failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if let Some(interval) = config.sync_interval {
        tracing::info!("Scheduled sync every {}s", interval.as_secs());
        spawn_sync_task(state.clone(), interval);
    }

    let app = Router::new()
        .merge(handlers::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("checkoutkeys listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
