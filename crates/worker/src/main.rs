//! Ledger sync worker.
//!
//! Drains the durable `ledger_queue` against the configured DKG gateway.
//! Runs separately from the API so ledger latency and outages never share a
//! process with the request path.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trustchain_pipeline::{HttpLedger, LedgerProvider, LedgerSyncService, NoopLedger};

/// Hard timeout for ledger gateway calls.
const LEDGER_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trustchain_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = trustchain_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    let provider: Arc<dyn LedgerProvider> = match std::env::var("LEDGER_URL") {
        Ok(url) => {
            tracing::info!(url = %url, "Using HTTP ledger collaborator");
            Arc::new(HttpLedger::new(url, LEDGER_TIMEOUT).expect("Failed to build ledger client"))
        }
        Err(_) => {
            tracing::warn!("LEDGER_URL not set, using no-op ledger");
            Arc::new(NoopLedger)
        }
    };

    let cancel = CancellationToken::new();
    let service = LedgerSyncService::new(pool, provider);
    let sync_handle = tokio::spawn(service.run(cancel.clone()));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping ledger sync");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sync_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C)");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}
