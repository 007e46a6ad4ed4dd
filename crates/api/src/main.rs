use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trustchain_api::config::ServerConfig;
use trustchain_api::router::build_app_router;
use trustchain_api::state::AppState;
use trustchain_pipeline::{
    HttpLedger, HttpScoring, LedgerProvider, NeutralScoring, NoopLedger, ScoringProvider,
    SubmissionPipeline,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trustchain_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = trustchain_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    trustchain_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    trustchain_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let scoring: Arc<dyn ScoringProvider> = match &config.scoring_url {
        Some(url) => {
            tracing::info!(url = %url, "Using HTTP scoring collaborator");
            Arc::new(
                HttpScoring::new(url.clone(), config.scoring_timeout)
                    .expect("Failed to build scoring client"),
            )
        }
        None => {
            tracing::warn!("SCORING_URL not set, using neutral scoring");
            Arc::new(NeutralScoring)
        }
    };

    let ledger: Arc<dyn LedgerProvider> = match &config.ledger_url {
        Some(url) => {
            tracing::info!(url = %url, "Using HTTP ledger collaborator");
            Arc::new(
                HttpLedger::new(url.clone(), config.ledger_timeout)
                    .expect("Failed to build ledger client"),
            )
        }
        None => {
            tracing::warn!("LEDGER_URL not set, using no-op ledger");
            Arc::new(NoopLedger)
        }
    };

    // --- Event bus ---
    let event_bus = Arc::new(trustchain_events::EventBus::default());

    // Spawn audit persistence (writes all platform events to audit_logs).
    let persistence_handle = tokio::spawn(trustchain_events::AuditPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));
    tracing::info!("Audit persistence started");

    // --- Submission pipeline ---
    let pipeline = Arc::new(SubmissionPipeline::new(
        pool.clone(),
        config.engine,
        Arc::clone(&scoring),
        Arc::clone(&event_bus),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        pipeline,
        ledger,
        event_bus: Arc::clone(&event_bus),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the event bus sender to close the broadcast channel, signalling
    // audit persistence to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), persistence_handle).await;
    tracing::info!("Audit persistence shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
