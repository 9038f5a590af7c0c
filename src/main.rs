// Events API - main entry point

use events_api::api::{create_router, AppState};
use events_api::auth::audit_logger::AuditLogger;
use events_api::config::{redact_url, Config};
use events_api::state::memory_store::MemoryStore;
use events_api::state::pg_store::PgStore;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing
    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    info!(
        bind_address = %config.bind_address,
        port = config.port,
        log_format = %config.log_format,
        "Starting events API"
    );

    // 3. Initialize storage; the pool is created once and shared
    let mut pg_store: Option<Arc<PgStore>> = None;
    let state = match config.database_url.clone() {
        Some(url) => {
            info!(database = %redact_url(&url), "Connecting to PostgreSQL");
            let store = Arc::new(
                PgStore::connect(&url, config.database_max_connections)
                    .await
                    .map_err(|e| {
                        error!(error = %e, "Database connection failed");
                        e
                    })?,
            );
            store.ensure_schema().await?;
            info!("Database schema ready");

            let audit_logger = AuditLogger::new(Some(store.pool().clone()));
            pg_store = Some(store.clone());
            AppState::new(store, config, audit_logger)?
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), config, AuditLogger::new(None))?
        }
    };

    info!("Application state initialized");

    // 4. Create router
    let router = create_router(&state).with_state(state.clone());

    // 5. Start HTTP server
    let addr = format!("{}:{}", state.config.bind_address, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(error = %e, addr = %addr, "Failed to bind to address");
        e
    })?;

    info!(addr = %addr, "Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            e
        })?;

    if let Some(store) = pg_store {
        store.close().await;
        info!("Database pool closed");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
///
/// `RUST_LOG` wins over `LOG_LEVEL` when set.
fn init_tracing(config: &Config) -> Result<(), String> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let level = parse_log_level(&config.log_level)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

fn parse_log_level(level: &str) -> Result<tracing::Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(format!("Invalid log level: {}", level)),
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
