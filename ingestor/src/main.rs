use anyhow::Context;
use robot_log_ingestor::{config::Config, db, rest};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robot_log_ingestor=info,ingestor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to read configuration")?;
    let http_addr = config.http_addr();

    info!("Starting robot log ingestor");
    info!("HTTP server: {}", http_addr);
    info!(
        "Database: {}:{}/{}",
        config.db_host, config.db_port, config.db_name
    );
    if config.db_ssl && config.db_accept_invalid_certs {
        warn!("DB_ACCEPT_INVALID_CERTS is set, database certificate will not be verified");
    }

    let pool = db::make_pool(&config)
        .await
        .context("Failed to connect to database")?;

    let store = Arc::new(db::PgLogStore::new(pool.clone()));
    let app = rest::create_router(store);

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", http_addr))?;

    info!("HTTP server listening on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutting down");
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
