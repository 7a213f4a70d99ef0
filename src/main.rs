use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use advocacy_site::config::{Cli, Config};
use advocacy_site::db;
use advocacy_site::routes;
use advocacy_site::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    config.validate()?;

    // Initialize the user store database
    let db_path = db::database_path(config.database_url());
    tracing::info!("User store: {}", db_path.display());
    let pool = db::create_pool(&db_path, config.database.pool_size)?;
    db::run_migrations(&pool)?;

    let state = AppState::new(config.clone(), pool.clone())?;
    let app = routes::build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("{} listening on http://{}", config.site.name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let pool_state = pool.state();
    tracing::info!(
        connections = pool_state.connections,
        idle = pool_state.idle_connections,
        "Server stopped; closing user store"
    );
    drop(pool);

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
