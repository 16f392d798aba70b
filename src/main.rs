//! Vimal Jewellers API server

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vimal_jewellers::{
    api::{self, AppState},
    config::Config,
    store::mysql::MySqlStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = MySqlStore::connect(&config).await?;
    if config.skip_db_sync {
        info!("SKIP_DB_SYNC set, not running migrations");
    } else {
        store.migrate().await?;
    }

    let port = config.port;
    let app = api::router(AppState::new(Arc::new(store), config));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Vimal Jewellers API listening on 0.0.0.0:{}", port);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
