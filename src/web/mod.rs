mod routes;
pub mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::{RecordCache, RecordRepository};
use crate::clock::SystemClock;
use crate::config::Config;
use crate::feishu::{build_api_client, BitableClient, TenantTokenProvider, TokenProvider};
use crate::proxy::FileProxy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<RecordRepository>,
    pub proxy: Arc<FileProxy>,
}

impl AppState {
    /// Wire up the Feishu clients, record cache and file proxy from config.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock = Arc::new(SystemClock);
        let api = build_api_client(config.upstream_timeout)
            .context("Failed to build Feishu API client")?;

        let tokens: Arc<dyn TokenProvider> =
            Arc::new(TenantTokenProvider::new(api.clone(), config, clock.clone()));
        let source = Arc::new(BitableClient::new(api, config, tokens.clone()));
        let cache = RecordCache::new(config.record_cache_ttl, clock);
        let proxy = FileProxy::new(tokens, config.file_proxy_timeout, config.file_proxy_hosts())
            .context("Failed to build file proxy client")?;

        Ok(Self {
            repository: Arc::new(RecordRepository::new(source, cache)),
            proxy: Arc::new(proxy),
        })
    }
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let state = AppState::from_config(&config)?;
    let app = create_app(state);

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down...");
}
