use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bitable_catalog::config::Config;
use bitable_catalog::web;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting bitable-catalog");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let missing = config.missing_credentials();
    if missing.is_empty() {
        info!(
            api_base = %config.api_base,
            base_id = %config.base_id,
            table_id = %config.table_id,
            cache_ttl_secs = config.record_cache_ttl.as_secs(),
            token_cache = config.token_cache_enabled,
            "Configuration loaded"
        );
    } else {
        warn!(
            missing = ?missing,
            "Feishu credentials not configured; upstream calls will fail and the catalog will be empty"
        );
    }

    let proxy_hosts = config.file_proxy_hosts();
    if proxy_hosts.is_empty() {
        warn!(
            "FILE_PROXY_ALLOWED_HOSTS is empty; the file proxy will send the tenant token to any http(s) URL"
        );
    } else {
        info!(hosts = ?proxy_hosts, "File proxy restricted to allowed hosts");
    }

    web::serve(config).await?;

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bitable_catalog=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
