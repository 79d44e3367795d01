//! batch-dl server binary.
//!
//! Usage: `batch-dl [config.json]`. The config path may also come from
//! `BATCH_DL_CONFIG`; with neither, built-in defaults are used. Log filtering
//! follows `RUST_LOG`.

use std::path::PathBuf;
use std::sync::Arc;

use batch_dl::{BatchDownloader, Config, run_with_shutdown};
use tracing_subscriber::{EnvFilter, fmt};

const CONFIG_ENV: &str = "BATCH_DL_CONFIG";

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn load_config() -> batch_dl::Result<Config> {
    match config_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            Config::from_json_file(&path)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("batch_dl=info,tower_http=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    let downloader = match BatchDownloader::new((*config).clone()) {
        Ok(downloader) => Arc::new(downloader),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create downloader");
            std::process::exit(1);
        }
    };

    tracing::info!(
        workers = config.fetch.worker_count,
        max_urls = config.fetch.max_urls_per_request,
        max_clients = config.admission.max_concurrent_clients,
        timeout = ?config.fetch.request_timeout,
        "batch-dl starting"
    );

    if let Err(e) = run_with_shutdown(downloader, config).await {
        tracing::error!(error = %e, "Server terminated with error");
        std::process::exit(1);
    }
}
