pub mod cli;
pub mod config;
pub mod core;
pub mod extract;
pub mod fetch;
pub mod serve;
pub mod service;
pub mod store;

use crate::config::AppConfig;
use crate::fetch::{HttpPageProvider, SnapshotBuilder};
use crate::serve::ApiServer;
use crate::service::SnapshotService;
use crate::store::JsonFileStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Commands the binary can run once configuration is loaded.
pub enum AppCommand {
    Serve,
    Refresh,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fundsnap starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = build_service(&config)?;

    match command {
        AppCommand::Serve => {
            let server = ApiServer::bind(&config.server.listen, service).await?;
            server.run().await
        }
        AppCommand::Refresh => cli::refresh::run(&service).await,
    }
}

/// Wires the page provider, payload builder and store into a snapshot service.
pub fn build_service(config: &AppConfig) -> Result<Arc<SnapshotService>> {
    let pages = Arc::new(HttpPageProvider::new(
        &config.provider.base_url,
        Duration::from_secs(config.fetch_timeout_secs),
    )?);
    let builder = Arc::new(SnapshotBuilder::new(
        pages,
        config.funds.clone(),
        config.plans.clone(),
    ));
    let store = Arc::new(JsonFileStore::new(config.cache_file_path()?));
    Ok(Arc::new(SnapshotService::new(builder, store)))
}
