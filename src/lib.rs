pub mod cli;
pub mod core;
pub mod providers;
pub mod scheduler;
pub mod service;

use crate::core::config::AppConfig;
use crate::service::PriceService;
use anyhow::Result;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Fetch { json: bool },
    Watch,
    Health,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("metalwatch starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");
    if config.api_key().is_none() {
        warn!(
            "{} is not set, synthetic commodity prices will be used",
            crate::core::config::ENV_API_KEY
        );
    }

    let service = PriceService::from_config(&config)?;

    match command {
        AppCommand::Fetch { json } => cli::prices::fetch(&service, json).await,
        AppCommand::Watch => cli::prices::watch(&service, config.refresh_interval()).await,
        AppCommand::Health => cli::prices::health(&service).await,
    }
}
