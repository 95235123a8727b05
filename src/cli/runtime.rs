use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

const LOCAL_CONFIG: &str = "config/dialoglens.yaml";

/// Logs go to stderr so structured reports on stdout stay parseable.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
}

fn default_config_path() -> PathBuf {
    // Priority: ./config/dialoglens.yaml > <config dir>/dialoglens/config.yaml
    let local_config = PathBuf::from(LOCAL_CONFIG);
    if local_config.exists() {
        return local_config;
    }
    match dirs::config_dir() {
        Some(mut path) => {
            path.push("dialoglens");
            path.push("config.yaml");
            path
        }
        None => local_config,
    }
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path(),
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;

        let config: AppConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded configuration from: {}", config_path.display());
        Ok(LoadedConfig {
            config,
            path: config_path,
        })
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Ok(LoadedConfig {
            config: AppConfig::default(),
            path: config_path,
        })
    }
}

/// Folds environment overrides into `config`.
pub fn apply_runtime_overrides(config: &mut AppConfig) {
    config.apply_env_overrides();
}
