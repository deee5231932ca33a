//! Subcommands and the configuration/engine plumbing they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod regions;

use std::path::{Path, PathBuf};

use tracing::debug;

use rtvue_core::models::config::{OcrConfig, RtvueConfig};
use rtvue_core::PureOcrEngine;

/// `<config dir>/rtvue/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rtvue")
        .join("config.json")
}

/// The config file in effect: the `--config` path if given, else the default.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration. An explicit path must exist; a missing default file
/// means defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<RtvueConfig> {
    if let Some(path) = explicit {
        return RtvueConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config {}", path.display());
        Ok(RtvueConfig::from_file(&path)?)
    } else {
        Ok(RtvueConfig::default())
    }
}

/// Build the OCR engine, optionally overriding the model directory.
pub fn create_engine(config: &OcrConfig, model_dir: Option<PathBuf>) -> anyhow::Result<PureOcrEngine> {
    let mut config = config.clone();
    if let Some(dir) = model_dir {
        config.model_dir = dir;
    }

    PureOcrEngine::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))
}
