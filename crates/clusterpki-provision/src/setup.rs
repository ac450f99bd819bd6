//! Config and topology loading.

use std::path::{Path, PathBuf};

use clusterpki_types::ClusterTopology;
use tracing::info;

use crate::config::Config;
use crate::error::ProvisionError;

/// Load configuration from the given path, or the default location.
pub fn load_config(path: Option<&str>) -> Result<Config, ProvisionError> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path(),
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ProvisionError::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ProvisionError::Config(format!("failed to parse config: {e}")))?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else if path.is_some() {
        Err(ProvisionError::Config(format!(
            "config file {} not found",
            config_path.display()
        )))
    } else {
        info!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Load and validate a cluster plan.
pub fn load_topology(path: &Path) -> Result<ClusterTopology, ProvisionError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ProvisionError::Config(format!("failed to read plan {}: {e}", path.display()))
    })?;
    let topology: ClusterTopology = toml::from_str(&content)
        .map_err(|e| ProvisionError::Config(format!("failed to parse plan: {e}")))?;
    topology.validate()?;
    info!(
        path = %path.display(),
        cluster = %topology.cluster_name,
        nodes = topology.node_groups.len(),
        "loaded plan"
    );
    Ok(topology)
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("clusterpki")
}

/// Get the default config file path.
fn default_config_path() -> PathBuf {
    config_dir().join("pki.toml")
}
