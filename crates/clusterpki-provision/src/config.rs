//! Provisioning configuration loaded from TOML.

use std::path::PathBuf;

use clusterpki_certgen::{KeyRequest, DEFAULT_PROFILE};
use clusterpki_types::NodeRole;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pki: PkiSettings,
    #[serde(default)]
    pub log: LogConfig,
}

/// Where templates come from and where key material goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkiSettings {
    /// CA signing-request template (JSON). A default template with the
    /// cluster name as CN is used when unset.
    #[serde(default)]
    pub ca_csr: Option<PathBuf>,
    /// Signing configuration with named profiles (JSON).
    #[serde(default)]
    pub ca_config: Option<PathBuf>,
    #[serde(default = "default_signing_profile")]
    pub ca_signing_profile: String,
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,
    /// Node roles that receive certificates, in issuing order.
    #[serde(default = "default_roles")]
    pub roles: Vec<NodeRole>,
    #[serde(default)]
    pub node_key: KeyRequest,
}

impl Default for PkiSettings {
    fn default() -> Self {
        Self {
            ca_csr: None,
            ca_config: None,
            ca_signing_profile: default_signing_profile(),
            destination_dir: default_destination_dir(),
            roles: default_roles(),
            node_key: KeyRequest::default(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_signing_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_destination_dir() -> PathBuf {
    PathBuf::from("generated/keys")
}

fn default_roles() -> Vec<NodeRole> {
    NodeRole::CERTIFIED.to_vec()
}

fn default_log_level() -> String {
    "info".to_string()
}
