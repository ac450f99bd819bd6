//! Provisioning errors.

use std::path::PathBuf;

use clusterpki_certgen::CertgenError;
use clusterpki_types::TopologyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to create CA cert: {source}")]
    CaGeneration {
        #[source]
        source: CertgenError,
    },

    #[error("error parsing service CIDR block {cidr:?}: {source}")]
    InvalidCidr {
        cidr: String,
        #[source]
        source: CertgenError,
    },

    #[error("error generating certs for node {host:?}: {source}")]
    Signing {
        host: String,
        #[source]
        source: CertgenError,
    },

    #[error("error writing cert files for {identity:?}: {source}")]
    Store {
        identity: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProvisionError {
    /// The identity (`ca` or a node host) the failure occurred for, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        match self {
            Self::CaGeneration { .. } => Some(crate::pki::CA_IDENTITY),
            Self::Signing { host, .. } => Some(host),
            Self::Store { identity, .. } => Some(identity),
            Self::InvalidCidr { .. } | Self::Topology(_) | Self::Config(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("error creating destination dir {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
