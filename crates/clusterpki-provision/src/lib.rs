//! Cluster certificate provisioning for clusterpki.
//!
//! Creates the cluster CA, issues one certificate per node with SANs
//! derived from the topology, and writes every key/certificate pair to a
//! flat destination directory.

pub mod config;
pub mod error;
pub mod pki;
pub mod setup;
pub mod store;

pub use config::{Config, LogConfig, PkiSettings};
pub use error::{ProvisionError, StoreError};
pub use pki::{LocalPki, PersistedIdentity, Pki, ProvisionReport, CA_IDENTITY};
pub use store::{FileStore, PersistedFiles};
