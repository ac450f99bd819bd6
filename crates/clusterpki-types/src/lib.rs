//! Shared types for clusterpki.
//!
//! This crate contains the cluster topology model shared across the
//! clusterpki workspace: nodes, node roles, role groups and the
//! certificate location fields used in distinguished names.

pub mod error;
pub mod node;
pub mod topology;

pub use error::TopologyError;
pub use node::{Node, NodeGroups, NodeRole};
pub use topology::{CertificateLocation, ClusterTopology};
