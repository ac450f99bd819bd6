//! Topology validation errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("cluster name must not be empty")]
    MissingClusterName,

    #[error("service CIDR block must not be empty")]
    MissingServiceCidr,

    #[error("{role} node #{index} has an empty host")]
    MissingHost { role: String, index: usize },
}
