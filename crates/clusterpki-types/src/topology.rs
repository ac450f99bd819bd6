//! Cluster topology: the validated plan certificates are derived from.

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::node::{NodeGroups, NodeRole};

/// The cluster description consumed by provisioning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    /// Used as the Common Name of every issued certificate.
    pub cluster_name: String,
    /// CIDR block the cluster's service IPs are allocated from.
    pub service_cidr: String,
    #[serde(default)]
    pub node_groups: NodeGroups,
    #[serde(default)]
    pub certificate_location: CertificateLocation,
}

impl ClusterTopology {
    #[must_use]
    pub fn new(cluster_name: impl Into<String>, service_cidr: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            service_cidr: service_cidr.into(),
            node_groups: NodeGroups::default(),
            certificate_location: CertificateLocation::default(),
        }
    }

    /// Check the fields provisioning relies on.
    ///
    /// The CIDR itself is parsed later, during SAN derivation.
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.cluster_name.trim().is_empty() {
            return Err(TopologyError::MissingClusterName);
        }
        if self.service_cidr.trim().is_empty() {
            return Err(TopologyError::MissingServiceCidr);
        }
        for role in NodeRole::ALL {
            for (index, node) in self.node_groups.get(role).iter().enumerate() {
                if node.host.trim().is_empty() {
                    return Err(TopologyError::MissingHost {
                        role: role.to_string(),
                        index,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Distinguished-name locality fields for issued certificates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateLocation {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn parse_example_plan() {
        let toml_str = r#"
cluster_name = "kismatic"
service_cidr = "172.20.0.0/16"

[certificate_location]
country = "US"
state = "New York"
city = "Troy"

[[node_groups.etcd]]
host = "etcd01"
ip = "10.0.0.1"

[[node_groups.master]]
host = "master01"
ip = "10.0.0.2"
internal_ip = "192.168.1.2"

[[node_groups.worker]]
host = "worker01"
ip = "10.0.0.3"
"#;
        let topology: ClusterTopology = toml::from_str(toml_str).unwrap();
        assert_eq!(topology.cluster_name, "kismatic");
        assert_eq!(topology.node_groups.etcd.len(), 1);
        assert_eq!(topology.node_groups.master[0].internal_ip, "192.168.1.2");
        assert!(topology.node_groups.worker[0].internal_ip.is_empty());
        assert!(topology.node_groups.ingress.is_empty());
        assert_eq!(topology.certificate_location.city, "Troy");
        topology.validate().unwrap();
    }

    #[test]
    fn validate_rejects_missing_name() {
        let topology = ClusterTopology::new("  ", "10.3.0.0/16");
        assert_eq!(topology.validate(), Err(TopologyError::MissingClusterName));
    }

    #[test]
    fn validate_rejects_missing_cidr() {
        let topology = ClusterTopology::new("c", "");
        assert_eq!(topology.validate(), Err(TopologyError::MissingServiceCidr));
    }

    #[test]
    fn validate_rejects_empty_host() {
        let mut topology = ClusterTopology::new("c", "10.3.0.0/16");
        topology.node_groups.push(NodeRole::Worker, Node::new("w1", "10.0.0.1"));
        topology.node_groups.push(NodeRole::Worker, Node::new("", "10.0.0.2"));
        assert_eq!(
            topology.validate(),
            Err(TopologyError::MissingHost {
                role: "worker".to_string(),
                index: 1
            })
        );
    }
}
