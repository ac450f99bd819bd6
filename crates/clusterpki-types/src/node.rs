//! Cluster nodes and the roles they are grouped under.

use serde::{Deserialize, Serialize};

/// A single machine in the cluster.
///
/// `ip` and `internal_ip` may be empty, which means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Hostname; unique within a topology and used as the identity name.
    pub host: String,
    /// Externally reachable address.
    #[serde(default)]
    pub ip: String,
    /// Address on the cluster-internal network, if different from `ip`.
    #[serde(default, alias = "internalip")]
    pub internal_ip: String,
}

impl Node {
    #[must_use]
    pub fn new(host: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ip: ip.into(),
            internal_ip: String::new(),
        }
    }

    #[must_use]
    pub fn with_internal_ip(mut self, internal_ip: impl Into<String>) -> Self {
        self.internal_ip = internal_ip.into();
        self
    }

    /// Names this node answers to, in `host`, `internal_ip`, `ip` order.
    ///
    /// Unset (empty) fields are skipped.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [
            self.host.as_str(),
            self.internal_ip.as_str(),
            self.ip.as_str(),
        ]
        .into_iter()
        .filter(|name| !name.is_empty())
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ip.is_empty() {
            write!(f, "{}", self.host)
        } else {
            write!(f, "{} ({})", self.host, self.ip)
        }
    }
}

/// The role a group of nodes plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Control-plane quorum (key-value store) nodes.
    Etcd,
    /// Primary/management nodes.
    Master,
    Worker,
    Ingress,
    Storage,
}

impl NodeRole {
    /// Every role, in topology order.
    pub const ALL: [NodeRole; 5] = [
        NodeRole::Etcd,
        NodeRole::Master,
        NodeRole::Worker,
        NodeRole::Ingress,
        NodeRole::Storage,
    ];

    /// Roles whose nodes receive certificates by default.
    pub const CERTIFIED: [NodeRole; 3] = [NodeRole::Etcd, NodeRole::Master, NodeRole::Worker];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRole::Etcd => "etcd",
            NodeRole::Master => "master",
            NodeRole::Worker => "worker",
            NodeRole::Ingress => "ingress",
            NodeRole::Storage => "storage",
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nodes grouped by role.
///
/// Order within a group is preserved; iteration across groups follows
/// [`NodeRole::ALL`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroups {
    #[serde(default)]
    pub etcd: Vec<Node>,
    #[serde(default)]
    pub master: Vec<Node>,
    #[serde(default)]
    pub worker: Vec<Node>,
    #[serde(default)]
    pub ingress: Vec<Node>,
    #[serde(default)]
    pub storage: Vec<Node>,
}

impl NodeGroups {
    /// Nodes in the given role.
    #[must_use]
    pub fn get(&self, role: NodeRole) -> &[Node] {
        match role {
            NodeRole::Etcd => &self.etcd,
            NodeRole::Master => &self.master,
            NodeRole::Worker => &self.worker,
            NodeRole::Ingress => &self.ingress,
            NodeRole::Storage => &self.storage,
        }
    }

    /// Append a node to a role group.
    pub fn push(&mut self, role: NodeRole, node: Node) {
        let group = match role {
            NodeRole::Etcd => &mut self.etcd,
            NodeRole::Master => &mut self.master,
            NodeRole::Worker => &mut self.worker,
            NodeRole::Ingress => &mut self.ingress,
            NodeRole::Storage => &mut self.storage,
        };
        group.push(node);
    }

    /// Iterate over every role and its nodes in topology order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeRole, &[Node])> {
        NodeRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    /// Concatenate the node lists of `roles`, in the order given.
    ///
    /// A role listed twice contributes its nodes twice.
    #[must_use]
    pub fn select(&self, roles: &[NodeRole]) -> Vec<&Node> {
        roles
            .iter()
            .flat_map(|role| self.get(*role).iter())
            .collect()
    }

    /// Total number of nodes across all roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().map(|(_, nodes)| nodes.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_skip_empty_fields() {
        let node = Node::new("etcd01", "10.0.0.1");
        let names: Vec<_> = node.names().collect();
        assert_eq!(names, vec!["etcd01", "10.0.0.1"]);
    }

    #[test]
    fn names_order_is_host_internal_ip() {
        let node = Node::new("worker1", "10.0.0.5").with_internal_ip("192.168.0.5");
        let names: Vec<_> = node.names().collect();
        assert_eq!(names, vec!["worker1", "192.168.0.5", "10.0.0.5"]);
    }

    #[test]
    fn select_concatenates_in_role_order() {
        let mut groups = NodeGroups::default();
        groups.push(NodeRole::Worker, Node::new("w1", "10.0.0.3"));
        groups.push(NodeRole::Etcd, Node::new("e1", "10.0.0.1"));
        groups.push(NodeRole::Master, Node::new("m1", "10.0.0.2"));
        groups.push(NodeRole::Ingress, Node::new("i1", "10.0.0.4"));

        let hosts: Vec<_> = groups
            .select(&NodeRole::CERTIFIED)
            .into_iter()
            .map(|n| n.host.as_str())
            .collect();
        assert_eq!(hosts, vec!["e1", "m1", "w1"]);
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn empty_groups() {
        let groups = NodeGroups::default();
        assert!(groups.is_empty());
        assert!(groups.select(&NodeRole::ALL).is_empty());
    }

    #[test]
    fn role_serde_lowercase() {
        let json = serde_json::to_string(&NodeRole::Etcd).unwrap();
        assert_eq!(json, "\"etcd\"");
        let role: NodeRole = serde_json::from_str("\"storage\"").unwrap();
        assert_eq!(role, NodeRole::Storage);
    }

    #[test]
    fn node_accepts_legacy_internalip_key() {
        let node: Node =
            serde_json::from_str(r#"{"host":"m1","ip":"10.0.0.2","internalip":"172.16.0.2"}"#)
                .unwrap();
        assert_eq!(node.internal_ip, "172.16.0.2");
    }

    #[test]
    fn node_display() {
        assert_eq!(Node::new("m1", "10.0.0.2").to_string(), "m1 (10.0.0.2)");
        assert_eq!(Node::new("m1", "").to_string(), "m1");
    }
}
