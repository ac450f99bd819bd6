//! Subject alternative names derived from cluster topology.

use std::net::Ipv4Addr;

use clusterpki_types::{CertificateLocation, Node};
use ipnetwork::IpNetwork;

use crate::error::CertgenError;
use crate::key::KeyRequest;
use crate::request::{CertificateRequest, Name};

/// In-cluster DNS names of the API service.
pub const SERVICE_DNS_NAMES: [&str; 4] = [
    "kubernetes",
    "kubernetes.default",
    "kubernetes.default.svc",
    "kubernetes.default.svc.cluster.local",
];

/// Service IP of clusters built before the service range was configurable.
pub const LEGACY_SERVICE_IP: &str = "10.3.0.10";

pub const LOOPBACK: &str = "127.0.0.1";

/// Insertion-ordered set of SAN entries. Empty strings are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanSet {
    entries: Vec<String>,
}

impl SanSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry unless it is empty or already present.
    ///
    /// Returns whether the entry was added.
    pub fn insert(&mut self, entry: impl Into<String>) -> bool {
        let entry = entry.into();
        if entry.is_empty() || self.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SanSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SanSet::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

impl From<SanSet> for Vec<String> {
    fn from(set: SanSet) -> Self {
        set.entries
    }
}

/// The cluster service IP: the network address of `cidr` with its last
/// octet incremented by one.
///
/// The increment is plain byte arithmetic and wraps, so blocks with a
/// prefix longer than /24 can yield an address outside the block.
pub fn service_ip(cidr: &str) -> Result<Ipv4Addr, CertgenError> {
    let invalid = |reason: String| CertgenError::InvalidCidr {
        cidr: cidr.to_string(),
        reason,
    };
    // ipnetwork accepts a bare address as /32; a CIDR block needs a prefix.
    if !cidr.contains('/') {
        return Err(invalid("missing prefix length".to_string()));
    }
    let network: IpNetwork = cidr.parse().map_err(|e| invalid(format!("{e}")))?;
    let IpNetwork::V4(network) = network else {
        return Err(invalid("not an IPv4 block".to_string()));
    };
    let mut octets = network.network().octets();
    octets[3] = octets[3].wrapping_add(1);
    Ok(Ipv4Addr::from(octets))
}

/// SANs every node certificate carries: service DNS names, the legacy
/// service IP, loopback and the service IP computed from `service_cidr`.
pub fn compute_baseline_sans(service_cidr: &str) -> Result<SanSet, CertgenError> {
    let service_ip = service_ip(service_cidr)?;
    let mut sans: SanSet = SERVICE_DNS_NAMES.into_iter().collect();
    sans.insert(LEGACY_SERVICE_IP);
    sans.insert(LOOPBACK);
    sans.insert(service_ip.to_string());
    Ok(sans)
}

/// Request for `node`: baseline SANs first, then host, internal IP and IP.
///
/// The Common Name is the cluster name for every node; identities differ
/// only in their SANs.
#[must_use]
pub fn build_node_request(
    node: &Node,
    baseline: &SanSet,
    cluster_name: &str,
    location: &CertificateLocation,
) -> CertificateRequest {
    let mut hosts = baseline.clone();
    for name in node.names() {
        hosts.insert(name);
    }
    CertificateRequest {
        common_name: cluster_name.to_string(),
        key: KeyRequest::default(),
        hosts: hosts.into(),
        names: vec![Name::from(location)],
    }
}
