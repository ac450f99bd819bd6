//! The cluster PKI: one CA, one certificate per node.

use std::path::PathBuf;

use clusterpki_certgen::{
    build_node_request, compute_baseline_sans, CaRequest, CertificateAuthority, KeyRequest,
    LocalSigner, SanSet, Signer, SigningConfig, DEFAULT_PROFILE,
};
use clusterpki_types::{ClusterTopology, Node, NodeRole};
use tracing::{debug, info};

use crate::config::PkiSettings;
use crate::error::ProvisionError;
use crate::store::FileStore;

/// Identity name the CA's files are written under.
pub const CA_IDENTITY: &str = "ca";

/// Generates certificates for the cluster described by a topology.
pub trait Pki {
    fn generate_cluster_certs(
        &self,
        topology: &ClusterTopology,
    ) -> Result<ProvisionReport, ProvisionError>;
}

/// Files and SANs written for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedIdentity {
    pub identity: String,
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    pub fingerprint: String,
    /// Empty for the CA.
    pub sans: Vec<String>,
}

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub ca: PersistedIdentity,
    /// Node identities in issuing order.
    pub nodes: Vec<PersistedIdentity>,
}

/// File-backed PKI.
///
/// Each run builds a fresh CA, writes it as `ca`, then signs and writes
/// the nodes of the configured roles one at a time. The first failure
/// stops the run; files written before it stay on disk.
#[derive(Debug)]
pub struct LocalPki<S = LocalSigner> {
    ca_request: Option<CaRequest>,
    signing: SigningConfig,
    signing_profile: String,
    roles: Vec<NodeRole>,
    node_key: KeyRequest,
    store: FileStore,
    signer: S,
}

impl LocalPki {
    /// A PKI writing to `destination_dir` with default templates.
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            ca_request: None,
            signing: SigningConfig::default(),
            signing_profile: DEFAULT_PROFILE.to_string(),
            roles: NodeRole::CERTIFIED.to_vec(),
            node_key: KeyRequest::default(),
            store: FileStore::new(destination_dir),
            signer: LocalSigner,
        }
    }

    /// Build from configuration, reading the CA and signing templates.
    pub fn from_settings(settings: &PkiSettings) -> Result<Self, ProvisionError> {
        let mut pki = Self::new(&settings.destination_dir)
            .with_roles(settings.roles.clone())
            .with_node_key(settings.node_key);

        if let Some(path) = &settings.ca_csr {
            let request = CaRequest::from_file(path).map_err(|e| {
                ProvisionError::Config(format!("CA CSR {}: {e}", path.display()))
            })?;
            pki = pki.with_ca_request(request);
        }

        let signing = match &settings.ca_config {
            Some(path) => SigningConfig::from_file(path).map_err(|e| {
                ProvisionError::Config(format!("CA config {}: {e}", path.display()))
            })?,
            None => SigningConfig::default(),
        };
        Ok(pki.with_signing(signing, &settings.ca_signing_profile))
    }
}

impl<S: Signer> LocalPki<S> {
    #[must_use]
    pub fn with_ca_request(mut self, request: CaRequest) -> Self {
        self.ca_request = Some(request);
        self
    }

    #[must_use]
    pub fn with_signing(mut self, signing: SigningConfig, profile: &str) -> Self {
        self.signing = signing;
        self.signing_profile = profile.to_string();
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<NodeRole>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn with_node_key(mut self, key: KeyRequest) -> Self {
        self.node_key = key;
        self
    }

    /// Swap the signing primitive.
    pub fn with_signer<T: Signer>(self, signer: T) -> LocalPki<T> {
        LocalPki {
            ca_request: self.ca_request,
            signing: self.signing,
            signing_profile: self.signing_profile,
            roles: self.roles,
            node_key: self.node_key,
            store: self.store,
            signer,
        }
    }

    #[must_use]
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    #[must_use]
    pub fn roles(&self) -> &[NodeRole] {
        &self.roles
    }

    /// CA template for `topology`: the configured one, or a default named
    /// after the cluster.
    fn ca_request(&self, topology: &ClusterTopology) -> CaRequest {
        self.ca_request
            .clone()
            .unwrap_or_else(|| CaRequest::new(&topology.cluster_name))
    }
}

impl<S: Signer> Pki for LocalPki<S> {
    fn generate_cluster_certs(
        &self,
        topology: &ClusterTopology,
    ) -> Result<ProvisionReport, ProvisionError> {
        // CA first; nothing touches the disk until it exists.
        let material = self
            .signer
            .build_ca(&self.ca_request(topology))
            .map_err(|source| ProvisionError::CaGeneration { source })?;
        let ca = CertificateAuthority::new(material, &self.signing, &self.signing_profile)
            .map_err(|source| ProvisionError::CaGeneration { source })?;

        let fingerprint = ca.material().fingerprint();
        let files = self
            .store
            .persist(
                CA_IDENTITY,
                ca.material().key_pem().as_bytes(),
                ca.material().cert_pem().as_bytes(),
            )
            .map_err(|source| ProvisionError::Store {
                identity: CA_IDENTITY.to_string(),
                source,
            })?;
        info!(fingerprint = %fingerprint, dir = %self.store.dir().display(), "generated cluster CA");
        let ca_identity = PersistedIdentity {
            identity: CA_IDENTITY.to_string(),
            key_path: files.key_path,
            cert_path: files.cert_path,
            fingerprint,
            sans: Vec::new(),
        };

        let baseline = compute_baseline_sans(&topology.service_cidr).map_err(|source| {
            ProvisionError::InvalidCidr {
                cidr: topology.service_cidr.clone(),
                source,
            }
        })?;
        debug!(sans = ?baseline.as_slice(), "computed baseline SANs");

        let run = IssueContext {
            ca: &ca,
            store: &self.store,
            signer: &self.signer,
            baseline: &baseline,
            topology,
            node_key: self.node_key,
        };
        let nodes = topology
            .node_groups
            .select(&self.roles)
            .into_iter()
            .map(|node| run.issue(node))
            .collect::<Result<Vec<_>, _>>()?;

        info!(nodes = nodes.len(), "cluster certificates generated");
        Ok(ProvisionReport {
            ca: ca_identity,
            nodes,
        })
    }
}

/// State shared by every node certificate in one run.
struct IssueContext<'a, S> {
    ca: &'a CertificateAuthority,
    store: &'a FileStore,
    signer: &'a S,
    baseline: &'a SanSet,
    topology: &'a ClusterTopology,
    node_key: KeyRequest,
}

impl<S: Signer> IssueContext<'_, S> {
    fn issue(&self, node: &Node) -> Result<PersistedIdentity, ProvisionError> {
        info!(%node, "generating certificates");
        let request = build_node_request(
            node,
            self.baseline,
            &self.topology.cluster_name,
            &self.topology.certificate_location,
        )
        .with_key(self.node_key);

        let signed = self
            .signer
            .sign(self.ca, &request)
            .map_err(|source| ProvisionError::Signing {
                host: node.host.clone(),
                source,
            })?;

        let files = self
            .store
            .persist(
                &node.host,
                signed.key_pem.as_bytes(),
                signed.cert_pem.as_bytes(),
            )
            .map_err(|source| ProvisionError::Store {
                identity: node.host.clone(),
                source,
            })?;

        Ok(PersistedIdentity {
            identity: node.host.clone(),
            key_path: files.key_path,
            cert_path: files.cert_path,
            fingerprint: signed.fingerprint,
            sans: request.hosts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterpki_certgen::SigningProfile;

    #[test]
    fn new_uses_defaults() {
        let pki = LocalPki::new("keys");
        assert_eq!(pki.roles(), &NodeRole::CERTIFIED);
        assert_eq!(pki.store().dir(), std::path::Path::new("keys"));
        assert_eq!(pki.signing_profile, "kubernetes");
    }

    #[test]
    fn default_ca_request_named_after_cluster() {
        let pki = LocalPki::new("keys");
        let topology = ClusterTopology::new("prod", "10.3.0.0/16");
        assert_eq!(pki.ca_request(&topology).common_name, "prod");

        let pki = pki.with_ca_request(CaRequest::new("custom"));
        assert_eq!(pki.ca_request(&topology).common_name, "custom");
    }

    #[test]
    fn from_settings_reads_templates() {
        let tmp = tempfile::tempdir().unwrap();
        let csr_path = tmp.path().join("ca-csr.json");
        std::fs::write(
            &csr_path,
            r#"{"CN":"Kubernetes","key":{"algo":"ecdsa","size":256}}"#,
        )
        .unwrap();
        let config_path = tmp.path().join("ca-config.json");
        std::fs::write(
            &config_path,
            r#"{"signing":{"profiles":{"short":{"usages":["server auth"],"expiry":"1h"}}}}"#,
        )
        .unwrap();

        let settings = PkiSettings {
            ca_csr: Some(csr_path),
            ca_config: Some(config_path),
            ca_signing_profile: "short".to_string(),
            roles: vec![NodeRole::Worker],
            ..PkiSettings::default()
        };
        let pki = LocalPki::from_settings(&settings).unwrap();
        assert_eq!(pki.ca_request.as_ref().unwrap().common_name, "Kubernetes");
        assert_eq!(
            pki.signing.profile("short"),
            &SigningProfile {
                usages: vec!["server auth".to_string()],
                expiry: "1h".to_string(),
            }
        );
        assert_eq!(pki.roles(), &[NodeRole::Worker]);
    }

    #[test]
    fn from_settings_missing_template() {
        let settings = PkiSettings {
            ca_csr: Some(PathBuf::from("/nonexistent/ca-csr.json")),
            ..PkiSettings::default()
        };
        let err = LocalPki::from_settings(&settings).unwrap_err();
        assert!(matches!(err, ProvisionError::Config(_)));
    }
}
