//! Certificate signing requests, in the JSON shape used by cfssl templates.

use std::path::Path;

use clusterpki_types::CertificateLocation;
use rcgen::{DistinguishedName, DnType};
use serde::{Deserialize, Serialize};

use crate::error::CertgenError;
use crate::key::KeyRequest;
use crate::profile::DEFAULT_EXPIRY;

/// One set of distinguished-name fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    #[serde(rename = "C", default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(rename = "ST", default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(rename = "L", default, skip_serializing_if = "String::is_empty")]
    pub locality: String,
    #[serde(rename = "O", default, skip_serializing_if = "String::is_empty")]
    pub organization: String,
    #[serde(rename = "OU", default, skip_serializing_if = "String::is_empty")]
    pub organizational_unit: String,
}

impl From<&CertificateLocation> for Name {
    fn from(location: &CertificateLocation) -> Self {
        Self {
            country: location.country.clone(),
            state: location.state.clone(),
            locality: location.city.clone(),
            ..Self::default()
        }
    }
}

/// Build a distinguished name from a common name and name sets.
///
/// Empty fields are left out.
pub(crate) fn distinguished_name(common_name: &str, names: &[Name]) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    for name in names {
        let fields = [
            (DnType::CountryName, &name.country),
            (DnType::StateOrProvinceName, &name.state),
            (DnType::LocalityName, &name.locality),
            (DnType::OrganizationName, &name.organization),
            (DnType::OrganizationalUnitName, &name.organizational_unit),
        ];
        for (ty, value) in fields {
            if !value.is_empty() {
                dn.push(ty, value.as_str());
            }
        }
    }
    dn.push(DnType::CommonName, common_name);
    dn
}

/// CA-specific part of a CA signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaSettings {
    /// Validity, as a Go-style duration such as `17520h`.
    #[serde(default = "default_expiry")]
    pub expiry: String,
}

impl Default for CaSettings {
    fn default() -> Self {
        Self {
            expiry: default_expiry(),
        }
    }
}

/// Template for the cluster CA.
///
/// ```json
/// {
///   "CN": "kubernetes",
///   "key": { "algo": "rsa", "size": 2048 },
///   "names": [{ "C": "US", "L": "Troy", "O": "Kubernetes", "OU": "CA", "ST": "New York" }],
///   "ca": { "expiry": "17520h" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaRequest {
    #[serde(rename = "CN")]
    pub common_name: String,
    #[serde(default)]
    pub key: KeyRequest,
    #[serde(default)]
    pub names: Vec<Name>,
    #[serde(default)]
    pub ca: CaSettings,
}

impl CaRequest {
    /// A template with the default key and validity.
    #[must_use]
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            key: KeyRequest::default(),
            names: Vec::new(),
            ca: CaSettings::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CertgenError> {
        let request: Self = serde_json::from_str(json)
            .map_err(|e| CertgenError::Template(format!("CA request: {e}")))?;
        if request.common_name.is_empty() {
            return Err(CertgenError::Template(
                "CA request has an empty CN".to_string(),
            ));
        }
        Ok(request)
    }

    pub fn from_file(path: &Path) -> Result<Self, CertgenError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Request for one leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    #[serde(rename = "CN")]
    pub common_name: String,
    pub key: KeyRequest,
    /// Subject alternative names; IP literals become IP SANs, the rest DNS.
    pub hosts: Vec<String>,
    #[serde(default)]
    pub names: Vec<Name>,
}

impl CertificateRequest {
    #[must_use]
    pub fn with_key(mut self, key: KeyRequest) -> Self {
        self.key = key;
        self
    }
}

fn default_expiry() -> String {
    DEFAULT_EXPIRY.to_string()
}
