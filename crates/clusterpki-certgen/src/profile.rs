//! Signing configuration: named profiles of key usages and validity.

use std::collections::BTreeMap;
use std::path::Path;

use rcgen::{ExtendedKeyUsagePurpose, KeyUsagePurpose};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::debug;

use crate::error::CertgenError;

/// Default validity of issued certificates: two years.
pub const DEFAULT_EXPIRY: &str = "17520h";

/// Profile name the installer signs node certificates with.
pub const DEFAULT_PROFILE: &str = "kubernetes";

/// Usages and validity applied to a signed certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningProfile {
    #[serde(default = "default_usages")]
    pub usages: Vec<String>,
    #[serde(default = "default_expiry")]
    pub expiry: String,
}

impl Default for SigningProfile {
    fn default() -> Self {
        Self {
            usages: default_usages(),
            expiry: default_expiry(),
        }
    }
}

impl SigningProfile {
    /// Parse the profile into the form certificate parameters need.
    pub fn resolve(&self) -> Result<ResolvedProfile, CertgenError> {
        let validity = parse_duration(&self.expiry).ok_or_else(|| {
            CertgenError::Profile(format!("invalid expiry {:?}", self.expiry))
        })?;

        let mut key_usages = Vec::new();
        let mut extended_key_usages = Vec::new();
        for usage in &self.usages {
            match usage.to_ascii_lowercase().as_str() {
                "signing" | "digital signature" => {
                    key_usages.push(KeyUsagePurpose::DigitalSignature);
                }
                "content commitment" => key_usages.push(KeyUsagePurpose::ContentCommitment),
                "key encipherment" => key_usages.push(KeyUsagePurpose::KeyEncipherment),
                "data encipherment" => key_usages.push(KeyUsagePurpose::DataEncipherment),
                "key agreement" => key_usages.push(KeyUsagePurpose::KeyAgreement),
                "cert sign" => key_usages.push(KeyUsagePurpose::KeyCertSign),
                "crl sign" => key_usages.push(KeyUsagePurpose::CrlSign),
                "server auth" => extended_key_usages.push(ExtendedKeyUsagePurpose::ServerAuth),
                "client auth" => extended_key_usages.push(ExtendedKeyUsagePurpose::ClientAuth),
                "code signing" => extended_key_usages.push(ExtendedKeyUsagePurpose::CodeSigning),
                "email protection" => {
                    extended_key_usages.push(ExtendedKeyUsagePurpose::EmailProtection);
                }
                "timestamping" => extended_key_usages.push(ExtendedKeyUsagePurpose::TimeStamping),
                "ocsp signing" => extended_key_usages.push(ExtendedKeyUsagePurpose::OcspSigning),
                other => {
                    return Err(CertgenError::Profile(format!("unknown usage {other:?}")));
                }
            }
        }
        key_usages.dedup();
        extended_key_usages.dedup();

        Ok(ResolvedProfile {
            validity,
            key_usages,
            extended_key_usages,
        })
    }
}

/// A [`SigningProfile`] with its expiry and usages parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    pub validity: Duration,
    pub key_usages: Vec<KeyUsagePurpose>,
    pub extended_key_usages: Vec<ExtendedKeyUsagePurpose>,
}

/// A default profile plus named profiles.
///
/// Loaded from the JSON shape
/// `{"signing": {"default": {...}, "profiles": {"kubernetes": {...}}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfig {
    #[serde(default)]
    pub default: SigningProfile,
    #[serde(default)]
    pub profiles: BTreeMap<String, SigningProfile>,
}

#[derive(Deserialize)]
struct SigningConfigFile {
    signing: SigningConfig,
}

impl SigningConfig {
    pub fn from_json(json: &str) -> Result<Self, CertgenError> {
        let file: SigningConfigFile = serde_json::from_str(json)
            .map_err(|e| CertgenError::Template(format!("signing config: {e}")))?;
        Ok(file.signing)
    }

    pub fn from_file(path: &Path) -> Result<Self, CertgenError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Look up a named profile, falling back to the default profile.
    #[must_use]
    pub fn profile(&self, name: &str) -> &SigningProfile {
        if let Some(profile) = self.profiles.get(name) {
            profile
        } else {
            debug!(profile = %name, "unknown signing profile, using default");
            &self.default
        }
    }
}

/// Parse a Go-style duration made of `h`, `m` and `s` components, e.g.
/// `17520h` or `1h30m`. Zero and negative durations are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut total = Duration::ZERO;
    let mut digits = String::new();
    for c in input.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: i64 = digits.parse().ok()?;
        digits.clear();
        let component = match c {
            'h' => Duration::hours(value),
            'm' => Duration::minutes(value),
            's' => Duration::seconds(value),
            _ => return None,
        };
        total = total.checked_add(component)?;
    }
    if !digits.is_empty() || total <= Duration::ZERO {
        return None;
    }
    Some(total)
}

fn default_usages() -> Vec<String> {
    ["signing", "key encipherment", "server auth", "client auth"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_expiry() -> String {
    DEFAULT_EXPIRY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_durations() {
        assert_eq!(parse_duration("17520h"), Some(Duration::hours(17520)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("90s"), Some(Duration::seconds(90)));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0h"), None);
        assert_eq!(parse_duration("12"), None);
        assert_eq!(parse_duration("3d"), None);
        assert_eq!(parse_duration("h"), None);
    }

    #[test]
    fn parse_signing_config() {
        let json = r#"{
            "signing": {
                "default": { "expiry": "168h" },
                "profiles": {
                    "kubernetes": {
                        "usages": ["signing", "key encipherment", "server auth", "client auth"],
                        "expiry": "8760h"
                    }
                }
            }
        }"#;
        let config = SigningConfig::from_json(json).unwrap();
        assert_eq!(config.default.expiry, "168h");
        assert_eq!(config.profile("kubernetes").expiry, "8760h");
        assert_eq!(config.profile("missing").expiry, "168h");
    }

    #[test]
    fn malformed_signing_config() {
        assert!(matches!(
            SigningConfig::from_json(r#"{ "profiles": {} }"#),
            Err(CertgenError::Template(_))
        ));
    }

    #[test]
    fn resolve_default_profile() {
        let resolved = SigningProfile::default().resolve().unwrap();
        assert_eq!(resolved.validity, Duration::hours(17520));
        assert_eq!(
            resolved.key_usages,
            vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::KeyEncipherment
            ]
        );
        assert_eq!(
            resolved.extended_key_usages,
            vec![
                ExtendedKeyUsagePurpose::ServerAuth,
                ExtendedKeyUsagePurpose::ClientAuth
            ]
        );
    }

    #[test]
    fn resolve_rejects_unknown_usage() {
        let profile = SigningProfile {
            usages: vec!["teleportation".to_string()],
            expiry: DEFAULT_EXPIRY.to_string(),
        };
        assert!(matches!(profile.resolve(), Err(CertgenError::Profile(_))));
    }

    #[test]
    fn resolve_rejects_bad_expiry() {
        let profile = SigningProfile {
            usages: Vec::new(),
            expiry: "forever".to_string(),
        };
        assert!(matches!(profile.resolve(), Err(CertgenError::Profile(_))));
    }
}
