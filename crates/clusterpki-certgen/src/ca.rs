//! Self-signed certificate authority construction.

use rcgen::{BasicConstraints, Certificate, CertificateParams, IsCa, KeyPair, KeyUsagePurpose};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::CertgenError;
use crate::profile::{parse_duration, ResolvedProfile, SigningConfig};
use crate::request::{distinguished_name, CaRequest};
use crate::{random_serial, sha256_fingerprint, BACKDATE};

/// Key pair and self-signed certificate produced by [`build_ca`].
pub struct CaMaterial {
    pub(crate) cert: Certificate,
    pub(crate) key_pair: KeyPair,
}

impl CaMaterial {
    /// PEM-encoded CA certificate.
    #[must_use]
    pub fn cert_pem(&self) -> String {
        self.cert.pem()
    }

    /// PEM-encoded CA private key.
    #[must_use]
    pub fn key_pem(&self) -> String {
        self.key_pair.serialize_pem()
    }

    /// SHA-256 fingerprint of the DER-encoded CA certificate.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        sha256_fingerprint(self.cert.der())
    }
}

impl std::fmt::Debug for CaMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaMaterial")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Generate a CA key pair and self-signed certificate from a template.
pub fn build_ca(request: &CaRequest) -> Result<CaMaterial, CertgenError> {
    let validity = parse_duration(&request.ca.expiry).ok_or_else(|| {
        CertgenError::CaGeneration(format!("invalid CA expiry {:?}", request.ca.expiry))
    })?;
    let key_pair = request.key.generate()?;

    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name(&request.common_name, &request.names);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params.serial_number = Some(random_serial());
    let now = OffsetDateTime::now_utc();
    params.not_before = now - BACKDATE;
    params.not_after = now + validity;

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| CertgenError::CaGeneration(e.to_string()))?;

    debug!(cn = %request.common_name, key = %request.key.algo, "built self-signed CA");
    Ok(CaMaterial { cert, key_pair })
}

/// The CA used to sign every node certificate in a run.
///
/// Holds the CA key in memory together with the signing profile that
/// issued certificates get.
pub struct CertificateAuthority {
    material: CaMaterial,
    profile_name: String,
    profile: ResolvedProfile,
}

impl CertificateAuthority {
    /// Pair CA material with the named profile from `signing`.
    pub fn new(
        material: CaMaterial,
        signing: &SigningConfig,
        profile_name: &str,
    ) -> Result<Self, CertgenError> {
        let profile = signing.profile(profile_name).resolve()?;
        Ok(Self {
            material,
            profile_name: profile_name.to_string(),
            profile,
        })
    }

    #[must_use]
    pub fn material(&self) -> &CaMaterial {
        &self.material
    }

    #[must_use]
    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    #[must_use]
    pub fn profile(&self) -> &ResolvedProfile {
        &self.profile
    }

    /// Validity given to issued certificates.
    #[must_use]
    pub fn validity(&self) -> Duration {
        self.profile.validity
    }

    pub(crate) fn cert(&self) -> &Certificate {
        &self.material.cert
    }

    pub(crate) fn key_pair(&self) -> &KeyPair {
        &self.material.key_pair
    }
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("material", &self.material)
            .field("profile_name", &self.profile_name)
            .finish_non_exhaustive()
    }
}
