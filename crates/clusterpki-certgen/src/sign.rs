//! Leaf certificate signing.

use std::net::IpAddr;

use rcgen::{CertificateParams, IsCa, SanType};
use time::OffsetDateTime;

use crate::ca::{build_ca, CaMaterial, CertificateAuthority};
use crate::error::CertgenError;
use crate::request::{distinguished_name, CaRequest, CertificateRequest};
use crate::{random_serial, sha256_fingerprint, GeneratedCert, BACKDATE};

/// The X.509 primitive provisioning builds on.
///
/// Implementations are trusted: given a well-formed request and a valid CA
/// they return PEM key material.
pub trait Signer {
    /// Build a CA key pair and self-signed certificate.
    fn build_ca(&self, request: &CaRequest) -> Result<CaMaterial, CertgenError>;

    /// Generate a key for `request` and sign its certificate with `ca`.
    fn sign(
        &self,
        ca: &CertificateAuthority,
        request: &CertificateRequest,
    ) -> Result<GeneratedCert, CertgenError>;
}

impl<T: Signer + ?Sized> Signer for &T {
    fn build_ca(&self, request: &CaRequest) -> Result<CaMaterial, CertgenError> {
        (**self).build_ca(request)
    }

    fn sign(
        &self,
        ca: &CertificateAuthority,
        request: &CertificateRequest,
    ) -> Result<GeneratedCert, CertgenError> {
        (**self).sign(ca, request)
    }
}

/// In-process signer backed by rcgen.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSigner;

impl Signer for LocalSigner {
    fn build_ca(&self, request: &CaRequest) -> Result<CaMaterial, CertgenError> {
        build_ca(request)
    }

    fn sign(
        &self,
        ca: &CertificateAuthority,
        request: &CertificateRequest,
    ) -> Result<GeneratedCert, CertgenError> {
        sign(ca, request)
    }
}

/// Sign a leaf certificate for `request` with `ca`.
pub fn sign(
    ca: &CertificateAuthority,
    request: &CertificateRequest,
) -> Result<GeneratedCert, CertgenError> {
    let key_pair = request.key.generate()?;
    let profile = ca.profile();

    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name(&request.common_name, &request.names);
    params.subject_alt_names = request
        .hosts
        .iter()
        .map(|host| san_entry(host))
        .collect::<Result<_, _>>()?;
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages.clone_from(&profile.key_usages);
    params.extended_key_usages.clone_from(&profile.extended_key_usages);
    params.use_authority_key_identifier_extension = true;
    params.serial_number = Some(random_serial());
    let now = OffsetDateTime::now_utc();
    params.not_before = now - BACKDATE;
    params.not_after = now + profile.validity;

    let cert = params
        .signed_by(&key_pair, ca.cert(), ca.key_pair())
        .map_err(|e| CertgenError::Signing(e.to_string()))?;

    Ok(GeneratedCert {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
        fingerprint: sha256_fingerprint(cert.der()),
    })
}

/// IP literals become IP SANs; anything else must be a valid DNS name.
fn san_entry(host: &str) -> Result<SanType, CertgenError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SanType::IpAddress(ip));
    }
    let name = host
        .try_into()
        .map_err(|e: rcgen::Error| CertgenError::Signing(format!("invalid SAN {host:?}: {e}")))?;
    Ok(SanType::DnsName(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyRequest;
    use crate::profile::{SigningConfig, SigningProfile};
    use crate::request::Name;
    use x509_parser::extensions::GeneralName;
    use x509_parser::pem::parse_x509_pem;

    fn test_ca() -> CertificateAuthority {
        let mut request = CaRequest::new("test-ca");
        request.key = KeyRequest::ecdsa(256);
        let material = build_ca(&request).unwrap();
        CertificateAuthority::new(material, &SigningConfig::default(), "kubernetes").unwrap()
    }

    fn test_request(hosts: &[&str]) -> CertificateRequest {
        CertificateRequest {
            common_name: "cluster".to_string(),
            key: KeyRequest::ecdsa(256),
            hosts: hosts.iter().map(|h| (*h).to_string()).collect(),
            names: vec![Name {
                country: "US".to_string(),
                ..Name::default()
            }],
        }
    }

    #[test]
    fn sign_embeds_sans_and_cn() {
        let ca = test_ca();
        let signed = sign(&ca, &test_request(&["kubernetes", "10.3.0.1", "node1"])).unwrap();

        let (_, pem) = parse_x509_pem(signed.cert_pem.as_bytes()).unwrap();
        let cert = pem.parse_x509().unwrap();
        assert!(!cert.is_ca());
        let cn = cert.subject().iter_common_name().next().unwrap();
        assert_eq!(cn.as_str().unwrap(), "cluster");

        let san = cert.subject_alternative_name().unwrap().unwrap();
        let names = &san.value.general_names;
        assert_eq!(names.len(), 3);
        assert!(matches!(names[0], GeneralName::DNSName("kubernetes")));
        assert!(matches!(names[1], GeneralName::IPAddress(&[10, 3, 0, 1])));
        assert!(matches!(names[2], GeneralName::DNSName("node1")));
    }

    #[test]
    fn signed_by_ca() {
        let ca = test_ca();
        let signed = sign(&ca, &test_request(&["node1"])).unwrap();

        let ca_pem_str = ca.material().cert_pem();
        let (_, ca_pem) = parse_x509_pem(ca_pem_str.as_bytes()).unwrap();
        let ca_cert = ca_pem.parse_x509().unwrap();
        let (_, pem) = parse_x509_pem(signed.cert_pem.as_bytes()).unwrap();
        let cert = pem.parse_x509().unwrap();

        assert_eq!(cert.issuer().to_string(), ca_cert.subject().to_string());
        cert.verify_signature(Some(ca_cert.public_key())).unwrap();
    }

    #[test]
    fn sign_different_each_time() {
        let ca = test_ca();
        let a = sign(&ca, &test_request(&["node1"])).unwrap();
        let b = sign(&ca, &test_request(&["node1"])).unwrap();
        assert_ne!(a.key_pem, b.key_pem);
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn profile_validity_applied() {
        let mut signing = SigningConfig::default();
        signing.profiles.insert(
            "short".to_string(),
            SigningProfile {
                usages: vec!["server auth".to_string()],
                expiry: "1h".to_string(),
            },
        );
        let mut request = CaRequest::new("test-ca");
        request.key = KeyRequest::ecdsa(256);
        let ca = CertificateAuthority::new(build_ca(&request).unwrap(), &signing, "short").unwrap();
        let signed = sign(&ca, &test_request(&["node1"])).unwrap();

        let (_, pem) = parse_x509_pem(signed.cert_pem.as_bytes()).unwrap();
        let cert = pem.parse_x509().unwrap();
        let lifetime =
            cert.validity().not_after.timestamp() - cert.validity().not_before.timestamp();
        assert_eq!(lifetime, 3600 + BACKDATE.whole_seconds());
    }

    #[test]
    fn invalid_dns_name_rejected() {
        let ca = test_ca();
        let err = sign(&ca, &test_request(&["bad name\u{e9}"])).unwrap_err();
        assert!(matches!(err, CertgenError::Signing(_)));
    }

    #[test]
    fn local_signer_delegates() {
        let signer = LocalSigner;
        let mut request = CaRequest::new("test-ca");
        request.key = KeyRequest::ecdsa(256);
        let material = signer.build_ca(&request).unwrap();
        let ca =
            CertificateAuthority::new(material, &SigningConfig::default(), "kubernetes").unwrap();
        let signed = signer.sign(&ca, &test_request(&["node1"])).unwrap();
        assert!(signed.cert_pem.contains("BEGIN CERTIFICATE"));
    }
}
