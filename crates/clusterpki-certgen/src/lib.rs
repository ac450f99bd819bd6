//! Certificate generation for clusterpki.
//!
//! Builds the self-signed cluster CA, derives node SANs from cluster
//! topology and signs one leaf certificate per node. Certificates are
//! identified by their SHA-256 fingerprint in logs and reports.

pub mod ca;
pub mod error;
pub mod key;
pub mod profile;
pub mod request;
pub mod san;
pub mod sign;

pub use ca::{build_ca, CaMaterial, CertificateAuthority};
pub use error::CertgenError;
pub use key::{KeyAlgorithm, KeyRequest};
pub use profile::{SigningConfig, SigningProfile, DEFAULT_EXPIRY, DEFAULT_PROFILE};
pub use request::{CaRequest, CertificateRequest, Name};
pub use san::{build_node_request, compute_baseline_sans, service_ip, SanSet};
pub use sign::{sign, LocalSigner, Signer};

use rand::RngCore;
use rcgen::SerialNumber;

/// How far `not_before` is set in the past to tolerate clock skew.
pub(crate) const BACKDATE: time::Duration = time::Duration::minutes(5);

/// A generated certificate and private key pair.
#[derive(Debug, Clone)]
pub struct GeneratedCert {
    /// PEM-encoded certificate.
    pub cert_pem: String,
    /// PEM-encoded private key.
    pub key_pem: String,
    /// SHA-256 fingerprint of the DER-encoded certificate.
    pub fingerprint: String,
}

/// Compute SHA-256 fingerprint of DER-encoded certificate bytes.
pub fn sha256_fingerprint(der: &[u8]) -> String {
    use std::fmt::Write;
    let digest = ring::digest::digest(&ring::digest::SHA256, der);
    let mut fingerprint = String::from("SHA256:");
    for (i, byte) in digest.as_ref().iter().enumerate() {
        if i > 0 {
            fingerprint.push(':');
        }
        let _ = write!(fingerprint, "{byte:02x}");
    }
    fingerprint
}

/// 128-bit positive serial number.
pub(crate) fn random_serial() -> SerialNumber {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes[0] &= 0x7f;
    SerialNumber::from(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_format() {
        let fingerprint = sha256_fingerprint(b"certificate");
        assert!(fingerprint.starts_with("SHA256:"));
        // 32 bytes as hex pairs joined by colons
        assert_eq!(fingerprint.len(), "SHA256:".len() + 32 * 3 - 1);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(sha256_fingerprint(b"a"), sha256_fingerprint(b"a"));
        assert_ne!(sha256_fingerprint(b"a"), sha256_fingerprint(b"b"));
    }

    #[test]
    fn serials_differ() {
        assert_ne!(random_serial(), random_serial());
    }
}
