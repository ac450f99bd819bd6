//! Private key requests and key pair generation.

use rcgen::KeyPair;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use crate::error::CertgenError;

/// Public key algorithm of a generated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Rsa,
    Ecdsa,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAlgorithm::Rsa => f.write_str("rsa"),
            KeyAlgorithm::Ecdsa => f.write_str("ecdsa"),
        }
    }
}

/// Algorithm and size of a key to generate, e.g. `{"algo": "rsa", "size": 2048}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    pub algo: KeyAlgorithm,
    pub size: u32,
}

impl KeyRequest {
    #[must_use]
    pub fn rsa(size: u32) -> Self {
        Self {
            algo: KeyAlgorithm::Rsa,
            size,
        }
    }

    #[must_use]
    pub fn ecdsa(size: u32) -> Self {
        Self {
            algo: KeyAlgorithm::Ecdsa,
            size,
        }
    }

    /// Generate a fresh key pair for this request.
    ///
    /// Supported: RSA 2048/3072/4096 and ECDSA P-256/P-384.
    pub fn generate(&self) -> Result<KeyPair, CertgenError> {
        match (self.algo, self.size) {
            (KeyAlgorithm::Rsa, 2048 | 3072 | 4096) => generate_rsa(self.size),
            (KeyAlgorithm::Ecdsa, 256) => KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)
                .map_err(|e| CertgenError::KeyGeneration(e.to_string())),
            (KeyAlgorithm::Ecdsa, 384) => KeyPair::generate_for(&rcgen::PKCS_ECDSA_P384_SHA384)
                .map_err(|e| CertgenError::KeyGeneration(e.to_string())),
            (algo, size) => Err(CertgenError::UnsupportedKey {
                algo: algo.to_string(),
                size,
            }),
        }
    }
}

impl Default for KeyRequest {
    fn default() -> Self {
        Self::rsa(2048)
    }
}

/// ring cannot generate RSA keys; build one with `rsa` and load it as PKCS#8.
fn generate_rsa(bits: u32) -> Result<KeyPair, CertgenError> {
    let bits = usize::try_from(bits).map_err(|e| CertgenError::KeyGeneration(e.to_string()))?;
    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
        .map_err(|e| CertgenError::KeyGeneration(e.to_string()))?;
    let pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CertgenError::KeyGeneration(e.to_string()))?;
    KeyPair::from_pkcs8_pem_and_sign_algo(&pem, &rcgen::PKCS_RSA_SHA256)
        .map_err(|e| CertgenError::KeyGeneration(e.to_string()))
}
