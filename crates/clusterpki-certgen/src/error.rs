//! Certificate generation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertgenError {
    #[error("CA generation failed: {0}")]
    CaGeneration(String),

    #[error("certificate signing failed: {0}")]
    Signing(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("unsupported key request: {algo} {size}")]
    UnsupportedKey { algo: String, size: u32 },

    #[error("invalid CIDR block {cidr:?}: {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("invalid signing profile: {0}")]
    Profile(String),

    #[error("malformed template: {0}")]
    Template(String),

    #[error("failed to read template: {0}")]
    Io(#[from] std::io::Error),
}
