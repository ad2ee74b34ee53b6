//! # Digest Algorithms
//!
//! Defines `DigestAlgorithm`, the hash used to commit to disclosures and to
//! bind a holder proof to a presentation.
//!
//! The algorithm travels inside the signed payload (`_sd_alg`) using the
//! IANA "Named Information Hash Algorithm" names, so a verifier never has to
//! guess which hash the issuer used.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::encoding::base64url_encode;
use crate::error::CryptoError;

/// The hash algorithm used to produce disclosure digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256, the default.
    #[default]
    #[serde(rename = "sha-256")]
    Sha256,
    /// SHA-384.
    #[serde(rename = "sha-384")]
    Sha384,
    /// SHA-512.
    #[serde(rename = "sha-512")]
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the IANA hash name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
        }
    }

    /// Parse an IANA hash name string.
    pub fn from_name(name: &str) -> Result<Self, CryptoError> {
        match name {
            "sha-256" => Ok(Self::Sha256),
            "sha-384" => Ok(Self::Sha384),
            "sha-512" => Ok(Self::Sha512),
            other => Err(CryptoError::UnsupportedDigest(other.to_string())),
        }
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Hash raw bytes.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Hash raw bytes and render the result as unpadded base64url.
    ///
    /// This is the textual digest form embedded in `_sd` arrays and in
    /// key-binding `sd_hash` claims.
    pub fn digest_base64url(&self, data: &[u8]) -> String {
        base64url_encode(&self.digest(data))
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
