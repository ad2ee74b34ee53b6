//! # Algorithm-Agnostic Keys
//!
//! [`SigningKey`] and [`PublicKey`] dispatch over the supported JWS
//! algorithms so the credential engine never has to name a curve.

use serde::{Deserialize, Serialize};

use sdvc_core::CryptoError;

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::es256::{P256KeyPair, P256PublicKey};

/// A JWS signature algorithm (`alg` header value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Ed25519 (RFC 8037).
    EdDSA,
    /// ECDSA over P-256 with SHA-256.
    ES256,
}

impl Algorithm {
    /// The registered JWS `alg` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EdDSA => "EdDSA",
            Self::ES256 => "ES256",
        }
    }

    /// Parse a registered JWS `alg` name.
    pub fn from_name(name: &str) -> Result<Self, CryptoError> {
        match name {
            "EdDSA" => Ok(Self::EdDSA),
            "ES256" => Ok(Self::ES256),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the lowercase spellings used on the command line.
        match s.to_ascii_lowercase().as_str() {
            "eddsa" | "ed25519" => Ok(Self::EdDSA),
            "es256" | "p-256" | "p256" => Ok(Self::ES256),
            _ => Err(CryptoError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// A private signing key for one of the supported algorithms.
#[derive(Debug)]
pub enum SigningKey {
    /// Ed25519 key pair.
    Ed25519(Ed25519KeyPair),
    /// P-256 key pair.
    P256(P256KeyPair),
}

impl SigningKey {
    /// Generate a fresh random key for `algorithm`.
    pub fn generate(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::EdDSA => Self::Ed25519(Ed25519KeyPair::generate()),
            Algorithm::ES256 => Self::P256(P256KeyPair::generate()),
        }
    }

    /// The algorithm this key signs with.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Ed25519(_) => Algorithm::EdDSA,
            Self::P256(_) => Algorithm::ES256,
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Ed25519(kp) => PublicKey::Ed25519(kp.public_key()),
            Self::P256(kp) => PublicKey::P256(kp.public_key()),
        }
    }

    /// Sign a message, returning the raw JWS signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Ed25519(kp) => kp.sign(message).as_bytes().to_vec(),
            Self::P256(kp) => kp.sign(message),
        }
    }
}

/// A public verification key for one of the supported algorithms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// Ed25519 public key.
    Ed25519(Ed25519PublicKey),
    /// P-256 public key.
    P256(P256PublicKey),
}

impl PublicKey {
    /// The algorithm this key verifies.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Ed25519(_) => Algorithm::EdDSA,
            Self::P256(_) => Algorithm::ES256,
        }
    }

    /// Verify raw JWS signature bytes over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        match self {
            Self::Ed25519(pk) => pk.verify(message, &Ed25519Signature::from_slice(signature)?),
            Self::P256(pk) => pk.verify(message, signature),
        }
    }
}
