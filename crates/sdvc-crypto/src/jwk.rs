//! # JSON Web Keys
//!
//! RFC 7517 / RFC 8037 key representation for the two supported curves:
//!
//! - `{"kty":"OKP","crv":"Ed25519","x":...}`
//! - `{"kty":"EC","crv":"P-256","x":...,"y":...}`
//!
//! The private member `d` is only present on keys exported with
//! [`Jwk::from_signing_key()`]. [`Jwk::to_public()`] strips it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sdvc_core::{base64url_decode, base64url_encode, CryptoError};

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey};
use crate::es256::{P256KeyPair, P256PublicKey};
use crate::key::{Algorithm, PublicKey, SigningKey};

/// A JSON Web Key for an Ed25519 or P-256 key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `OKP` or `EC`.
    pub kty: String,
    /// Curve: `Ed25519` or `P-256`.
    pub crv: String,
    /// Public key (Ed25519) or x coordinate (P-256), base64url.
    pub x: String,
    /// y coordinate (P-256 only), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Private key material, base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// Optional key identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Jwk {
    /// Public JWK for a verification key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        match key {
            PublicKey::Ed25519(pk) => Self {
                kty: "OKP".to_string(),
                crv: "Ed25519".to_string(),
                x: pk.to_base64url(),
                y: None,
                d: None,
                kid: None,
            },
            PublicKey::P256(pk) => {
                let (x, y) = pk.coordinates();
                Self {
                    kty: "EC".to_string(),
                    crv: "P-256".to_string(),
                    x: base64url_encode(x),
                    y: Some(base64url_encode(y)),
                    d: None,
                    kid: None,
                }
            }
        }
    }

    /// Private JWK (includes `d`) for a signing key.
    pub fn from_signing_key(key: &SigningKey) -> Self {
        let mut jwk = Self::from_public_key(&key.public_key());
        jwk.d = Some(match key {
            SigningKey::Ed25519(kp) => base64url_encode(kp.seed_bytes()),
            SigningKey::P256(kp) => base64url_encode(kp.scalar_bytes()),
        });
        jwk
    }

    /// Copy of this key with private material removed.
    pub fn to_public(&self) -> Self {
        Self {
            d: None,
            ..self.clone()
        }
    }

    /// Whether this JWK carries private key material.
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// The JWS algorithm implied by `kty`/`crv`.
    pub fn algorithm(&self) -> Result<Algorithm, CryptoError> {
        match (self.kty.as_str(), self.crv.as_str()) {
            ("OKP", "Ed25519") => Ok(Algorithm::EdDSA),
            ("EC", "P-256") => Ok(Algorithm::ES256),
            (kty, crv) => Err(CryptoError::UnsupportedAlgorithm(format!(
                "kty={kty} crv={crv}"
            ))),
        }
    }

    /// Decode the public key.
    pub fn to_public_key(&self) -> Result<PublicKey, CryptoError> {
        let x = decode_member("x", &self.x)?;
        match self.algorithm()? {
            Algorithm::EdDSA => Ok(PublicKey::Ed25519(Ed25519PublicKey::from_slice(&x)?)),
            Algorithm::ES256 => {
                let y = self
                    .y
                    .as_deref()
                    .ok_or_else(|| CryptoError::KeyError("P-256 JWK is missing y".to_string()))?;
                let y = decode_member("y", y)?;
                Ok(PublicKey::P256(P256PublicKey::from_coordinates(&x, &y)?))
            }
        }
    }

    /// Decode the private key, checking it matches the public members.
    pub fn to_signing_key(&self) -> Result<SigningKey, CryptoError> {
        let d = self
            .d
            .as_deref()
            .ok_or_else(|| CryptoError::KeyError("JWK has no private member d".to_string()))?;
        let d = decode_member("d", d)?;
        let key = match self.algorithm()? {
            Algorithm::EdDSA => {
                let seed: [u8; 32] = d.as_slice().try_into().map_err(|_| {
                    CryptoError::KeyError(format!("Ed25519 d must be 32 bytes, got {}", d.len()))
                })?;
                SigningKey::Ed25519(Ed25519KeyPair::from_seed(&seed))
            }
            Algorithm::ES256 => SigningKey::P256(P256KeyPair::from_scalar(&d)?),
        };
        if key.public_key() != self.to_public_key()? {
            return Err(CryptoError::KeyError(
                "JWK private member does not match its public key".to_string(),
            ));
        }
        Ok(key)
    }

    /// Parse a JWK from a JSON value (e.g. a `cnf.jwk` claim).
    pub fn from_value(value: &Value) -> Result<Self, CryptoError> {
        serde_json::from_value(value.clone()).map_err(|e| CryptoError::KeyError(format!("invalid JWK: {e}")))
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Value {
        // A struct of strings always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("crv", &self.crv)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("d", &self.d.as_ref().map(|_| "<private>"))
            .field("kid", &self.kid)
            .finish()
    }
}

fn decode_member(name: &str, encoded: &str) -> Result<Vec<u8>, CryptoError> {
    base64url_decode(encoded).map_err(|e| CryptoError::KeyError(format!("JWK member {name}: {e}")))
}
