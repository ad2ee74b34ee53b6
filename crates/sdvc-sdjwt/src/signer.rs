//! # Payload Signers
//!
//! The engine hands the canonical payload bytes to a [`Signer`] and gets
//! back a signed envelope. It never looks at keys or algorithms itself.
//! [`JwsSigner`] is the bundled signer producing a compact JWS; any closure
//! `Fn(&[u8]) -> Result<Vec<u8>, SignerError>` is a signer too.

use thiserror::Error;

use sdvc_core::CryptoError;
use sdvc_crypto::{sign_compact, Algorithm, PublicKey, SigningKey};

/// JWS `typ` of an issuer-signed selective disclosure payload.
pub const SD_JWT_TYP: &str = "sd+jwt";

/// Errors a signer may return.
#[derive(Error, Debug)]
pub enum SignerError {
    /// The signer declined to sign (policy, unavailable key, ...).
    #[error("signer rejected payload: {0}")]
    Rejected(String),

    /// The underlying signature operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Signs a serialized blinded payload into an envelope.
pub trait Signer {
    /// Return the signed envelope (a compact JWS, as UTF-8 bytes).
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError>;
}

impl<F> Signer for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, SignerError>,
{
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        self(payload)
    }
}

/// Compact JWS signer over an EdDSA or ES256 key.
#[derive(Debug)]
pub struct JwsSigner {
    key: SigningKey,
    typ: String,
}

impl JwsSigner {
    /// Signer writing `typ: sd+jwt`.
    pub fn new(key: SigningKey) -> Self {
        Self {
            key,
            typ: SD_JWT_TYP.to_string(),
        }
    }

    /// Override the `typ` header.
    pub fn with_typ(mut self, typ: impl Into<String>) -> Self {
        self.typ = typ.into();
        self
    }

    /// The signing algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    /// The verification key matching this signer.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }
}

impl Signer for JwsSigner {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(sign_compact(&self.key, &self.typ, payload)?.into_bytes())
    }
}
