//! # P-256 ECDSA Signing and Verification (`ES256`)
//!
//! Signatures use the fixed-width `r || s` encoding (64 bytes) required by
//! JWS, not ASN.1 DER.

use p256::ecdsa::signature::{Signer, Verifier};
use sdvc_core::CryptoError;

/// A P-256 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct P256PublicKey(p256::ecdsa::VerifyingKey);

/// A P-256 key pair for signing operations.
pub struct P256KeyPair {
    signing_key: p256::ecdsa::SigningKey,
}

impl P256PublicKey {
    /// Build a public key from its affine coordinates (32 bytes each).
    pub fn from_coordinates(x: &[u8], y: &[u8]) -> Result<Self, CryptoError> {
        if x.len() != 32 || y.len() != 32 {
            return Err(CryptoError::KeyError(format!(
                "P-256 coordinates must be 32 bytes, got x={} y={}",
                x.len(),
                y.len()
            )));
        }
        let mut sec1 = Vec::with_capacity(65);
        sec1.push(0x04);
        sec1.extend_from_slice(x);
        sec1.extend_from_slice(y);
        let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
            .map_err(|e| CryptoError::KeyError(format!("invalid P-256 point: {e}")))?;
        Ok(Self(vk))
    }

    /// The affine `(x, y)` coordinates, 32 bytes each.
    pub fn coordinates(&self) -> ([u8; 32], [u8; 32]) {
        let point = self.0.to_encoded_point(false);
        let bytes = point.as_bytes();
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bytes[1..33]);
        y.copy_from_slice(&bytes[33..65]);
        (x, y)
    }

    /// Verify a 64-byte `r || s` signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let sig = p256::ecdsa::Signature::from_slice(signature)
            .map_err(|e| CryptoError::VerificationFailed(format!("malformed ES256 signature: {e}")))?;
        self.0
            .verify(message, &sig)
            .map_err(|e| CryptoError::VerificationFailed(format!("ES256 verification failed: {e}")))
    }
}

impl std::fmt::Debug for P256PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (x, _) = self.coordinates();
        let prefix: String = x.iter().take(4).map(|b| format!("{b:02x}")).collect();
        write!(f, "P256PublicKey({prefix}...)")
    }
}

impl P256KeyPair {
    /// Generate a new random key pair from the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            signing_key: p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Restore a key pair from its 32-byte private scalar.
    pub fn from_scalar(d: &[u8]) -> Result<Self, CryptoError> {
        let signing_key = p256::ecdsa::SigningKey::from_slice(d)
            .map_err(|e| CryptoError::KeyError(format!("invalid P-256 private key: {e}")))?;
        Ok(Self { signing_key })
    }

    /// The 32-byte private scalar, for private JWK export.
    pub fn scalar_bytes(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }

    /// Get the public key from this key pair.
    pub fn public_key(&self) -> P256PublicKey {
        P256PublicKey(*self.signing_key.verifying_key())
    }

    /// Sign a message, returning the 64-byte `r || s` encoding.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: p256::ecdsa::Signature = self.signing_key.sign(message);
        sig.to_bytes().to_vec()
    }
}

impl std::fmt::Debug for P256KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P256KeyPair(<private>)")
    }
}
