//! # Compact JWS
//!
//! `BASE64URL(header) || '.' || BASE64URL(payload) || '.' || BASE64URL(signature)`
//! (RFC 7515 §7.1).
//!
//! ## Security Invariant
//!
//! Verification pins the algorithm: the caller states which `alg` it
//! expects, the header must carry exactly that value, and the key must be a
//! key for that algorithm. A token can never downgrade the verifier to a
//! different algorithm (or to `none`).

use serde::{Deserialize, Serialize};

use sdvc_core::{base64url_decode, base64url_encode, CanonicalBytes, CryptoError};

use crate::key::{Algorithm, PublicKey, SigningKey};

/// Protected header of a compact JWS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Signature algorithm.
    pub alg: String,
    /// Media type of the complete token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Key identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// A parsed, not yet verified, compact JWS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactJws {
    /// Decoded protected header.
    pub header: JwsHeader,
    header_b64: String,
    payload_b64: String,
    signature: Vec<u8>,
}

impl CompactJws {
    /// The JWS signing input: `header_b64 '.' payload_b64`.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_b64, self.payload_b64)
    }

    /// Decoded payload bytes.
    pub fn payload(&self) -> Result<Vec<u8>, CryptoError> {
        base64url_decode(&self.payload_b64)
            .map_err(|e| CryptoError::VerificationFailed(format!("JWS payload: {e}")))
    }

    /// Verify the signature with `key`, requiring `expected` as the algorithm.
    pub fn verify(&self, key: &PublicKey, expected: Algorithm) -> Result<(), CryptoError> {
        if self.header.alg != expected.as_str() {
            return Err(CryptoError::VerificationFailed(format!(
                "JWS alg {} does not match expected {expected}",
                self.header.alg
            )));
        }
        if key.algorithm() != expected {
            return Err(CryptoError::KeyError(format!(
                "{} key cannot verify {expected} signatures",
                key.algorithm()
            )));
        }
        key.verify(self.signing_input().as_bytes(), &self.signature)
    }
}

/// Sign `payload` into a compact JWS with the given `typ` header.
pub fn sign_compact(key: &SigningKey, typ: &str, payload: &[u8]) -> Result<String, CryptoError> {
    let header = JwsHeader {
        alg: key.algorithm().as_str().to_string(),
        typ: Some(typ.to_string()),
        kid: None,
    };
    let header_bytes = CanonicalBytes::new(&header)
        .map_err(|e| CryptoError::KeyError(format!("JWS header encoding failed: {e}")))?;
    let signing_input = format!("{}.{}", header_bytes.to_base64url(), base64url_encode(payload));
    let signature = key.sign(signing_input.as_bytes());
    Ok(format!("{signing_input}.{}", base64url_encode(signature)))
}

/// Split and decode a compact JWS without checking its signature.
pub fn decode_compact(token: &str) -> Result<CompactJws, CryptoError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = parts.as_slice() else {
        return Err(CryptoError::VerificationFailed(format!(
            "compact JWS must have 3 segments, got {}",
            parts.len()
        )));
    };
    let header_bytes = base64url_decode(header_b64)
        .map_err(|e| CryptoError::VerificationFailed(format!("JWS header: {e}")))?;
    let header: JwsHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| CryptoError::VerificationFailed(format!("JWS header: {e}")))?;
    let signature = base64url_decode(signature_b64)
        .map_err(|e| CryptoError::VerificationFailed(format!("JWS signature: {e}")))?;
    Ok(CompactJws {
        header,
        header_b64: (*header_b64).to_string(),
        payload_b64: (*payload_b64).to_string(),
        signature,
    })
}

/// Decode and verify a compact JWS, returning the parsed token.
pub fn verify_compact(
    token: &str,
    key: &PublicKey,
    expected: Algorithm,
) -> Result<CompactJws, CryptoError> {
    let jws = decode_compact(token)?;
    jws.verify(key, expected)?;
    Ok(jws)
}
