//! # Base64url Encoding
//!
//! Unpadded URL-safe base64 (RFC 4648 §5) is the only text encoding used in
//! compact credentials: JWS segments, disclosures, salts and digests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use crate::error::EncodingError;

/// Encode bytes as unpadded base64url.
pub fn base64url_encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode unpadded base64url.
pub fn base64url_decode(encoded: &str) -> Result<Vec<u8>, EncodingError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| EncodingError::InvalidBase64(e.to_string()))
}

/// Decode unpadded base64url carrying a UTF-8 JSON document.
pub fn base64url_decode_json(encoded: &str) -> Result<Value, EncodingError> {
    let bytes = base64url_decode(encoded)?;
    let text = std::str::from_utf8(&bytes).map_err(|e| EncodingError::InvalidUtf8(e.to_string()))?;
    serde_json::from_str(text).map_err(|e| EncodingError::InvalidJson(e.to_string()))
}
