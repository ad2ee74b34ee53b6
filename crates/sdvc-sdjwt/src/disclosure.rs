//! # Disclosures
//!
//! A disclosure reveals one blinded claim:
//!
//! - object property: `[salt, name, value]`
//! - array element: `[salt, value]`
//!
//! The array is serialized with RFC 8785 canonicalization and then
//! base64url-encoded. Its digest is `base64url(H(ascii(encoded)))`, which is
//! what the signed payload references from `_sd` arrays and `{"...": d}`
//! array slots.
//!
//! ## Security Invariant
//!
//! Parsing a disclosure re-encodes its decoded content canonically, so the
//! digest a verifier computes is always a function of `(salt, name, value)`
//! and never of incidental whitespace or key order in the received text.

use serde_json::{json, Value};

use sdvc_core::{base64url_decode_json, CanonicalBytes, DigestAlgorithm, EncodingError};

use crate::error::SdJwtError;

/// Object key holding the sorted digests of blinded properties.
pub const SD_CLAIM: &str = "_sd";
/// Top-level claim naming the disclosure digest algorithm.
pub const SD_ALG_CLAIM: &str = "_sd_alg";
/// Key of the single-entry object that stands in for a blinded array element.
pub const ARRAY_DIGEST_KEY: &str = "...";
/// Top-level confirmation claim carrying the holder's public key.
pub const CNF_CLAIM: &str = "cnf";

/// Claim names that can never be blinded or disclosed.
pub const RESERVED_CLAIM_NAMES: [&str; 3] = [SD_CLAIM, SD_ALG_CLAIM, ARRAY_DIGEST_KEY];

/// Whether `name` is reserved by the disclosure format.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIM_NAMES.contains(&name)
}

/// A single salted claim disclosure.
#[derive(Debug, Clone, PartialEq)]
pub struct Disclosure {
    salt: String,
    name: Option<String>,
    value: Value,
    encoded: String,
}

impl Disclosure {
    /// Disclosure for an object property.
    pub fn for_property(
        salt: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Self, SdJwtError> {
        Self::build(salt.into(), Some(name.into()), value)
    }

    /// Disclosure for an array element.
    pub fn for_element(salt: impl Into<String>, value: Value) -> Result<Self, SdJwtError> {
        Self::build(salt.into(), None, value)
    }

    fn build(salt: String, name: Option<String>, value: Value) -> Result<Self, SdJwtError> {
        let array = match &name {
            Some(n) => json!([salt, n, value]),
            None => json!([salt, value]),
        };
        let encoded = CanonicalBytes::from_value(array)?.to_base64url();
        Ok(Self {
            salt,
            name,
            value,
            encoded,
        })
    }

    /// Decode a base64url disclosure.
    ///
    /// The result carries the canonical re-encoding, not `encoded`. A
    /// disclosure produced by an issuer that does not canonicalize its JSON
    /// therefore hashes differently here and will not match that issuer's
    /// digests.
    pub fn parse(encoded: &str) -> Result<Self, EncodingError> {
        let decoded = base64url_decode_json(encoded)?;
        let Value::Array(mut parts) = decoded else {
            return Err(EncodingError::InvalidJson(
                "disclosure is not a JSON array".to_string(),
            ));
        };
        let (salt, name, value) = match parts.len() {
            2 => {
                let value = parts.pop().unwrap_or(Value::Null);
                (parts.pop(), None, value)
            }
            3 => {
                let value = parts.pop().unwrap_or(Value::Null);
                let name = match parts.pop() {
                    Some(Value::String(n)) => n,
                    _ => {
                        return Err(EncodingError::InvalidJson(
                            "disclosure claim name must be a string".to_string(),
                        ))
                    }
                };
                (parts.pop(), Some(name), value)
            }
            n => {
                return Err(EncodingError::InvalidJson(format!(
                    "disclosure must have 2 or 3 elements, got {n}"
                )))
            }
        };
        let Some(Value::String(salt)) = salt else {
            return Err(EncodingError::InvalidJson(
                "disclosure salt must be a string".to_string(),
            ));
        };
        Self::build(salt, name, value)
            .map_err(|e| EncodingError::InvalidJson(format!("disclosure re-encoding: {e}")))
    }

    /// The salt.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// The claim name; `None` for array elements.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The disclosed value (already blinded itself for recursive claims).
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Canonical base64url encoding.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Digest of the encoded disclosure under `algorithm`.
    pub fn digest(&self, algorithm: DigestAlgorithm) -> String {
        algorithm.digest_base64url(self.encoded.as_bytes())
    }
}

impl std::fmt::Display for Disclosure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// If `item` is a blinded array slot `{"...": digest}`, return the digest.
pub fn array_slot_digest(item: &Value) -> Option<&str> {
    match item {
        Value::Object(map) if map.len() == 1 => map.get(ARRAY_DIGEST_KEY)?.as_str(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_disclosure_encoding() {
        let d = Disclosure::for_property("_26bc4LT-ac6q2KI6cBW5es", "family_name", json!("Möbius"))
            .unwrap();
        let decoded = base64url_decode_json(d.encoded()).unwrap();
        assert_eq!(decoded, json!(["_26bc4LT-ac6q2KI6cBW5es", "family_name", "Möbius"]));
        assert_eq!(d.name(), Some("family_name"));
    }

    #[test]
    fn test_element_disclosure_encoding() {
        let d = Disclosure::for_element("lklxF5jMYlGTPUovMNIvCA", json!("FR")).unwrap();
        let decoded = base64url_decode_json(d.encoded()).unwrap();
        assert_eq!(decoded, json!(["lklxF5jMYlGTPUovMNIvCA", "FR"]));
        assert_eq!(d.name(), None);
    }

    #[test]
    fn test_parse_roundtrip() {
        let d = Disclosure::for_property("salt", "address", json!({"_sd": ["abc"]})).unwrap();
        let parsed = Disclosure::parse(d.encoded()).unwrap();
        assert_eq!(parsed, d);
        assert_eq!(
            parsed.digest(DigestAlgorithm::Sha256),
            d.digest(DigestAlgorithm::Sha256)
        );
    }

    #[test]
    fn test_parse_canonicalizes_whitespace() {
        // `["salt", "age", 42]` with spaces, as another encoder might emit it.
        let spaced = sdvc_core::base64url_encode(br#"["salt", "age", 42]"#);
        let parsed = Disclosure::parse(&spaced).unwrap();
        let canonical = Disclosure::for_property("salt", "age", json!(42)).unwrap();
        assert_eq!(parsed.encoded(), canonical.encoded());
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for bad in [
            json!({"salt": "x"}),
            json!(["only-salt"]),
            json!(["s", "n", "v", "extra"]),
            json!([1, "n", "v"]),
            json!(["s", 7, "v"]),
        ] {
            let encoded = sdvc_core::base64url_encode(bad.to_string());
            assert!(Disclosure::parse(&encoded).is_err(), "accepted {bad}");
        }
        assert!(Disclosure::parse("not base64!").is_err());
    }

    #[test]
    fn test_digests_differ_by_salt() {
        let a = Disclosure::for_property("salt-a", "age", json!(30)).unwrap();
        let b = Disclosure::for_property("salt-b", "age", json!(30)).unwrap();
        assert_ne!(
            a.digest(DigestAlgorithm::Sha256),
            b.digest(DigestAlgorithm::Sha256)
        );
    }

    #[test]
    fn test_array_slot_requires_single_key() {
        assert_eq!(array_slot_digest(&json!({"...": "d"})), Some("d"));
        assert_eq!(array_slot_digest(&json!({"...": "d", "x": 1})), None);
        assert_eq!(array_slot_digest(&json!({"...": 5})), None);
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved("_sd"));
        assert!(is_reserved("_sd_alg"));
        assert!(is_reserved("..."));
        assert!(!is_reserved("cnf"));
        assert!(!is_reserved("given_name"));
    }
}
