//! # Claim Blinding
//!
//! Turns a plaintext claim tree into its blinded form plus the flat list of
//! disclosures that can reopen it. Each top-level claim is treated
//! according to its [`BlindOption`]:
//!
//! - [`BlindOption::Flat`] moves the whole value into one disclosure.
//! - [`BlindOption::Recursive`] first blinds every nested property and
//!   array element (bottom-up), then blinds the claim itself, so the parent
//!   disclosure carries an already blinded container.
//! - [`BlindOption::SubClaims`] leaves the claim in place and applies a
//!   nested policy to the properties of its object value.
//!
//! Claims without a policy entry stay plaintext.
//!
//! ## Security Invariants
//!
//! - Every blinded field gets a fresh salt from the injected
//!   [`SaltSource`]. A salt failure aborts blinding.
//! - `_sd` arrays are sorted, so their order says nothing about the order
//!   of the original claims.
//! - Disclosures are emitted depth-first, children before the parent that
//!   references them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sdvc_core::DigestAlgorithm;
use sdvc_crypto::SaltSource;

use crate::disclosure::{is_reserved, Disclosure, ARRAY_DIGEST_KEY, SD_CLAIM};
use crate::error::SdJwtError;

/// How a single claim is blinded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlindOption {
    /// Blind the value as a whole; nested content stays plaintext inside
    /// the disclosure.
    Flat,
    /// Blind the value and, recursively, everything inside it.
    Recursive,
    /// Keep the claim visible and apply a nested policy to its properties.
    SubClaims(BlindPolicy),
}

/// Per-claim blinding policy, keyed by claim name.
pub type BlindPolicy = BTreeMap<String, BlindOption>;

/// Result of blinding a claim tree.
#[derive(Debug, Clone, PartialEq)]
pub struct BlindedClaims {
    /// The blinded claim object.
    pub claims: Map<String, Value>,
    /// Disclosures in emission order.
    pub disclosures: Vec<Disclosure>,
}

/// Applies a [`BlindPolicy`] to a claim tree.
pub struct ClaimBlinder<'a> {
    salts: &'a dyn SaltSource,
    digest_algorithm: DigestAlgorithm,
    decoy_digests: usize,
}

impl<'a> ClaimBlinder<'a> {
    /// Blinder using `salts`, SHA-256 digests and no decoys.
    pub fn new(salts: &'a dyn SaltSource) -> Self {
        Self {
            salts,
            digest_algorithm: DigestAlgorithm::default(),
            decoy_digests: 0,
        }
    }

    /// Use `algorithm` for disclosure digests.
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Add `count` random decoy digests to every `_sd` array written.
    pub fn with_decoy_digests(mut self, count: usize) -> Self {
        self.decoy_digests = count;
        self
    }

    /// The digest algorithm this blinder writes.
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// Blind `claims` according to `policy`.
    pub fn blind(&self, claims: &Value, policy: &BlindPolicy) -> Result<BlindedClaims, SdJwtError> {
        let Value::Object(root) = claims else {
            return Err(SdJwtError::shape("", "claim set must be a JSON object"));
        };
        check_reserved_names(claims, "")?;

        let mut disclosures = Vec::new();
        let blinded = self.blind_object(root, policy, "", &mut disclosures)?;
        tracing::debug!(
            disclosures = disclosures.len(),
            digest_alg = %self.digest_algorithm,
            decoys = self.decoy_digests,
            "blinded claim set"
        );
        Ok(BlindedClaims {
            claims: blinded,
            disclosures,
        })
    }

    fn blind_object(
        &self,
        object: &Map<String, Value>,
        policy: &BlindPolicy,
        path: &str,
        disclosures: &mut Vec<Disclosure>,
    ) -> Result<Map<String, Value>, SdJwtError> {
        let mut out = Map::new();
        let mut digests = Vec::new();

        for (name, value) in object {
            let claim_path = format!("{path}/{name}");
            match policy.get(name) {
                None => {
                    out.insert(name.clone(), value.clone());
                }
                Some(BlindOption::Flat) => {
                    let disclosure =
                        Disclosure::for_property(self.salt()?, name.as_str(), value.clone())?;
                    digests.push(self.emit(disclosure, disclosures));
                }
                Some(BlindOption::Recursive) => {
                    let inner = self.blind_all(value, &claim_path, disclosures)?;
                    let disclosure = Disclosure::for_property(self.salt()?, name.as_str(), inner)?;
                    digests.push(self.emit(disclosure, disclosures));
                }
                Some(BlindOption::SubClaims(nested)) => {
                    let Value::Object(inner) = value else {
                        return Err(SdJwtError::shape(
                            &claim_path,
                            "sub-claim policy requires an object value",
                        ));
                    };
                    let blinded = self.blind_object(inner, nested, &claim_path, disclosures)?;
                    out.insert(name.clone(), Value::Object(blinded));
                }
            }
        }

        for missing in policy.keys().filter(|k| !object.contains_key(*k)) {
            tracing::debug!(claim = %format!("{path}/{missing}"), "policy names an absent claim");
        }

        self.write_sd(&mut out, digests)?;
        Ok(out)
    }

    /// Blind every property and element inside `value`, bottom-up.
    fn blind_all(
        &self,
        value: &Value,
        path: &str,
        disclosures: &mut Vec<Disclosure>,
    ) -> Result<Value, SdJwtError> {
        match value {
            Value::Object(object) => {
                let mut out = Map::new();
                let mut digests = Vec::with_capacity(object.len());
                for (name, child) in object {
                    let inner = self.blind_all(child, &format!("{path}/{name}"), disclosures)?;
                    let disclosure = Disclosure::for_property(self.salt()?, name.as_str(), inner)?;
                    digests.push(self.emit(disclosure, disclosures));
                }
                self.write_sd(&mut out, digests)?;
                Ok(Value::Object(out))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let inner = self.blind_all(item, &format!("{path}/{i}"), disclosures)?;
                    let disclosure = Disclosure::for_element(self.salt()?, inner)?;
                    let digest = self.emit(disclosure, disclosures);
                    let mut slot = Map::new();
                    slot.insert(ARRAY_DIGEST_KEY.to_string(), Value::String(digest));
                    out.push(Value::Object(slot));
                }
                Ok(Value::Array(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn emit(&self, disclosure: Disclosure, disclosures: &mut Vec<Disclosure>) -> String {
        let digest = disclosure.digest(self.digest_algorithm);
        disclosures.push(disclosure);
        digest
    }

    /// Append decoys, sort, and store `_sd` unless there is nothing to store.
    fn write_sd(&self, object: &mut Map<String, Value>, mut digests: Vec<String>) -> Result<(), SdJwtError> {
        if digests.is_empty() {
            return Ok(());
        }
        for _ in 0..self.decoy_digests {
            let noise = self.salt()?;
            digests.push(self.digest_algorithm.digest_base64url(noise.as_bytes()));
        }
        digests.sort();
        object.insert(
            SD_CLAIM.to_string(),
            Value::Array(digests.into_iter().map(Value::String).collect()),
        );
        Ok(())
    }

    fn salt(&self) -> Result<String, SdJwtError> {
        self.salts.next_salt().map_err(SdJwtError::entropy)
    }
}

/// Reject reserved names anywhere in the input tree.
fn check_reserved_names(value: &Value, path: &str) -> Result<(), SdJwtError> {
    match value {
        Value::Object(object) => {
            for (name, child) in object {
                let claim_path = format!("{path}/{name}");
                if is_reserved(name) {
                    return Err(SdJwtError::shape(&claim_path, "reserved claim name"));
                }
                check_reserved_names(child, &claim_path)?;
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                check_reserved_names(item, &format!("{path}/{i}"))?;
            }
        }
        _ => {}
    }
    Ok(())
}
