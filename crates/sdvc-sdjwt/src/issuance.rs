//! # Issuance
//!
//! Assembles the issuer-signed envelope: the blinded claims plus
//! `_sd_alg` and optional `iss`, `iat`, `exp` and `cnf` metadata, serialized
//! canonically and handed to a [`Signer`]. The result is an
//! [`IssuanceFormat`], which travels as
//! `<jws>~<disclosure_1>~...~<disclosure_n>~`.

use serde_json::{json, Map, Value};

use sdvc_core::{CanonicalBytes, DigestAlgorithm, Timestamp};
use sdvc_crypto::{decode_compact, Jwk, SaltSource};

use crate::blind::{BlindPolicy, BlindedClaims, ClaimBlinder};
use crate::disclosure::{Disclosure, CNF_CLAIM, SD_ALG_CLAIM};
use crate::error::SdJwtError;
use crate::settings::IssuanceSettings;
use crate::signer::{Signer, SignerError};

/// Separator between the parts of the compact wire forms.
pub const SEPARATOR: char = '~';

/// A signed payload with the full list of disclosures.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceFormat {
    signed_payload: String,
    disclosures: Vec<Disclosure>,
}

impl IssuanceFormat {
    /// Pair a compact JWS with its disclosures.
    pub fn new(signed_payload: String, disclosures: Vec<Disclosure>) -> Result<Self, SdJwtError> {
        check_compact_jws(&signed_payload).map_err(SdJwtError::MalformedIssuanceFormat)?;
        Ok(Self {
            signed_payload,
            disclosures,
        })
    }

    /// The issuer-signed compact JWS.
    pub fn signed_payload(&self) -> &str {
        &self.signed_payload
    }

    /// All disclosures, in emission order.
    pub fn disclosures(&self) -> &[Disclosure] {
        &self.disclosures
    }

    /// The signed claims, decoded without checking the signature.
    pub fn unverified_payload(&self) -> Result<Map<String, Value>, SdJwtError> {
        read_payload(&self.signed_payload).map_err(SdJwtError::MalformedIssuanceFormat)
    }

    /// The disclosure digest algorithm named by the signed payload.
    pub fn digest_algorithm(&self) -> Result<DigestAlgorithm, SdJwtError> {
        digest_algorithm_of(&self.unverified_payload()?)
            .map_err(SdJwtError::MalformedIssuanceFormat)
    }
}

impl std::fmt::Display for IssuanceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.signed_payload)?;
        for disclosure in &self.disclosures {
            write!(f, "{SEPARATOR}{disclosure}")?;
        }
        write!(f, "{SEPARATOR}")
    }
}

impl std::str::FromStr for IssuanceFormat {
    type Err = SdJwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts: Vec<&str> = s.split(SEPARATOR).collect();
        if parts.len() < 2 {
            return Err(SdJwtError::MalformedIssuanceFormat(
                "missing '~' after the signed payload".to_string(),
            ));
        }
        if parts.pop() != Some("") {
            return Err(SdJwtError::MalformedIssuanceFormat(
                "issuance must end with '~' and carry no holder proof".to_string(),
            ));
        }
        let signed_payload = parts[0].to_string();
        let disclosures = parts[1..]
            .iter()
            .enumerate()
            .map(|(i, encoded)| {
                Disclosure::parse(encoded).map_err(|e| {
                    SdJwtError::MalformedIssuanceFormat(format!("disclosure {i}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(signed_payload, disclosures)
    }
}

/// Builds and signs the credential envelope around blinded claims.
#[derive(Debug, Clone, Default)]
pub struct IssuanceAssembler {
    digest_algorithm: DigestAlgorithm,
    issuer: Option<String>,
    issued_at: Option<Timestamp>,
    expires_at: Option<Timestamp>,
    holder_key: Option<Jwk>,
}

impl IssuanceAssembler {
    /// Assembler writing `_sd_alg` for `digest_algorithm` and no metadata.
    pub fn new(digest_algorithm: DigestAlgorithm) -> Self {
        Self {
            digest_algorithm,
            ..Self::default()
        }
    }

    /// Set the `iss` claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the `iat` claim.
    pub fn with_issued_at(mut self, issued_at: Timestamp) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Set the `exp` claim.
    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Bind the credential to a holder key (`cnf.jwk`). Private members are
    /// stripped.
    pub fn with_holder_key(mut self, holder_key: &Jwk) -> Self {
        self.holder_key = Some(holder_key.to_public());
        self
    }

    /// The payload that will be signed.
    pub fn payload(&self, blinded: &BlindedClaims) -> Result<Map<String, Value>, SdJwtError> {
        let mut payload = blinded.claims.clone();
        let mut metadata = vec![(SD_ALG_CLAIM, json!(self.digest_algorithm.as_str()))];
        if let Some(issuer) = &self.issuer {
            metadata.push(("iss", json!(issuer)));
        }
        if let Some(iat) = self.issued_at {
            metadata.push(("iat", json!(iat.epoch_secs())));
        }
        if let Some(exp) = self.expires_at {
            metadata.push(("exp", json!(exp.epoch_secs())));
        }
        if let Some(jwk) = &self.holder_key {
            metadata.push((CNF_CLAIM, json!({ "jwk": jwk.to_value() })));
        }
        for (name, value) in metadata {
            if payload.contains_key(name) {
                return Err(SdJwtError::shape(
                    &format!("/{name}"),
                    "claim collides with envelope metadata",
                ));
            }
            payload.insert(name.to_string(), value);
        }
        Ok(payload)
    }

    /// Sign the envelope and pair it with all disclosures.
    pub fn assemble(
        &self,
        blinded: BlindedClaims,
        signer: &dyn Signer,
    ) -> Result<IssuanceFormat, SdJwtError> {
        let payload = self.payload(&blinded)?;
        let canonical = CanonicalBytes::from_value(Value::Object(payload))?;
        let envelope = signer.sign(canonical.as_bytes())?;
        let signed_payload = String::from_utf8(envelope).map_err(|_| {
            SdJwtError::SigningFailed(SignerError::Rejected(
                "signer returned a non UTF-8 envelope".to_string(),
            ))
        })?;
        tracing::debug!(
            disclosures = blinded.disclosures.len(),
            payload_bytes = canonical.len(),
            "assembled issuance"
        );
        IssuanceFormat::new(signed_payload, blinded.disclosures)
    }
}

/// Blind `claims` under `policy` and sign the result in one step.
///
/// `settings` supplies the digest algorithm, decoys, `iss`, `iat` and validity.
/// When `holder_key` is given the credential carries it as `cnf.jwk`.
pub fn issue(
    claims: &Value,
    policy: &BlindPolicy,
    settings: &IssuanceSettings,
    salts: &dyn SaltSource,
    signer: &dyn Signer,
    holder_key: Option<&Jwk>,
) -> Result<IssuanceFormat, SdJwtError> {
    if holder_key.is_some() && claims.get(CNF_CLAIM).is_some() {
        return Err(SdJwtError::shape(
            &format!("/{CNF_CLAIM}"),
            "reserved for the holder key",
        ));
    }
    settings.validate()?;
    let blinded = ClaimBlinder::new(salts)
        .with_digest_algorithm(settings.digest_algorithm)
        .with_decoy_digests(settings.decoy_digests)
        .blind(claims, policy)?;

    let now = Timestamp::now();
    let mut assembler = IssuanceAssembler::new(settings.digest_algorithm);
    if settings.include_issued_at {
        assembler = assembler.with_issued_at(now);
    }
    if let Some(issuer) = &settings.issuer {
        assembler = assembler.with_issuer(issuer.as_str());
    }
    if let Some(validity) = settings.validity_secs {
        let expiry = now
            .plus_secs(validity)
            .map_err(|e| SdJwtError::InvalidSettings(format!("validity_secs: {e}")))?;
        assembler = assembler.with_expiry(expiry);
    }
    if let Some(jwk) = holder_key {
        assembler = assembler.with_holder_key(jwk);
    }
    assembler.assemble(blinded, signer)
}

/// Shallow structural check: three non-empty dot-separated segments.
fn check_compact_jws(token: &str) -> Result<(), String> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().take(2).any(|s| s.is_empty()) {
        return Err(format!(
            "signed payload is not a compact JWS ({} segments)",
            segments.len()
        ));
    }
    Ok(())
}

/// Decode the JSON object payload of a compact JWS without verification.
pub(crate) fn read_payload(token: &str) -> Result<Map<String, Value>, String> {
    let jws = decode_compact(token).map_err(|e| e.to_string())?;
    let bytes = jws.payload().map_err(|e| e.to_string())?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("signed payload is not a JSON object".to_string()),
        Err(e) => Err(format!("signed payload is not JSON: {e}")),
    }
}

/// `_sd_alg` of a payload; absent means SHA-256.
pub(crate) fn digest_algorithm_of(payload: &Map<String, Value>) -> Result<DigestAlgorithm, String> {
    match payload.get(SD_ALG_CLAIM) {
        None => Ok(DigestAlgorithm::Sha256),
        Some(Value::String(name)) => DigestAlgorithm::from_name(name).map_err(|e| e.to_string()),
        Some(other) => Err(format!("{SD_ALG_CLAIM} must be a string, got {other}")),
    }
}
