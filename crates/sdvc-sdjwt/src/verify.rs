//! # Presentation Verification
//!
//! All-or-nothing check of a [`PresentationFormat`]:
//!
//! 1. The issuer JWS verifies under the configured key, with the header
//!    `alg` pinned to the configured algorithm.
//! 2. The payload is a JSON object; `_sd_alg` (default `sha-256`) names a
//!    supported digest; `exp`/`nbf`, when present, admit the current time.
//! 3. Every presented disclosure is re-encoded, hashed, and placed by
//!    walking the payload from the root, opening matched digests and
//!    descending into their values.
//! 4. The reassembled claims drop unmatched digests, `_sd` and `_sd_alg`.
//! 5. Holder binding is checked unless explicitly skipped.
//!
//! ## Security Invariants
//!
//! - A disclosure whose digest is not reachable from the signed payload
//!   fails with [`SdJwtError::DisclosureMismatch`]; one that is reachable
//!   but cannot be placed unambiguously fails with
//!   [`SdJwtError::UnknownDisclosure`]. Neither is ever silently ignored.
//! - Undisclosed claims are absent from the result, never `null`.

use std::collections::HashMap;

use serde_json::{Map, Value};

use sdvc_core::{DigestAlgorithm, Timestamp};
use sdvc_crypto::{decode_compact, Algorithm, PublicKey};

use crate::binding::{HolderBindingChecker, HolderBindingContext, KeyBindingJwtChecker};
use crate::disclosure::{array_slot_digest, is_reserved, Disclosure, SD_ALG_CLAIM, SD_CLAIM};
use crate::error::SdJwtError;
use crate::issuance::digest_algorithm_of;
use crate::presentation::PresentationFormat;

/// Whether and how holder binding is enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolderBindingOption {
    /// A valid holder binding proof must be presented.
    Required {
        /// Expected `aud` of the proof.
        audience: Option<String>,
        /// Expected `nonce` of the proof.
        nonce: Option<String>,
        /// Maximum proof age in seconds.
        max_age_secs: Option<i64>,
    },
    /// Do not check holder binding. Insecure; logged on every use.
    SkipVerify,
}

impl Default for HolderBindingOption {
    fn default() -> Self {
        Self::Required {
            audience: None,
            nonce: None,
            max_age_secs: None,
        }
    }
}

/// Verifier configuration.
#[derive(Debug, Clone)]
pub struct VerificationOptions {
    /// Holder binding policy.
    pub holder_binding: HolderBindingOption,
    /// The only accepted issuer signature algorithm.
    pub algorithm: Algorithm,
    /// Issuer verification key.
    pub issuer_key: PublicKey,
}

impl VerificationOptions {
    /// Options for `issuer_key`, pinned to its algorithm, requiring holder
    /// binding.
    pub fn new(issuer_key: PublicKey) -> Self {
        Self {
            holder_binding: HolderBindingOption::default(),
            algorithm: issuer_key.algorithm(),
            issuer_key,
        }
    }

    /// Accept `algorithm` instead of the key's own.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Require a holder proof for `audience` and `nonce`.
    pub fn require_holder_binding(
        mut self,
        audience: Option<String>,
        nonce: Option<String>,
        max_age_secs: Option<i64>,
    ) -> Self {
        self.holder_binding = HolderBindingOption::Required {
            audience,
            nonce,
            max_age_secs,
        };
        self
    }

    /// Do not check holder binding.
    pub fn skip_holder_binding(mut self) -> Self {
        self.holder_binding = HolderBindingOption::SkipVerify;
        self
    }
}

/// Verifies presentations against one issuer key.
pub struct PresentationVerifier {
    options: VerificationOptions,
    checker: Option<Box<dyn HolderBindingChecker + Send + Sync>>,
    clock: Option<Timestamp>,
}

impl PresentationVerifier {
    /// Verifier using the bundled key binding JWT checker.
    pub fn new(options: VerificationOptions) -> Self {
        Self {
            options,
            checker: None,
            clock: None,
        }
    }

    /// Replace the holder binding check.
    pub fn with_holder_binding_checker(
        mut self,
        checker: Box<dyn HolderBindingChecker + Send + Sync>,
    ) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Verify as of `now` instead of the system clock.
    pub fn at(mut self, now: Timestamp) -> Self {
        self.clock = Some(now);
        self
    }

    /// Verify `presentation` and return the disclosed claims.
    pub fn verify(&self, presentation: &PresentationFormat) -> Result<Map<String, Value>, SdJwtError> {
        let now = self.clock.unwrap_or_else(Timestamp::now);
        let payload = self.verified_payload(presentation.signed_payload())?;
        let algorithm =
            digest_algorithm_of(&payload).map_err(SdJwtError::MalformedPresentationFormat)?;
        check_validity(&payload, now)?;

        let claims = Reassembly::new(presentation.disclosures(), algorithm)?.run(&payload)?;

        match &self.options.holder_binding {
            HolderBindingOption::SkipVerify => {
                tracing::warn!("holder binding verification skipped");
            }
            HolderBindingOption::Required {
                audience,
                nonce,
                max_age_secs,
            } => {
                let proof = presentation
                    .holder_binding_proof()
                    .ok_or(SdJwtError::HolderBindingMissing)?;
                let context = HolderBindingContext {
                    payload: &payload,
                    presentation,
                    proof,
                    digest_algorithm: algorithm,
                    now,
                };
                match &self.checker {
                    Some(checker) => checker.check(&context)?,
                    None => KeyBindingJwtChecker {
                        audience: audience.clone(),
                        nonce: nonce.clone(),
                        max_age_secs: *max_age_secs,
                    }
                    .check(&context)?,
                }
            }
        }

        tracing::debug!(
            disclosures = presentation.disclosures().len(),
            claims = claims.len(),
            "presentation verified"
        );
        Ok(claims)
    }

    fn verified_payload(&self, token: &str) -> Result<Map<String, Value>, SdJwtError> {
        let jws = decode_compact(token)
            .map_err(|e| SdJwtError::MalformedPresentationFormat(e.to_string()))?;
        jws.verify(&self.options.issuer_key, self.options.algorithm)
            .map_err(|e| SdJwtError::InvalidSignature(e.to_string()))?;
        let bytes = jws
            .payload()
            .map_err(|e| SdJwtError::MalformedPresentationFormat(e.to_string()))?;
        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SdJwtError::MalformedPresentationFormat(
                "signed payload is not a JSON object".to_string(),
            )),
            Err(e) => Err(SdJwtError::MalformedPresentationFormat(format!(
                "signed payload is not JSON: {e}"
            ))),
        }
    }
}

/// Verify `presentation` with `options` and the bundled holder check.
pub fn verify_presentation(
    presentation: &PresentationFormat,
    options: &VerificationOptions,
) -> Result<Map<String, Value>, SdJwtError> {
    PresentationVerifier::new(options.clone()).verify(presentation)
}

fn check_validity(payload: &Map<String, Value>, now: Timestamp) -> Result<(), SdJwtError> {
    let now = now.epoch_secs();
    if let Some(exp) = epoch_claim(payload, "exp")? {
        if now >= exp {
            return Err(SdJwtError::CredentialExpired(format!("exp {exp} has passed")));
        }
    }
    if let Some(nbf) = epoch_claim(payload, "nbf")? {
        if now < nbf {
            return Err(SdJwtError::CredentialExpired(format!("not valid before {nbf}")));
        }
    }
    Ok(())
}

fn epoch_claim(payload: &Map<String, Value>, name: &str) -> Result<Option<i64>, SdJwtError> {
    match payload.get(name) {
        None => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            SdJwtError::MalformedPresentationFormat(format!("{name} must be an integer"))
        }),
    }
}

/// One verification's digest table and placement state.
struct Reassembly<'a> {
    disclosures: &'a [Disclosure],
    by_digest: HashMap<String, usize>,
    placed: Vec<bool>,
}

impl<'a> Reassembly<'a> {
    fn new(disclosures: &'a [Disclosure], algorithm: DigestAlgorithm) -> Result<Self, SdJwtError> {
        let mut by_digest = HashMap::with_capacity(disclosures.len());
        for (index, disclosure) in disclosures.iter().enumerate() {
            if by_digest.insert(disclosure.digest(algorithm), index).is_some() {
                return Err(SdJwtError::UnknownDisclosure {
                    index,
                    reason: "presented more than once".to_string(),
                });
            }
        }
        Ok(Self {
            disclosures,
            by_digest,
            placed: vec![false; disclosures.len()],
        })
    }

    fn run(mut self, payload: &Map<String, Value>) -> Result<Map<String, Value>, SdJwtError> {
        let mut claims = self.object(payload)?;
        claims.remove(SD_ALG_CLAIM);
        if let Some(index) = self.placed.iter().position(|placed| !placed) {
            return Err(SdJwtError::DisclosureMismatch { index });
        }
        Ok(claims)
    }

    /// Claim `digest`, if it names a presented disclosure.
    fn open(&mut self, digest: &str) -> Result<Option<usize>, SdJwtError> {
        let Some(&index) = self.by_digest.get(digest) else {
            return Ok(None);
        };
        if self.placed[index] {
            return Err(SdJwtError::UnknownDisclosure {
                index,
                reason: "digest referenced more than once".to_string(),
            });
        }
        self.placed[index] = true;
        Ok(Some(index))
    }

    fn object(&mut self, object: &Map<String, Value>) -> Result<Map<String, Value>, SdJwtError> {
        let mut out = Map::new();
        for (name, value) in object {
            if name != SD_CLAIM {
                out.insert(name.clone(), self.value(value)?);
            }
        }

        let Some(sd) = object.get(SD_CLAIM) else {
            return Ok(out);
        };
        let Value::Array(digests) = sd else {
            return Err(SdJwtError::MalformedPresentationFormat(format!(
                "{SD_CLAIM} must be an array"
            )));
        };
        for digest in digests {
            let Value::String(digest) = digest else {
                return Err(SdJwtError::MalformedPresentationFormat(format!(
                    "{SD_CLAIM} entries must be strings"
                )));
            };
            let Some(index) = self.open(digest)? else {
                continue;
            };
            let disclosure = &self.disclosures[index];
            let Some(name) = disclosure.name() else {
                return Err(SdJwtError::UnknownDisclosure {
                    index,
                    reason: "array element disclosure referenced from an object".to_string(),
                });
            };
            if is_reserved(name) || out.contains_key(name) {
                return Err(SdJwtError::UnknownDisclosure {
                    index,
                    reason: format!("claim name {name} collides with an existing claim"),
                });
            }
            let value = self.value(disclosure.value())?;
            out.insert(name.to_string(), value);
        }
        Ok(out)
    }

    fn value(&mut self, value: &Value) -> Result<Value, SdJwtError> {
        match value {
            Value::Object(object) => Ok(Value::Object(self.object(object)?)),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let Some(digest) = array_slot_digest(item) else {
                        out.push(self.value(item)?);
                        continue;
                    };
                    let Some(index) = self.open(digest)? else {
                        continue;
                    };
                    let disclosure = &self.disclosures[index];
                    if disclosure.name().is_some() {
                        return Err(SdJwtError::UnknownDisclosure {
                            index,
                            reason: "object property disclosure referenced from an array"
                                .to_string(),
                        });
                    }
                    out.push(self.value(disclosure.value())?);
                }
                Ok(Value::Array(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::bind_presentation;
    use crate::blind::{BlindOption, BlindPolicy};
    use crate::issuance::{issue, IssuanceAssembler, IssuanceFormat};
    use crate::presentation::create_presentation;
    use crate::select::select_disclosures;
    use crate::settings::IssuanceSettings;
    use crate::signer::JwsSigner;
    use sdvc_crypto::{Jwk, SaltGenerator, SigningKey};
    use serde_json::json;

    struct Issuer {
        signer: JwsSigner,
    }

    impl Issuer {
        fn new() -> Self {
            Self {
                signer: JwsSigner::new(SigningKey::generate(Algorithm::EdDSA)),
            }
        }

        fn issue(&self, claims: Value, policy: &[(&str, BlindOption)]) -> IssuanceFormat {
            let policy: BlindPolicy = policy
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            issue(
                &claims,
                &policy,
                &IssuanceSettings::default(),
                &SaltGenerator::default(),
                &self.signer,
                None,
            )
            .unwrap()
        }

        fn options(&self) -> VerificationOptions {
            VerificationOptions::new(self.signer.public_key()).skip_holder_binding()
        }
    }

    fn present(issuance: &IssuanceFormat, names: &[&str]) -> PresentationFormat {
        let indices = select_disclosures(issuance, names.iter().copied()).unwrap();
        create_presentation(issuance, indices, None).unwrap()
    }

    #[test]
    fn test_plaintext_and_metadata_survive() {
        let issuer = Issuer::new();
        let issuance = issuer.issue(json!({"name": "Alice", "age": 30}), &[("age", BlindOption::Flat)]);
        let claims = verify_presentation(&present(&issuance, &[]), &issuer.options()).unwrap();
        assert_eq!(claims["name"], "Alice");
        assert!(claims.contains_key("iat"));
        assert!(!claims.contains_key("age"));
        assert!(!claims.contains_key("_sd"));
        assert!(!claims.contains_key("_sd_alg"));
    }

    #[test]
    fn test_partial_array_disclosure() {
        let issuer = Issuer::new();
        let issuance = issuer.issue(
            json!({"nationalities": ["US", "DE", "FR"]}),
            &[("nationalities", BlindOption::Recursive)],
        );
        // Parent plus the second element only.
        let parent = issuance.disclosures().len() - 1;
        let presentation = create_presentation(&issuance, [1, parent], None).unwrap();
        let claims = verify_presentation(&presentation, &issuer.options()).unwrap();
        assert_eq!(claims["nationalities"], json!(["DE"]));
    }

    #[test]
    fn test_foreign_disclosure_is_mismatch() {
        let issuer = Issuer::new();
        let issuance = issuer.issue(json!({"a": 1}), &[("a", BlindOption::Flat)]);
        let foreign = Disclosure::for_property("salt-from-elsewhere", "a", json!(1)).unwrap();
        let compact = format!("{}~{}~", issuance.signed_payload(), foreign);
        let presentation: PresentationFormat = compact.parse().unwrap();
        let err = verify_presentation(&presentation, &issuer.options()).unwrap_err();
        assert!(matches!(err, SdJwtError::DisclosureMismatch { index: 0 }));
    }

    #[test]
    fn test_duplicate_disclosure_is_unknown() {
        let issuer = Issuer::new();
        let issuance = issuer.issue(json!({"a": 1}), &[("a", BlindOption::Flat)]);
        let d = &issuance.disclosures()[0];
        let compact = format!("{}~{d}~{d}~", issuance.signed_payload());
        let presentation: PresentationFormat = compact.parse().unwrap();
        let err = verify_presentation(&presentation, &issuer.options()).unwrap_err();
        assert!(matches!(err, SdJwtError::UnknownDisclosure { index: 1, .. }));
    }

    #[test]
    fn test_name_collision_is_unknown() {
        // An issuer that signs both a plaintext and a blinded "a".
        let issuer = Issuer::new();
        let hidden = Disclosure::for_property("s", "a", json!(2)).unwrap();
        let blinded = crate::blind::BlindedClaims {
            claims: json!({"a": 1, "_sd": [hidden.digest(DigestAlgorithm::Sha256)]})
                .as_object()
                .unwrap()
                .clone(),
            disclosures: vec![hidden],
        };
        let issuance = IssuanceAssembler::new(DigestAlgorithm::Sha256)
            .assemble(blinded, &issuer.signer)
            .unwrap();
        let presentation = create_presentation(&issuance, [0], None).unwrap();
        let err = verify_presentation(&presentation, &issuer.options()).unwrap_err();
        assert!(matches!(err, SdJwtError::UnknownDisclosure { index: 0, .. }));
    }

    #[test]
    fn test_element_disclosure_in_object_slot_is_unknown() {
        let issuer = Issuer::new();
        let element = Disclosure::for_element("s", json!("x")).unwrap();
        let blinded = crate::blind::BlindedClaims {
            claims: json!({"_sd": [element.digest(DigestAlgorithm::Sha256)]})
                .as_object()
                .unwrap()
                .clone(),
            disclosures: vec![element],
        };
        let issuance = IssuanceAssembler::new(DigestAlgorithm::Sha256)
            .assemble(blinded, &issuer.signer)
            .unwrap();
        let presentation = create_presentation(&issuance, [0], None).unwrap();
        let err = verify_presentation(&presentation, &issuer.options()).unwrap_err();
        assert!(matches!(err, SdJwtError::UnknownDisclosure { index: 0, .. }));
    }

    #[test]
    fn test_expired_credential() {
        let issuer = Issuer::new();
        let salts = SaltGenerator::default();
        let settings = IssuanceSettings {
            validity_secs: Some(60),
            ..IssuanceSettings::default()
        };
        let issuance = issue(
            &json!({"a": 1}),
            &BlindPolicy::new(),
            &settings,
            &salts,
            &issuer.signer,
            None,
        )
        .unwrap();
        let presentation = present(&issuance, &[]);
        let verifier = PresentationVerifier::new(issuer.options());
        verifier.verify(&presentation).unwrap();

        let later = Timestamp::now().plus_secs(120).unwrap();
        let err = PresentationVerifier::new(issuer.options())
            .at(later)
            .verify(&presentation)
            .unwrap_err();
        assert!(matches!(err, SdJwtError::CredentialExpired(_)));
    }

    #[test]
    fn test_unknown_sd_alg_rejected() {
        let issuer = Issuer::new();
        let payload = br#"{"_sd_alg":"md5","a":1}"#;
        let token = String::from_utf8(crate::signer::Signer::sign(&issuer.signer, payload).unwrap())
            .unwrap();
        let presentation: PresentationFormat = format!("{token}~").parse().unwrap();
        let err = verify_presentation(&presentation, &issuer.options()).unwrap_err();
        assert!(matches!(err, SdJwtError::MalformedPresentationFormat(_)));
    }

    #[test]
    fn test_holder_binding_required_by_default() {
        let issuer = Issuer::new();
        let holder = SigningKey::generate(Algorithm::EdDSA);
        let policy: BlindPolicy = [("a".to_string(), BlindOption::Flat)].into_iter().collect();
        let issuance = issue(
            &json!({"a": 1}),
            &policy,
            &IssuanceSettings::default(),
            &SaltGenerator::default(),
            &issuer.signer,
            Some(&Jwk::from_public_key(&holder.public_key())),
        )
        .unwrap();
        let presentation = present(&issuance, &["a"]);
        let options = VerificationOptions::new(issuer.signer.public_key());

        let err = verify_presentation(&presentation, &options).unwrap_err();
        assert!(matches!(err, SdJwtError::HolderBindingMissing));

        let bound = bind_presentation(presentation, &holder, "aud", "nonce").unwrap();
        let claims = verify_presentation(&bound, &options).unwrap();
        assert_eq!(claims["a"], 1);
        assert!(claims.contains_key("cnf"));
    }

    #[test]
    fn test_custom_holder_binding_checker() {
        struct Refuse;
        impl HolderBindingChecker for Refuse {
            fn check(&self, _: &HolderBindingContext<'_>) -> Result<(), SdJwtError> {
                Err(SdJwtError::HolderBindingFailed("refused".to_string()))
            }
        }

        let issuer = Issuer::new();
        let issuance = issuer.issue(json!({"a": 1}), &[]);
        let presentation = present(&issuance, &[]).with_holder_binding_proof("x.y.z");
        let options = VerificationOptions::new(issuer.signer.public_key());
        let err = PresentationVerifier::new(options)
            .with_holder_binding_checker(Box::new(Refuse))
            .verify(&presentation)
            .unwrap_err();
        assert!(matches!(err, SdJwtError::HolderBindingFailed(m) if m == "refused"));
    }
}
