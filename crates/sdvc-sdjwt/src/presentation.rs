//! # Presentations
//!
//! A presentation is a projection of an issuance: the same signed payload,
//! a subsequence of its disclosures, and optionally a holder binding proof.
//! Wire form: `<jws>~<disclosure_i>~...~<disclosure_k>~[<kb-jwt>]`.
//!
//! Presentations are built per verifier and never stored.

use std::collections::BTreeSet;

use sdvc_core::DigestAlgorithm;

use crate::disclosure::Disclosure;
use crate::error::SdJwtError;
use crate::issuance::{IssuanceFormat, SEPARATOR};

/// Signed payload, selected disclosures, and an optional holder proof.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationFormat {
    signed_payload: String,
    disclosures: Vec<Disclosure>,
    holder_binding_proof: Option<String>,
}

impl PresentationFormat {
    /// The issuer-signed compact JWS.
    pub fn signed_payload(&self) -> &str {
        &self.signed_payload
    }

    /// Presented disclosures, in issuance order.
    pub fn disclosures(&self) -> &[Disclosure] {
        &self.disclosures
    }

    /// The holder binding proof, if any.
    pub fn holder_binding_proof(&self) -> Option<&str> {
        self.holder_binding_proof.as_deref()
    }

    /// Attach (or replace) the holder binding proof.
    pub fn with_holder_binding_proof(mut self, proof: impl Into<String>) -> Self {
        self.holder_binding_proof = Some(proof.into());
        self
    }

    /// Compact form without the holder proof: `<jws>~<d>~...~`. This is the
    /// input of the holder proof's `sd_hash`.
    pub fn unbound_compact(&self) -> String {
        let mut out = self.signed_payload.clone();
        for disclosure in &self.disclosures {
            out.push(SEPARATOR);
            out.push_str(disclosure.encoded());
        }
        out.push(SEPARATOR);
        out
    }

    /// Digest of [`Self::unbound_compact`].
    pub fn sd_hash(&self, algorithm: DigestAlgorithm) -> String {
        algorithm.digest_base64url(self.unbound_compact().as_bytes())
    }
}

impl std::fmt::Display for PresentationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.unbound_compact())?;
        if let Some(proof) = &self.holder_binding_proof {
            f.write_str(proof)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for PresentationFormat {
    type Err = SdJwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(SEPARATOR).collect();
        let [signed_payload, middle @ .., last] = parts.as_slice() else {
            return Err(SdJwtError::MalformedPresentationFormat(
                "missing '~' after the signed payload".to_string(),
            ));
        };
        if signed_payload.split('.').count() != 3 {
            return Err(SdJwtError::MalformedPresentationFormat(
                "signed payload is not a compact JWS".to_string(),
            ));
        }
        let disclosures = middle
            .iter()
            .enumerate()
            .map(|(i, encoded)| {
                Disclosure::parse(encoded).map_err(|e| {
                    SdJwtError::MalformedPresentationFormat(format!("disclosure {i}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let holder_binding_proof = match *last {
            "" => None,
            proof if proof.split('.').count() == 3 => Some(proof.to_string()),
            _ => {
                return Err(SdJwtError::MalformedPresentationFormat(
                    "holder binding proof is not a compact JWS".to_string(),
                ))
            }
        };
        Ok(Self {
            signed_payload: (*signed_payload).to_string(),
            disclosures,
            holder_binding_proof,
        })
    }
}

/// Projects an issuance onto a chosen set of disclosures.
#[derive(Debug, Clone, Copy)]
pub struct PresentationBuilder<'a> {
    issuance: &'a IssuanceFormat,
}

impl<'a> PresentationBuilder<'a> {
    /// Builder over `issuance`.
    pub fn new(issuance: &'a IssuanceFormat) -> Self {
        Self { issuance }
    }

    /// Presentation carrying the disclosures at `indices`, in issuance
    /// order, with an optional holder binding proof.
    pub fn present<I>(
        &self,
        indices: I,
        holder_binding_proof: Option<String>,
    ) -> Result<PresentationFormat, SdJwtError>
    where
        I: IntoIterator<Item = usize>,
    {
        let all = self.issuance.disclosures();
        let indices: BTreeSet<usize> = indices.into_iter().collect();
        if let Some(&bad) = indices.iter().find(|&&i| i >= all.len()) {
            return Err(SdJwtError::MalformedIssuanceFormat(format!(
                "disclosure index {bad} out of range ({} disclosures)",
                all.len()
            )));
        }
        Ok(PresentationFormat {
            signed_payload: self.issuance.signed_payload().to_string(),
            disclosures: indices.into_iter().map(|i| all[i].clone()).collect(),
            holder_binding_proof,
        })
    }
}

/// Build a presentation of `issuance` revealing the disclosures at
/// `indices`.
pub fn create_presentation<I>(
    issuance: &IssuanceFormat,
    indices: I,
    holder_binding_proof: Option<String>,
) -> Result<PresentationFormat, SdJwtError>
where
    I: IntoIterator<Item = usize>,
{
    PresentationBuilder::new(issuance).present(indices, holder_binding_proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blind::{BlindOption, BlindPolicy};
    use crate::issuance::issue;
    use crate::settings::IssuanceSettings;
    use crate::signer::JwsSigner;
    use sdvc_crypto::{Algorithm, SaltGenerator, SigningKey};
    use serde_json::json;

    fn issuance() -> IssuanceFormat {
        let policy: BlindPolicy = ["a", "b", "c"]
            .iter()
            .map(|n| (n.to_string(), BlindOption::Flat))
            .collect();
        issue(
            &json!({"a": 1, "b": 2, "c": 3}),
            &policy,
            &IssuanceSettings::default(),
            &SaltGenerator::default(),
            &JwsSigner::new(SigningKey::generate(Algorithm::EdDSA)),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_projection_preserves_issuance_order() {
        let issuance = issuance();
        let presentation = create_presentation(&issuance, [2, 0], None).unwrap();
        assert_eq!(presentation.signed_payload(), issuance.signed_payload());
        assert_eq!(
            presentation.disclosures(),
            &[
                issuance.disclosures()[0].clone(),
                issuance.disclosures()[2].clone()
            ]
        );
        assert!(presentation.holder_binding_proof().is_none());
    }

    #[test]
    fn test_duplicate_indices_collapse() {
        let issuance = issuance();
        let presentation = create_presentation(&issuance, [1, 1, 1], None).unwrap();
        assert_eq!(presentation.disclosures().len(), 1);
    }

    #[test]
    fn test_out_of_range_index() {
        let issuance = issuance();
        let err = create_presentation(&issuance, [0, 3], None).unwrap_err();
        assert!(matches!(err, SdJwtError::MalformedIssuanceFormat(_)));
    }

    #[test]
    fn test_compact_forms() {
        let issuance = issuance();
        let presentation = create_presentation(&issuance, [1], None).unwrap();
        let compact = presentation.to_string();
        assert!(compact.ends_with('~'));
        assert_eq!(compact, presentation.unbound_compact());
        assert_eq!(compact.parse::<PresentationFormat>().unwrap(), presentation);

        let bound = presentation.with_holder_binding_proof("h.p.s");
        let compact = bound.to_string();
        assert!(compact.ends_with("~h.p.s"));
        let parsed: PresentationFormat = compact.parse().unwrap();
        assert_eq!(parsed.holder_binding_proof(), Some("h.p.s"));
        assert_eq!(parsed, bound);
    }

    #[test]
    fn test_empty_presentation_roundtrip() {
        let issuance = issuance();
        let presentation = create_presentation(&issuance, [], None).unwrap();
        assert_eq!(
            presentation.to_string(),
            format!("{}~", issuance.signed_payload())
        );
        let parsed: PresentationFormat = presentation.to_string().parse().unwrap();
        assert!(parsed.disclosures().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["a.b.c", "a.b~", "a.b.c~not-a-proof", "a.b.c~%%%~"] {
            assert!(
                matches!(
                    bad.parse::<PresentationFormat>(),
                    Err(SdJwtError::MalformedPresentationFormat(_))
                ),
                "accepted {bad:?}"
            );
        }
    }
}
