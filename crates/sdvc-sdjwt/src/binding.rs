//! # Holder Binding
//!
//! A credential issued with a `cnf.jwk` claim can only be presented by the
//! holder of the matching private key. The holder proves possession with a
//! key binding JWT (`typ: kb+jwt`) whose claims tie it to one verifier and
//! one presentation:
//!
//! ```json
//! {"iat": 1700000000, "aud": "https://verifier.example", "nonce": "n-0S6_WzA2Mj", "sd_hash": "..."}
//! ```
//!
//! `sd_hash` is the digest (under the credential's `_sd_alg`) of the
//! presentation's compact form without the proof, so the proof cannot be
//! moved onto a different selection of disclosures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sdvc_core::{CanonicalBytes, DigestAlgorithm, Timestamp};
use sdvc_crypto::{decode_compact, sign_compact, Jwk, SigningKey};

use crate::disclosure::CNF_CLAIM;
use crate::error::SdJwtError;
use crate::presentation::PresentationFormat;

/// JWS `typ` of a key binding JWT.
pub const KB_JWT_TYP: &str = "kb+jwt";

/// Tolerated clock skew for a key binding JWT issued "in the future".
pub const CLOCK_SKEW_SECS: i64 = 60;

/// Claims of a key binding JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindingClaims {
    /// When the proof was created (epoch seconds).
    pub iat: i64,
    /// Intended verifier.
    pub aud: String,
    /// Verifier-supplied challenge.
    pub nonce: String,
    /// Digest of the unbound presentation.
    pub sd_hash: String,
}

/// Sign a key binding JWT for `presentation` with the holder's key.
pub fn create_key_binding_jwt(
    holder_key: &SigningKey,
    presentation: &PresentationFormat,
    audience: &str,
    nonce: &str,
    issued_at: Timestamp,
) -> Result<String, SdJwtError> {
    let algorithm = crate::issuance::read_payload(presentation.signed_payload())
        .and_then(|payload| crate::issuance::digest_algorithm_of(&payload))
        .map_err(SdJwtError::MalformedPresentationFormat)?;
    let claims = KeyBindingClaims {
        iat: issued_at.epoch_secs(),
        aud: audience.to_string(),
        nonce: nonce.to_string(),
        sd_hash: presentation.sd_hash(algorithm),
    };
    let payload = CanonicalBytes::new(&claims)?;
    sign_compact(holder_key, KB_JWT_TYP, payload.as_bytes())
        .map_err(|e| SdJwtError::HolderBindingFailed(format!("signing proof: {e}")))
}

/// Attach a freshly signed key binding JWT to `presentation`.
pub fn bind_presentation(
    presentation: PresentationFormat,
    holder_key: &SigningKey,
    audience: &str,
    nonce: &str,
) -> Result<PresentationFormat, SdJwtError> {
    let proof = create_key_binding_jwt(holder_key, &presentation, audience, nonce, Timestamp::now())?;
    Ok(presentation.with_holder_binding_proof(proof))
}

/// What a holder binding check gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct HolderBindingContext<'a> {
    /// Verified issuer payload.
    pub payload: &'a Map<String, Value>,
    /// The presentation being verified.
    pub presentation: &'a PresentationFormat,
    /// The presented proof.
    pub proof: &'a str,
    /// The credential's disclosure digest algorithm.
    pub digest_algorithm: DigestAlgorithm,
    /// Verification time.
    pub now: Timestamp,
}

/// Pluggable holder binding check.
pub trait HolderBindingChecker {
    /// Accept or reject the presented proof. Rejections are
    /// [`SdJwtError::HolderBindingFailed`].
    fn check(&self, context: &HolderBindingContext<'_>) -> Result<(), SdJwtError>;
}

/// Validates key binding JWTs against the credential's `cnf.jwk`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBindingJwtChecker {
    /// Required `aud`, if any.
    pub audience: Option<String>,
    /// Required `nonce`, if any.
    pub nonce: Option<String>,
    /// Maximum age of `iat` in seconds, if any.
    pub max_age_secs: Option<i64>,
}

impl HolderBindingChecker for KeyBindingJwtChecker {
    fn check(&self, context: &HolderBindingContext<'_>) -> Result<(), SdJwtError> {
        let jwk_value = context
            .payload
            .get(CNF_CLAIM)
            .and_then(|cnf| cnf.get("jwk"))
            .ok_or_else(|| failed("credential carries no cnf.jwk holder key"))?;
        let jwk = Jwk::from_value(jwk_value).map_err(|e| failed(format!("cnf.jwk: {e}")))?;
        let algorithm = jwk.algorithm().map_err(|e| failed(format!("cnf.jwk: {e}")))?;
        let holder_key = jwk.to_public_key().map_err(|e| failed(format!("cnf.jwk: {e}")))?;

        let jws = decode_compact(context.proof).map_err(|e| failed(format!("proof: {e}")))?;
        if jws.header.typ.as_deref() != Some(KB_JWT_TYP) {
            return Err(failed(format!("proof typ must be {KB_JWT_TYP}")));
        }
        jws.verify(&holder_key, algorithm)
            .map_err(|e| failed(format!("proof signature: {e}")))?;
        let bytes = jws.payload().map_err(|e| failed(format!("proof payload: {e}")))?;
        let claims: KeyBindingClaims =
            serde_json::from_slice(&bytes).map_err(|e| failed(format!("proof claims: {e}")))?;

        if claims.sd_hash != context.presentation.sd_hash(context.digest_algorithm) {
            return Err(failed("sd_hash does not match the presented disclosures"));
        }
        if let Some(audience) = &self.audience {
            if &claims.aud != audience {
                return Err(failed(format!("aud {} is not {audience}", claims.aud)));
            }
        }
        if let Some(nonce) = &self.nonce {
            if &claims.nonce != nonce {
                return Err(failed("nonce mismatch"));
            }
        }
        if claims.iat < 0 {
            return Err(failed(format!("proof iat {} is before the epoch", claims.iat)));
        }
        let age = context
            .now
            .epoch_secs()
            .checked_sub(claims.iat)
            .ok_or_else(|| failed(format!("proof iat {} is out of range", claims.iat)))?;
        if age < -CLOCK_SKEW_SECS {
            return Err(failed("proof iat is in the future"));
        }
        if let Some(max_age) = self.max_age_secs {
            if age > max_age {
                return Err(failed(format!("proof is older than {max_age}s")));
            }
        }
        Ok(())
    }
}

fn failed(reason: impl Into<String>) -> SdJwtError {
    SdJwtError::HolderBindingFailed(reason.into())
}
