//! # Engine Error Types
//!
//! Every failure of issuance, selection, presentation, and verification is
//! reported through [`SdJwtError`]. Each variant carries the claim path,
//! disclosure index, or stage that failed. Verification never returns a
//! partial result alongside an error.

use thiserror::Error;

use sdvc_core::{CanonicalizationError, CryptoError};

use crate::signer::SignerError;

/// Errors from the selective disclosure engine.
#[derive(Error, Debug)]
pub enum SdJwtError {
    /// The salt source could not produce randomness. Issuance aborts.
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(String),

    /// The claim tree cannot be blinded as requested.
    #[error("unsupported claim shape at {path}: {reason}")]
    UnsupportedClaimShape {
        /// JSON pointer to the offending claim (`/` for the root).
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A requested claim name has no disclosure in the issuance.
    #[error("claim not found: {0}")]
    ClaimNotFound(String),

    /// The signer refused or failed to sign the payload.
    #[error("signing failed: {0}")]
    SigningFailed(#[from] SignerError),

    /// The issuer signature did not verify under the configured key and
    /// algorithm.
    #[error("invalid issuer signature: {0}")]
    InvalidSignature(String),

    /// A presented disclosure's digest is not referenced from any reachable
    /// position of the signed payload.
    #[error("disclosure {index} does not match any reachable digest")]
    DisclosureMismatch {
        /// Position of the disclosure in the presentation.
        index: usize,
    },

    /// A presented disclosure matches a digest but cannot be placed.
    #[error("disclosure {index} cannot be placed: {reason}")]
    UnknownDisclosure {
        /// Position of the disclosure in the presentation.
        index: usize,
        /// Why placement failed.
        reason: String,
    },

    /// Holder binding is required but the presentation carries no proof.
    #[error("holder binding proof required but not presented")]
    HolderBindingMissing,

    /// The holder binding proof was presented but did not check out.
    #[error("holder binding failed: {0}")]
    HolderBindingFailed(String),

    /// An issuance string or structure is malformed.
    #[error("malformed issuance format: {0}")]
    MalformedIssuanceFormat(String),

    /// A presentation string or its signed payload is malformed.
    #[error("malformed presentation format: {0}")]
    MalformedPresentationFormat(String),

    /// The credential envelope is outside its validity window.
    #[error("credential expired: {0}")]
    CredentialExpired(String),

    /// Issuer settings are unusable (e.g. a salt shorter than 16 bytes).
    #[error("invalid issuance settings: {0}")]
    InvalidSettings(String),

    /// Canonical serialization of a disclosure or payload failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl SdJwtError {
    pub(crate) fn shape(path: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedClaimShape {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            reason: reason.into(),
        }
    }

    /// Map a salt-source failure. Any crypto error from the salt source is
    /// treated as missing entropy.
    pub(crate) fn entropy(err: CryptoError) -> Self {
        match err {
            CryptoError::EntropyUnavailable(msg) => Self::EntropyUnavailable(msg),
            other => Self::EntropyUnavailable(other.to_string()),
        }
    }
}
