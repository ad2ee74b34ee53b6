//! Issuer configuration.

use serde::{Deserialize, Serialize};

use sdvc_core::DigestAlgorithm;
use sdvc_crypto::{SaltGenerator, DEFAULT_SALT_LENGTH};

use crate::blind::BlindPolicy;
use crate::error::SdJwtError;

/// Settings for issuing selectively disclosable credentials.
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IssuanceSettings {
    /// Random bytes per salt.
    pub salt_length: usize,
    /// Digest algorithm written to `_sd_alg`.
    pub digest_algorithm: DigestAlgorithm,
    /// Decoy digests added to each `_sd` array.
    pub decoy_digests: usize,
    /// `iss` claim of issued credentials.
    pub issuer: Option<String>,
    /// Whether issued credentials carry an `iat` claim.
    pub include_issued_at: bool,
    /// Seconds from issuance until `exp`. Must be positive.
    pub validity_secs: Option<i64>,
    /// Default blinding policy.
    pub policy: BlindPolicy,
}

impl Default for IssuanceSettings {
    fn default() -> Self {
        Self {
            salt_length: DEFAULT_SALT_LENGTH,
            digest_algorithm: DigestAlgorithm::Sha256,
            decoy_digests: 0,
            issuer: None,
            include_issued_at: true,
            validity_secs: None,
            policy: BlindPolicy::new(),
        }
    }
}

impl IssuanceSettings {
    /// Reject settings that cannot produce a well-formed credential.
    pub fn validate(&self) -> Result<(), SdJwtError> {
        if let Some(validity) = self.validity_secs {
            if validity <= 0 {
                return Err(SdJwtError::InvalidSettings(format!(
                    "validity_secs must be positive, got {validity}"
                )));
            }
        }
        self.salt_generator().map(|_| ())
    }

    /// Salt generator for the configured length.
    pub fn salt_generator(&self) -> Result<SaltGenerator, SdJwtError> {
        SaltGenerator::new(self.salt_length).map_err(|e| SdJwtError::InvalidSettings(e.to_string()))
    }
}
