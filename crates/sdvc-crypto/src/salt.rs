//! # Salt Generation
//!
//! Every blinded claim gets its own salt so that two disclosures of the same
//! `(name, value)` never share a digest, and so that a digest cannot be
//! brute-forced from a small value space (e.g. a birth year).
//!
//! ## Security Invariant
//!
//! Salts come from the operating system CSPRNG. If it fails, the call fails
//! with `CryptoError::EntropyUnavailable`; there is no fallback to a weaker
//! generator.

use rand::RngCore;

use sdvc_core::{base64url_encode, CryptoError};

/// Default salt length in bytes (128 bits).
pub const DEFAULT_SALT_LENGTH: usize = 16;

/// A source of fresh, unpredictable, URL-safe salts.
///
/// Implementations are injected into the claim blinder. Each call must
/// return a new salt; results must never be cached or reused.
pub trait SaltSource {
    /// Produce the next salt.
    fn next_salt(&self) -> Result<String, CryptoError>;
}

/// Salt generator backed by the OS CSPRNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaltGenerator {
    length: usize,
}

impl SaltGenerator {
    /// Create a generator producing `length` random bytes per salt.
    ///
    /// Lengths below 16 bytes are rejected.
    pub fn new(length: usize) -> Result<Self, CryptoError> {
        if length < DEFAULT_SALT_LENGTH {
            return Err(CryptoError::KeyError(format!(
                "salt length must be at least {DEFAULT_SALT_LENGTH} bytes, got {length}"
            )));
        }
        Ok(Self { length })
    }

    /// Salt length in bytes (before encoding).
    pub fn length(&self) -> usize {
        self.length
    }

    /// Fill `buf` from the OS CSPRNG.
    pub fn fill(buf: &mut [u8]) -> Result<(), CryptoError> {
        rand::rngs::OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))
    }
}

impl Default for SaltGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_SALT_LENGTH,
        }
    }
}

impl SaltSource for SaltGenerator {
    fn next_salt(&self) -> Result<String, CryptoError> {
        let mut bytes = vec![0u8; self.length];
        Self::fill(&mut bytes)?;
        Ok(base64url_encode(bytes))
    }
}
