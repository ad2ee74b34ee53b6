//! # Error Types
//!
//! Shared error types for the leaf crates. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! - Timestamp errors carry the offending seconds value.
//! - Canonicalization errors carry the underlying serializer error.
//! - Cryptographic errors name the algorithm or key that failed.
//! - Encoding errors say which representation (base64url, UTF-8, JSON)
//!   could not be decoded.

use thiserror::Error;

/// A timestamp outside the range chrono can represent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampError {
    /// Epoch seconds with no matching date.
    #[error("epoch seconds out of range: {0}")]
    OutOfRange(i64),

    /// Shifting by this many seconds leaves the representable range.
    #[error("shifting by {0}s overflows the timestamp range")]
    OverflowedShift(i64),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// The requested algorithm is not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The requested digest algorithm is not supported.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedDigest(String),

    /// The operating system entropy source failed.
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Error decoding wire representations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input is not valid unpadded base64url.
    #[error("invalid base64url: {0}")]
    InvalidBase64(String),

    /// The decoded bytes are not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(String),

    /// The decoded bytes are not valid JSON.
    #[error("invalid json: {0}")]
    InvalidJson(String),
}
