//! # sdvc-core: Foundational Types for Selective Disclosure Credentials
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on:
//!
//! 1. **`CanonicalBytes` newtype.** Every byte sequence that is digested or
//!    signed as a claim payload flows through `CanonicalBytes::new()`
//!    (RFC 8785 JSON canonicalization). Two parties that hold the same
//!    logical JSON always derive the same bytes.
//!
//! 2. **`DigestAlgorithm`.** The hash used for disclosure digests, named by
//!    its IANA hash-name-string (`sha-256`, `sha-384`, `sha-512`) so it can
//!    be embedded in a credential payload and read back by a verifier.
//!
//! 3. **Base64url helpers.** Unpadded URL-safe base64 is the only text
//!    encoding used on the wire.
//!
//! 4. **UTC-only timestamps.** `Timestamp` carries seconds precision and
//!    converts to and from the epoch seconds used by JWT claims.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sdvc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::DigestAlgorithm;
pub use encoding::{base64url_decode, base64url_decode_json, base64url_encode};
pub use error::{CanonicalizationError, CryptoError, EncodingError, TimestampError};
pub use temporal::Timestamp;
