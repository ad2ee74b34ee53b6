//! # sdvc-crypto: Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for issuing and verifying
//! selectively disclosable credentials:
//!
//! - **Ed25519** (`EdDSA`) and **P-256** (`ES256`) signing and verification.
//! - **JWK** encoding of public and private keys, used for issuer keys and
//!   for the holder key bound into a credential's `cnf` claim.
//! - **Compact JWS** production and verification, the signed envelope
//!   around a blinded claim payload.
//! - **Salt generation** from the operating system CSPRNG.
//!
//! ## Crate Policy
//!
//! - Depends only on `sdvc-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   keys and real signatures.
//! - Private key material is never printed by `Debug` implementations.

pub mod ed25519;
pub mod es256;
pub mod jwk;
pub mod jws;
pub mod key;
pub mod salt;

pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey};
pub use es256::{P256KeyPair, P256PublicKey};
pub use jwk::Jwk;
pub use jws::{decode_compact, sign_compact, verify_compact, CompactJws, JwsHeader};
pub use key::{Algorithm, PublicKey, SigningKey};
pub use salt::{SaltGenerator, SaltSource, DEFAULT_SALT_LENGTH};
