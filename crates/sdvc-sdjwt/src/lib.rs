//! # sdvc-sdjwt: Selective Disclosure Engine
//!
//! Issues and verifies signed credentials whose claims can be revealed one
//! at a time. The pipeline:
//!
//! ```text
//! claims ──ClaimBlinder──▶ blinded claims + disclosures
//!        ──IssuanceAssembler + Signer──▶ IssuanceFormat   (<jws>~d1~…~dn~)
//!        ──DisclosureSelector──▶ disclosure indices
//!        ──PresentationBuilder (+ key binding JWT)──▶ PresentationFormat
//!        ──PresentationVerifier──▶ disclosed claims
//! ```
//!
//! ## Security Invariants
//!
//! - Payloads and disclosures are serialized through
//!   [`CanonicalBytes`](sdvc_core::CanonicalBytes) before they are hashed or
//!   signed.
//! - Salts come from an injected [`SaltSource`](sdvc_crypto::SaltSource);
//!   no global generator exists.
//! - Verification is all-or-nothing. A presentation either yields its
//!   complete disclosed claim set or an error.
//! - Holder binding is required unless the verifier explicitly opts out.

pub mod binding;
pub mod blind;
pub mod disclosure;
pub mod error;
pub mod issuance;
pub mod presentation;
pub mod select;
pub mod settings;
pub mod signer;
pub mod verify;

// Re-export primary types.
pub use binding::{
    bind_presentation, create_key_binding_jwt, HolderBindingChecker, HolderBindingContext,
    KeyBindingClaims, KeyBindingJwtChecker, KB_JWT_TYP,
};
pub use blind::{BlindOption, BlindPolicy, BlindedClaims, ClaimBlinder};
pub use disclosure::Disclosure;
pub use error::SdJwtError;
pub use issuance::{issue, IssuanceAssembler, IssuanceFormat};
pub use presentation::{create_presentation, PresentationBuilder, PresentationFormat};
pub use select::{select_disclosures, DisclosureSelector};
pub use settings::IssuanceSettings;
pub use signer::{JwsSigner, Signer, SignerError, SD_JWT_TYP};
pub use verify::{
    verify_presentation, HolderBindingOption, PresentationVerifier, VerificationOptions,
};
