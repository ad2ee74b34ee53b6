//! # sdvc-cli: Command Line Tool for Selective Disclosure Credentials
//!
//! Provides the `sdvc` binary:
//!
//! - `sdvc keygen`: Ed25519 / P-256 key pairs as JWK files.
//! - `sdvc issue`: blind and sign a JSON claim set.
//! - `sdvc present`: select disclosures, optionally with a key binding JWT.
//! - `sdvc verify`: verify a presentation and print the disclosed claims.
//!
//! ```bash
//! sdvc keygen --alg eddsa --prefix issuer
//! sdvc --config issuer.yaml issue --key issuer.jwk claims.json --out credential.txt
//! sdvc present credential.txt --disclose date_of_birth --out presentation.txt
//! sdvc verify presentation.txt --issuer-key issuer.pub.jwk --skip-holder-binding
//! ```

pub mod config;
pub mod issue;
pub mod keygen;
pub mod present;
pub mod verify;

use std::path::Path;

use anyhow::{bail, Context, Result};

use sdvc_crypto::{Jwk, PublicKey, SigningKey};

/// Read a JWK file.
pub fn read_jwk(path: &Path) -> Result<Jwk> {
    if !path.exists() {
        bail!("key file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JWK: {}", path.display()))
}

/// Read a private JWK file as a signing key.
pub fn read_signing_key(path: &Path) -> Result<SigningKey> {
    read_jwk(path)?
        .to_signing_key()
        .with_context(|| format!("invalid private key: {}", path.display()))
}

/// Read a JWK file as a verification key. Private members are ignored.
pub fn read_public_key(path: &Path) -> Result<PublicKey> {
    read_jwk(path)?
        .to_public_key()
        .with_context(|| format!("invalid public key: {}", path.display()))
}

/// Read a compact credential string from a file.
pub fn read_compact(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content.trim().to_string())
}

/// Write `content` to `out`, or print it when no path is given.
pub fn emit(content: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
