//! # Key Generation Subcommand
//!
//! Writes a fresh key pair as two JWK files: `<prefix>.jwk` (private) and
//! `<prefix>.pub.jwk` (public). The same files serve as issuer keys and
//! holder keys.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use sdvc_crypto::{Algorithm, Jwk, SigningKey};

/// Arguments for `sdvc keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Signature algorithm: `eddsa` (Ed25519) or `es256` (P-256).
    #[arg(long, default_value = "eddsa")]
    pub alg: Algorithm,

    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,

    /// Prefix for the key filenames.
    #[arg(long, default_value = "sdvc")]
    pub prefix: String,
}

/// Execute `sdvc keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    cmd_keygen(args.alg, &args.output, &args.prefix)
}

fn cmd_keygen(alg: Algorithm, output_dir: &Path, prefix: &str) -> Result<u8> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let key = SigningKey::generate(alg);
    let private = Jwk::from_signing_key(&key);
    let public = private.to_public();

    let sk_path = output_dir.join(format!("{prefix}.jwk"));
    let pk_path = output_dir.join(format!("{prefix}.pub.jwk"));

    std::fs::write(&sk_path, serde_json::to_string_pretty(&private)?)
        .with_context(|| format!("failed to write private key: {}", sk_path.display()))?;
    std::fs::write(&pk_path, serde_json::to_string_pretty(&public)?)
        .with_context(|| format!("failed to write public key: {}", pk_path.display()))?;

    println!("OK: generated {alg} key pair");
    println!("  Private key: {}", sk_path.display());
    println!("  Public key:  {}", pk_path.display());

    Ok(0)
}
