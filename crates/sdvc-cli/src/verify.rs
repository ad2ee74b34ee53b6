//! # Verify Subcommand
//!
//! Verifies a compact presentation against the issuer's public JWK and
//! prints the disclosed claims as JSON. Exit code 0 means the presentation
//! verified; 1 means it was rejected.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use sdvc_crypto::Algorithm;
use sdvc_sdjwt::{PresentationFormat, PresentationVerifier, VerificationOptions};

/// Arguments for `sdvc verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// File holding the compact presentation.
    #[arg(value_name = "PRESENTATION")]
    pub presentation: PathBuf,

    /// Issuer public key (JWK).
    #[arg(long)]
    pub issuer_key: PathBuf,

    /// Expected issuer algorithm; defaults to the key's own.
    #[arg(long)]
    pub alg: Option<Algorithm>,

    /// Accept presentations without a holder binding proof. Insecure.
    #[arg(long, conflicts_with_all = ["audience", "nonce", "max_age"])]
    pub skip_holder_binding: bool,

    /// Required `aud` of the key binding JWT.
    #[arg(long)]
    pub audience: Option<String>,

    /// Required `nonce` of the key binding JWT.
    #[arg(long)]
    pub nonce: Option<String>,

    /// Maximum age of the key binding JWT in seconds.
    #[arg(long)]
    pub max_age: Option<i64>,
}

/// Execute `sdvc verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let presentation: PresentationFormat = crate::read_compact(&args.presentation)?
        .parse()
        .with_context(|| format!("invalid presentation: {}", args.presentation.display()))?;
    let options = options(args)?;

    match PresentationVerifier::new(options).verify(&presentation) {
        Ok(claims) => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(0)
        }
        Err(e) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}

fn options(args: &VerifyArgs) -> Result<VerificationOptions> {
    let issuer_key = crate::read_public_key(&args.issuer_key)?;
    let mut options = VerificationOptions::new(issuer_key);
    if let Some(alg) = args.alg {
        options = options.with_algorithm(alg);
    }
    Ok(if args.skip_holder_binding {
        options.skip_holder_binding()
    } else {
        options.require_holder_binding(args.audience.clone(), args.nonce.clone(), args.max_age)
    })
}
