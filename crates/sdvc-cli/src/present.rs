//! # Present Subcommand
//!
//! Projects an issuance onto the claims named with `--disclose`. With
//! `--holder-key` the presentation is bound to that key for one verifier
//! (`--audience`) and one challenge (`--nonce`).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use sdvc_sdjwt::{bind_presentation, create_presentation, select_disclosures, IssuanceFormat};

/// Arguments for `sdvc present`.
#[derive(Args, Debug)]
pub struct PresentArgs {
    /// File holding the compact issuance.
    #[arg(value_name = "ISSUANCE")]
    pub issuance: PathBuf,

    /// Claims to reveal (repeatable): a top-level name, or a path such as
    /// `address/locality` or `nationalities/0`.
    #[arg(long, value_name = "NAME")]
    pub disclose: Vec<String>,

    /// Holder private key (JWK) for a key binding JWT.
    #[arg(long, requires_all = ["audience", "nonce"])]
    pub holder_key: Option<PathBuf>,

    /// Verifier the key binding JWT is meant for.
    #[arg(long)]
    pub audience: Option<String>,

    /// Verifier challenge for the key binding JWT.
    #[arg(long)]
    pub nonce: Option<String>,

    /// Write the presentation here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute `sdvc present`.
pub fn run_present(args: &PresentArgs) -> Result<u8> {
    let compact = cmd_present(args)?;
    crate::emit(&compact, args.out.as_deref())?;
    Ok(0)
}

fn cmd_present(args: &PresentArgs) -> Result<String> {
    let issuance: IssuanceFormat = crate::read_compact(&args.issuance)?
        .parse()
        .with_context(|| format!("invalid issuance: {}", args.issuance.display()))?;

    let indices = select_disclosures(&issuance, &args.disclose)?;
    tracing::info!(
        requested = args.disclose.len(),
        selected = indices.len(),
        "selected disclosures"
    );
    let presentation = create_presentation(&issuance, indices, None)?;

    let presentation = match &args.holder_key {
        None => presentation,
        Some(path) => {
            let (Some(audience), Some(nonce)) = (&args.audience, &args.nonce) else {
                bail!("--holder-key requires --audience and --nonce");
            };
            let key = crate::read_signing_key(path)?;
            bind_presentation(presentation, &key, audience, nonce)
                .context("failed to create key binding JWT")?
        }
    };
    Ok(presentation.to_string())
}
