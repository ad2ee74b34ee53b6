//! # Issue Subcommand
//!
//! Blinds a JSON claim file and signs it with the issuer's private JWK. The
//! blinding policy starts from the `policy` of the settings file; `--flat`
//! and `--recursive` add or override entries for top-level claims.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use sdvc_crypto::SaltSource;
use sdvc_sdjwt::{issue, BlindOption, BlindPolicy, IssuanceSettings, JwsSigner};

/// Arguments for `sdvc issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Path to the JSON claim set.
    #[arg(value_name = "CLAIMS")]
    pub claims: PathBuf,

    /// Issuer private key (JWK).
    #[arg(long)]
    pub key: PathBuf,

    /// Holder public key (JWK) to bind the credential to.
    #[arg(long)]
    pub holder_key: Option<PathBuf>,

    /// Top-level claims to blind as a whole.
    #[arg(long, value_name = "NAME")]
    pub flat: Vec<String>,

    /// Top-level claims to blind recursively.
    #[arg(long, value_name = "NAME")]
    pub recursive: Vec<String>,

    /// Blind every top-level claim recursively.
    #[arg(long, conflicts_with_all = ["flat", "recursive"])]
    pub all: bool,

    /// Write the issuance here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute `sdvc issue`.
pub fn run_issue(args: &IssueArgs, settings: &IssuanceSettings) -> Result<u8> {
    let salts = settings.salt_generator()?;
    let compact = cmd_issue(args, settings, &salts)?;
    crate::emit(&compact, args.out.as_deref())?;
    Ok(0)
}

fn cmd_issue(args: &IssueArgs, settings: &IssuanceSettings, salts: &dyn SaltSource) -> Result<String> {
    let content = std::fs::read_to_string(&args.claims)
        .with_context(|| format!("failed to read claims: {}", args.claims.display()))?;
    let claims: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON: {}", args.claims.display()))?;

    let signer = JwsSigner::new(crate::read_signing_key(&args.key)?);
    let holder = args
        .holder_key
        .as_deref()
        .map(crate::read_jwk)
        .transpose()?;
    let policy = build_policy(&settings.policy, args, &claims);

    let issuance = issue(&claims, &policy, settings, salts, &signer, holder.as_ref())
        .context("issuance failed")?;
    tracing::info!(
        disclosures = issuance.disclosures().len(),
        alg = %signer.algorithm(),
        holder_bound = holder.is_some(),
        "issued credential"
    );
    Ok(issuance.to_string())
}

fn build_policy(base: &BlindPolicy, args: &IssueArgs, claims: &serde_json::Value) -> BlindPolicy {
    let mut policy = base.clone();
    if args.all {
        if let Some(object) = claims.as_object() {
            for name in object.keys() {
                policy.insert(name.clone(), BlindOption::Recursive);
            }
        }
    }
    for name in &args.flat {
        policy.insert(name.clone(), BlindOption::Flat);
    }
    for name in &args.recursive {
        policy.insert(name.clone(), BlindOption::Recursive);
    }
    policy
}

/// Helper for tests elsewhere in the crate: issue `claims` with `key_path`.
#[cfg(test)]
pub(crate) fn issue_file(
    dir: &std::path::Path,
    claims: &serde_json::Value,
    key_path: &std::path::Path,
    holder_key: Option<&std::path::Path>,
) -> PathBuf {
    let claims_path = dir.join("claims.json");
    std::fs::write(&claims_path, claims.to_string()).unwrap();
    let out = dir.join("credential.txt");
    let args = IssueArgs {
        claims: claims_path,
        key: key_path.to_path_buf(),
        holder_key: holder_key.map(std::path::Path::to_path_buf),
        flat: Vec::new(),
        recursive: Vec::new(),
        all: true,
        out: Some(out.clone()),
    };
    run_issue(&args, &IssuanceSettings::default()).unwrap();
    out
}
