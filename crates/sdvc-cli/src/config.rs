//! Issuer settings loaded from the global `--config` YAML file.
//!
//! ```yaml
//! salt_length: 16
//! digest_algorithm: sha-256
//! decoy_digests: 2
//! issuer: https://issuer.example
//! include_issued_at: true
//! validity_secs: 31536000
//! policy:
//!   given_name: flat
//!   address: recursive
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};

use sdvc_sdjwt::IssuanceSettings;

/// Load settings from `path`, or the defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<IssuanceSettings> {
    let Some(path) = path else {
        return Ok(IssuanceSettings::default());
    };
    if !path.exists() {
        bail!("config file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let settings: IssuanceSettings = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    tracing::debug!(
        config = %path.display(),
        digest_alg = %settings.digest_algorithm,
        policy_entries = settings.policy.len(),
        "loaded issuance settings"
    );
    Ok(settings)
}
