//! # tenure-cli — Command-Line Interface for the Tenure Engine
//!
//! Provides the `tenure` binary.
//!
//! ## Subcommands
//!
//! - `tenure run <scenario.yaml>` — replay a declarative lifecycle scenario
//!   against a fresh platform and emit a JSON report.
//! - `tenure schedule --deposit N` — print the deduction for every damage
//!   level.
//!
//! Handlers return `anyhow::Result<u8>`: the `u8` is the process exit code,
//! an `Err` is logged and exits with 1. Business rules live in
//! `tenure-escrow`; nothing here decides an outcome.

pub mod scenario;
pub mod schedule;

use std::path::Path;

use anyhow::{Context, Result};

use tenure_escrow::PlatformConfig;

/// Load a standalone platform configuration file (YAML or JSON).
pub fn load_config(path: &Path) -> Result<PlatformConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: PlatformConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Resolve the effective configuration.
///
/// Precedence, lowest first: compiled defaults, the scenario's own `config`
/// block, the `--config` file, then environment overrides.
pub fn resolve_config(
    embedded: Option<PlatformConfig>,
    file: Option<&Path>,
) -> Result<PlatformConfig> {
    let mut config = embedded.unwrap_or_default();
    if let Some(path) = file {
        config = load_config(path)?;
    }
    let config = config
        .with_env_overrides()
        .context("invalid platform configuration")?;
    tracing::debug!(deposit_percent = config.deposit_percent, "configuration resolved");
    Ok(config)
}
