//! Platform configuration.
//!
//! Defaults are compiled in; a YAML/JSON document may override them and the
//! `TENURE_DEPOSIT_PERCENT` environment variable overrides both.

use serde::{Deserialize, Serialize};

/// Deposit as a percentage of one month's rent.
pub const DEFAULT_DEPOSIT_PERCENT: u64 = 100;

/// Largest accepted deposit percentage (ten months' rent).
pub const MAX_DEPOSIT_PERCENT: u64 = 1_000;

/// Environment variable overriding [`PlatformConfig::deposit_percent`].
pub const DEPOSIT_PERCENT_ENV: &str = "TENURE_DEPOSIT_PERCENT";

/// Tunables of a platform deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// `deposit = monthly_rent * deposit_percent / 100`.
    pub deposit_percent: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            deposit_percent: DEFAULT_DEPOSIT_PERCENT,
        }
    }
}

impl PlatformConfig {
    /// Check the configured values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DepositPercentOutOfRange`] if the deposit
    /// percentage exceeds [`MAX_DEPOSIT_PERCENT`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deposit_percent > MAX_DEPOSIT_PERCENT {
            return Err(ConfigError::DepositPercentOutOfRange(self.deposit_percent));
        }
        Ok(())
    }

    /// Apply environment overrides on top of `self`, then validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a variable is set but does not
    /// parse, or any validation error.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(DEPOSIT_PERCENT_ENV) {
            self.deposit_percent = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: DEPOSIT_PERCENT_ENV,
                value: raw.clone(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("deposit_percent {0} exceeds the maximum of {MAX_DEPOSIT_PERCENT}")]
    DepositPercentOutOfRange(u64),
    #[error("environment variable {var} has invalid value \"{value}\"")]
    InvalidEnv { var: &'static str, value: String },
}
