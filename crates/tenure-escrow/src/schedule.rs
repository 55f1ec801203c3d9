//! # Deduction Schedule
//!
//! Maps an adjudicated damage level to the share of the paid deposit that is
//! redirected to the landlord. The tiers are fixed:
//!
//! | level | meaning  | deduction          |
//! |-------|----------|--------------------|
//! | 0     | none     | 0                  |
//! | 1     | minor    | `floor(deposit/4)` |
//! | 2     | moderate | `floor(deposit/2)` |
//! | 3     | severe   | `deposit`          |
//!
//! Division truncates; a deposit of 3 at level 1 deducts 0.

use serde::{Deserialize, Serialize};

use crate::error::EscrowError;

/// Validated damage level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DamageLevel {
    /// No damage.
    None,
    /// Minor damage.
    Minor,
    /// Moderate damage.
    Moderate,
    /// Severe damage; the whole deposit is forfeited.
    Severe,
}

impl DamageLevel {
    /// All levels in ascending order.
    pub const ALL: [DamageLevel; 4] = [Self::None, Self::Minor, Self::Moderate, Self::Severe];

    /// The numeric level (0..=3).
    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Minor => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
        }
    }

    /// Canonical string name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Minor => "MINOR",
            Self::Moderate => "MODERATE",
            Self::Severe => "SEVERE",
        }
    }

    /// Deduction this level imposes on `deposit`.
    pub fn deduction(self, deposit: u64) -> u64 {
        deduction_for(deposit, self.as_u8())
    }
}

impl TryFrom<u8> for DamageLevel {
    type Error = EscrowError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::None),
            1 => Ok(Self::Minor),
            2 => Ok(Self::Moderate),
            3 => Ok(Self::Severe),
            _ => Err(EscrowError::DamageIncorrect { level }),
        }
    }
}

impl From<DamageLevel> for u8 {
    fn from(level: DamageLevel) -> Self {
        level.as_u8()
    }
}

impl std::fmt::Display for DamageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw schedule over any level. Total: levels outside 0..=3 deduct 0.
pub fn deduction_for(deposit: u64, level: u8) -> u64 {
    match level {
        1 => deposit / 4,
        2 => deposit / 2,
        3 => deposit,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_at_one_thousand() {
        assert_eq!(deduction_for(1000, 0), 0);
        assert_eq!(deduction_for(1000, 1), 250);
        assert_eq!(deduction_for(1000, 2), 500);
        assert_eq!(deduction_for(1000, 3), 1000);
    }

    #[test]
    fn schedule_truncates() {
        assert_eq!(deduction_for(3, 1), 0);
        assert_eq!(deduction_for(7, 1), 1);
        assert_eq!(deduction_for(7, 2), 3);
        assert_eq!(deduction_for(101, 2), 50);
    }

    #[test]
    fn out_of_range_levels_deduct_nothing() {
        assert_eq!(deduction_for(1000, 4), 0);
        assert_eq!(deduction_for(1000, u8::MAX), 0);
    }

    #[test]
    fn level_conversion() {
        for level in DamageLevel::ALL {
            assert_eq!(DamageLevel::try_from(level.as_u8()).unwrap(), level);
        }
        assert_eq!(
            DamageLevel::try_from(4),
            Err(EscrowError::DamageIncorrect { level: 4 })
        );
    }

    #[test]
    fn level_deserializes_from_number() {
        let level: DamageLevel = serde_json::from_str("2").unwrap();
        assert_eq!(level, DamageLevel::Moderate);
        assert!(serde_json::from_str::<DamageLevel>("9").is_err());
        assert_eq!(serde_json::to_string(&DamageLevel::Severe).unwrap(), "3");
    }

    #[test]
    fn display_names() {
        assert_eq!(DamageLevel::None.to_string(), "NONE");
        assert_eq!(DamageLevel::Severe.to_string(), "SEVERE");
    }
}
