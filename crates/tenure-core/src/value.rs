//! # Value Custody Primitives
//!
//! In-process stand-ins for the external fungible-value primitive: a
//! [`Coin`] is a movable quantum of value, a [`Balance`] is value at rest
//! inside an owning record (the platform's deposit pool).
//!
//! ## Invariant
//!
//! Neither type is `Clone`, neither implements `Deserialize`, and the only
//! source of new value is [`Coin::mint`]. Every other operation conserves the
//! total: `split` moves value out, `join` moves value in, nothing is copied.

use serde::Serialize;

use crate::error::ValueError;

/// A movable amount of value.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[must_use = "dropping a coin destroys its value"]
pub struct Coin {
    value: u64,
}

impl Coin {
    /// Mint new value. This is the substrate's faucet; the engine itself never
    /// calls it.
    pub fn mint(value: u64) -> Self {
        Self { value }
    }

    /// The value carried.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Split `amount` off into a new coin.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Insufficient`] if `amount` exceeds the value
    /// carried; `self` is unchanged on failure.
    pub fn split(&mut self, amount: u64) -> Result<Coin, ValueError> {
        self.value = take(self.value, amount)?;
        Ok(Coin { value: amount })
    }

    /// Merge another coin into this one.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Overflow`] if the sum exceeds `u64::MAX`; `self`
    /// is unchanged and `other` is dropped.
    pub fn join(&mut self, other: Coin) -> Result<(), ValueError> {
        self.value = add(self.value, other.value)?;
        Ok(())
    }

    /// Move the full value out into a new coin, leaving this one empty.
    pub fn take_all(&mut self) -> Coin {
        Coin {
            value: std::mem::take(&mut self.value),
        }
    }
}

/// Value held at rest inside an owning record.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    value: u64,
}

impl Balance {
    /// The value held.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Absorb a coin.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Overflow`] if the sum exceeds `u64::MAX`.
    pub fn join(&mut self, coin: Coin) -> Result<u64, ValueError> {
        self.value = add(self.value, coin.value)?;
        Ok(self.value)
    }

    /// Withdraw `amount` as a coin.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Insufficient`] if `amount` exceeds the balance;
    /// the balance is unchanged on failure.
    pub fn split(&mut self, amount: u64) -> Result<Coin, ValueError> {
        self.value = take(self.value, amount)?;
        Ok(Coin { value: amount })
    }
}

fn take(held: u64, amount: u64) -> Result<u64, ValueError> {
    held.checked_sub(amount).ok_or(ValueError::Insufficient {
        requested: amount,
        available: held,
    })
}

fn add(held: u64, incoming: u64) -> Result<u64, ValueError> {
    held.checked_add(incoming)
        .ok_or(ValueError::Overflow { held, incoming })
}
