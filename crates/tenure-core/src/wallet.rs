//! # Wallets
//!
//! The engine never holds a party's funds directly. Whenever an operation
//! pays someone (rent to the landlord, a deduction to the landlord, a refund
//! to the tenant) it hands the coin to a [`ValueSink`], the seam where the
//! substrate's transfer primitive plugs in. [`Wallets`] is the in-memory
//! implementation used by the CLI and tests.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ValueError;
use crate::identity::PartyId;
use crate::value::Coin;

/// Destination for value leaving the engine.
///
/// Transfers are infallible: once an operation has passed its checks and
/// committed, delivering the payout cannot abort it.
pub trait ValueSink {
    /// Transfer `coin` to `recipient`.
    fn transfer(&mut self, recipient: &PartyId, coin: Coin);
}

/// In-memory per-party balances.
///
/// Accounts are 128-bit so that no sequence of 64-bit transfers can overflow
/// one.
#[derive(Debug, Default, Serialize)]
pub struct Wallets {
    accounts: BTreeMap<PartyId, u128>,
}

impl Wallets {
    /// An empty wallet book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into `party`'s account.
    pub fn fund(&mut self, party: &PartyId, amount: u64) {
        self.transfer(party, Coin::mint(amount));
    }

    /// Withdraw `amount` from `party`'s account as a coin, e.g. to tender rent.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Insufficient`] if the account holds less than
    /// `amount` (an unknown party holds zero); the account is unchanged.
    pub fn withdraw(&mut self, party: &PartyId, amount: u64) -> Result<Coin, ValueError> {
        let held = self.balance_of(party);
        if u128::from(amount) > held {
            return Err(ValueError::Insufficient {
                requested: amount,
                available: u64::try_from(held).unwrap_or(u64::MAX),
            });
        }
        if amount > 0 {
            self.accounts.insert(party.clone(), held - u128::from(amount));
        }
        Ok(Coin::mint(amount))
    }

    /// Current balance of `party` (zero if unknown).
    pub fn balance_of(&self, party: &PartyId) -> u128 {
        self.accounts.get(party).copied().unwrap_or(0)
    }

    /// Sum of every account.
    pub fn total(&self) -> u128 {
        self.accounts.values().sum()
    }

    /// Iterate over `(party, balance)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&PartyId, u128)> {
        self.accounts.iter().map(|(p, b)| (p, *b))
    }
}

impl ValueSink for Wallets {
    fn transfer(&mut self, recipient: &PartyId, coin: Coin) {
        *self.accounts.entry(recipient.clone()).or_default() += u128::from(coin.value());
    }
}
