//! # Deposit Ledger
//!
//! The live half of escrow: how much is held for each property, backed by a
//! single pooled [`Balance`].
//!
//! ## Security Invariant
//!
//! `sum(entries) <= pool.value()` after every committed operation. Each
//! method checks every precondition before its first mutation, so a rejected
//! call leaves both the entries and the pool untouched.
//!
//! Solvency before a disbursement is checked against the whole pool, not
//! against the property's own entry. The per-entry check in
//! [`DepositLedger::deduct`] only guards the entry against underflow.
//!
//! Each entry remembers the lease that opened it, so a lease from an earlier
//! rental cycle of the same property cannot touch the current escrow.

use std::collections::BTreeMap;

use serde::Serialize;

use tenure_core::{Balance, Coin, LeaseId, PropertyId};

use crate::error::EscrowError;

/// Escrow held for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositEntry {
    /// The lease whose deposit this is.
    pub lease_id: LeaseId,
    /// Amount still held.
    pub amount: u64,
}

/// Per-property escrow amounts plus the pooled custody balance.
#[derive(Debug, Default, Serialize)]
pub struct DepositLedger {
    entries: BTreeMap<PropertyId, DepositEntry>,
    pool: Balance,
}

impl DepositLedger {
    /// An empty ledger with an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `property_id`, if one is open.
    pub fn entry(&self, property_id: &PropertyId) -> Option<DepositEntry> {
        self.entries.get(property_id).copied()
    }

    /// Amount escrowed for `property_id`, zero if none is outstanding.
    pub fn recorded(&self, property_id: &PropertyId) -> u64 {
        self.entry(property_id).map_or(0, |e| e.amount)
    }

    /// Value currently in the pool.
    pub fn pool_value(&self) -> u64 {
        self.pool.value()
    }

    /// Sum of every outstanding entry.
    pub fn outstanding(&self) -> u128 {
        self.entries.values().map(|e| u128::from(e.amount)).sum()
    }

    /// Number of open entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over open entries in property order.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyId, &DepositEntry)> {
        self.entries.iter()
    }

    /// Reject if an entry is already open for `property_id`.
    pub(crate) fn ensure_vacant(&self, property_id: &PropertyId) -> Result<(), EscrowError> {
        match self.entry(property_id) {
            Some(entry) => Err(EscrowError::DoubleBooking {
                property_id: *property_id,
                outstanding: entry.amount,
            }),
            None => Ok(()),
        }
    }

    /// The amount held for `property_id` under `lease_id`.
    ///
    /// An entry opened by a different lease counts as absent.
    pub(crate) fn require_entry(
        &self,
        property_id: &PropertyId,
        lease_id: &LeaseId,
    ) -> Result<u64, EscrowError> {
        match self.entry(property_id) {
            Some(entry) if entry.lease_id == *lease_id => Ok(entry.amount),
            _ => Err(EscrowError::InvalidDeposit {
                property_id: *property_id,
            }),
        }
    }

    /// Reject if the pool cannot cover `amount`.
    pub(crate) fn ensure_pool_covers(&self, amount: u64) -> Result<(), EscrowError> {
        let available = self.pool.value();
        if amount > available {
            tracing::warn!(
                required = amount,
                available,
                "deposit pool cannot cover disbursement"
            );
            return Err(EscrowError::InsufficientBalance {
                held_by: "deposit pool",
                required: amount,
                available,
            });
        }
        Ok(())
    }

    /// Reject if merging `amount` would overflow the pool.
    pub(crate) fn ensure_pool_headroom(&self, amount: u64) -> Result<(), EscrowError> {
        match self.pool.value().checked_add(amount) {
            Some(_) => Ok(()),
            None => Err(EscrowError::Overflow {
                operation: "deposit pool value",
            }),
        }
    }

    /// Open an entry; a duplicate is rejected by the insertion itself.
    pub(crate) fn open(
        &mut self,
        property_id: PropertyId,
        lease_id: LeaseId,
        amount: u64,
    ) -> Result<(), EscrowError> {
        self.ensure_vacant(&property_id)?;
        self.entries
            .insert(property_id, DepositEntry { lease_id, amount });
        Ok(())
    }

    /// Merge value into the pool, returning the new pool value.
    pub(crate) fn fund(&mut self, coin: Coin) -> Result<u64, EscrowError> {
        self.ensure_pool_headroom(coin.value())?;
        Ok(self.pool.join(coin)?)
    }

    /// Decrement the entry for `property_id` by `amount` and withdraw that
    /// amount from the pool.
    pub(crate) fn deduct(
        &mut self,
        property_id: &PropertyId,
        lease_id: &LeaseId,
        amount: u64,
    ) -> Result<Coin, EscrowError> {
        let held = self.require_entry(property_id, lease_id)?;
        self.ensure_pool_covers(amount)?;
        let remaining = held
            .checked_sub(amount)
            .ok_or(EscrowError::InsufficientBalance {
                held_by: "deposit entry",
                required: amount,
                available: held,
            })?;
        let payout = self.pool.split(amount)?;
        self.entries.insert(
            *property_id,
            DepositEntry {
                lease_id: *lease_id,
                amount: remaining,
            },
        );
        Ok(payout)
    }

    /// Close the entry for `property_id`, withdrawing whatever remains of it
    /// from the pool.
    pub(crate) fn close(
        &mut self,
        property_id: &PropertyId,
        lease_id: &LeaseId,
    ) -> Result<Coin, EscrowError> {
        let remaining = self.require_entry(property_id, lease_id)?;
        self.ensure_pool_covers(remaining)?;
        let refund = self.pool.split(remaining)?;
        self.entries.remove(property_id);
        Ok(refund)
    }

    /// Verify the global solvency invariant.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InsufficientBalance`] if the outstanding
    /// entries exceed the pool.
    pub fn check_solvency(&self) -> Result<(), EscrowError> {
        let outstanding = self.outstanding();
        let available = self.pool.value();
        if outstanding > u128::from(available) {
            return Err(EscrowError::InsufficientBalance {
                held_by: "deposit pool",
                required: u64::try_from(outstanding).unwrap_or(u64::MAX),
                available,
            });
        }
        Ok(())
    }
}
