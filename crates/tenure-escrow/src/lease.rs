//! # Lease Formation
//!
//! Paying rent plus deposit against a listing consumes the listing, opens the
//! property's deposit entry, and produces an immutable [`Lease`].
//!
//! Two entry points:
//!
//! - [`Platform::pay_rent_split`] is the low-level primitive. It returns the
//!   rent and deposit portions as raw coins; merging the deposit into the
//!   pool ([`Platform::fund_pool`]) and forwarding the rent are the caller's
//!   job. Until the deposit is merged the ledger is not solvent.
//! - [`Platform::pay_rent`] does both within the same call.
//!
//! The tender must equal `monthly_rent * months + deposit` exactly. Over- and
//! under-payment are both rejected and the tender is left untouched.

use serde::Serialize;

use tenure_core::{Coin, LeaseId, PartyId, PropertyId, Timestamp, ValueSink};

use crate::error::EscrowError;
use crate::events::EventKind;
use crate::platform::Platform;

/// Record of an agreed tenancy.
///
/// Fields are private and there is no `Deserialize`: a lease can only come
/// out of a successful rent payment and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lease {
    id: LeaseId,
    property_id: PropertyId,
    tenant: PartyId,
    landlord: PartyId,
    tenancy_months: u64,
    rent_paid: u64,
    deposit_paid: u64,
    signed_at: Timestamp,
}

impl Lease {
    /// Lease identifier.
    pub fn id(&self) -> LeaseId {
        self.id
    }

    /// The leased property.
    pub fn property_id(&self) -> PropertyId {
        self.property_id
    }

    /// The tenant who paid.
    pub fn tenant(&self) -> &PartyId {
        &self.tenant
    }

    /// The landlord of the consumed listing.
    pub fn landlord(&self) -> &PartyId {
        &self.landlord
    }

    /// Tenancy duration in months.
    pub fn tenancy_months(&self) -> u64 {
        self.tenancy_months
    }

    /// Rent paid for the whole tenancy.
    pub fn rent_paid(&self) -> u64 {
        self.rent_paid
    }

    /// Deposit paid into escrow.
    pub fn deposit_paid(&self) -> u64 {
        self.deposit_paid
    }

    /// When the lease was formed.
    pub fn signed_at(&self) -> Timestamp {
        self.signed_at
    }
}

/// Output of [`Platform::pay_rent_split`].
#[derive(Debug)]
#[must_use = "the rent and deposit coins must be delivered"]
pub struct RentSplit {
    /// The lease just formed.
    pub lease: Lease,
    /// Rent portion, owed to `landlord`.
    pub rent: Coin,
    /// Deposit portion, to be merged into the pool.
    pub deposit: Coin,
    /// Recipient of the rent.
    pub landlord: PartyId,
}

/// Amounts a valid tender has been checked against.
struct Quote {
    landlord: PartyId,
    rent: u64,
    deposit: u64,
}

impl Platform {
    /// Form a lease and return the raw rent and deposit portions.
    ///
    /// On success the listing is gone and a deposit entry of the listing's
    /// deposit is open; the deposit coin has not yet been merged into the
    /// pool, but the pool is known to have room for it. On failure nothing
    /// changes, including `payment`.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::InvalidTenancy`] if `tenancy_months` is zero.
    /// - [`EscrowError::InvalidNotice`] if the property is not listed.
    /// - [`EscrowError::DoubleBooking`] if a deposit entry is already open.
    /// - [`EscrowError::Overflow`] if rent or total due exceed 64 bits.
    /// - [`EscrowError::InvalidAmount`] if `payment` is not exactly the total due.
    /// - [`EscrowError::Overflow`] if the pool cannot absorb the deposit.
    pub fn pay_rent_split(
        &mut self,
        property_id: &PropertyId,
        tenancy_months: u64,
        payment: &mut Coin,
        caller: &PartyId,
    ) -> Result<RentSplit, EscrowError> {
        let quote = self.quote(property_id, tenancy_months, payment.value())?;
        self.sign(property_id, tenancy_months, payment, caller, quote)
    }

    /// Form a lease, merge the deposit into the pool, and forward the rent to
    /// the landlord through `sink`.
    ///
    /// # Errors
    ///
    /// Everything [`Platform::pay_rent_split`] rejects.
    pub fn pay_rent(
        &mut self,
        property_id: &PropertyId,
        tenancy_months: u64,
        payment: &mut Coin,
        caller: &PartyId,
        sink: &mut impl ValueSink,
    ) -> Result<Lease, EscrowError> {
        let quote = self.quote(property_id, tenancy_months, payment.value())?;
        let split = self.sign(property_id, tenancy_months, payment, caller, quote)?;
        self.fund_pool(split.deposit)?;
        sink.transfer(&split.landlord, split.rent);
        Ok(split.lease)
    }

    /// Every check lease formation makes, without mutating anything.
    fn quote(
        &self,
        property_id: &PropertyId,
        tenancy_months: u64,
        tendered: u64,
    ) -> Result<Quote, EscrowError> {
        if tenancy_months == 0 {
            return Err(EscrowError::InvalidTenancy {
                months: tenancy_months,
            });
        }
        let listing = self.require_listing(property_id)?;
        self.ledger.ensure_vacant(property_id)?;

        let rent = listing
            .monthly_rent
            .checked_mul(tenancy_months)
            .ok_or(EscrowError::Overflow { operation: "rent" })?;
        let due = rent
            .checked_add(listing.deposit)
            .ok_or(EscrowError::Overflow {
                operation: "total due",
            })?;
        if tendered != due {
            tracing::debug!(property = %property_id, tendered, due, "tender rejected");
            return Err(EscrowError::InvalidAmount { tendered, due });
        }
        self.ledger.ensure_pool_headroom(listing.deposit)?;
        Ok(Quote {
            landlord: listing.landlord.clone(),
            rent,
            deposit: listing.deposit,
        })
    }

    /// Commit a quoted lease. `payment` holds exactly `rent + deposit`.
    fn sign(
        &mut self,
        property_id: &PropertyId,
        tenancy_months: u64,
        payment: &mut Coin,
        caller: &PartyId,
        quote: Quote,
    ) -> Result<RentSplit, EscrowError> {
        let deposit = payment.split(quote.deposit)?;
        let rent = payment.take_all();

        let lease = Lease {
            id: LeaseId::new(),
            property_id: *property_id,
            tenant: caller.clone(),
            landlord: quote.landlord.clone(),
            tenancy_months,
            rent_paid: quote.rent,
            deposit_paid: quote.deposit,
            signed_at: Timestamp::now(),
        };
        self.ledger.open(*property_id, lease.id, quote.deposit)?;
        self.listings.remove(property_id);

        tracing::info!(
            lease = %lease.id,
            property = %property_id,
            tenant = %caller,
            rent = quote.rent,
            deposit = quote.deposit,
            "lease signed"
        );
        self.record(EventKind::LeaseSigned {
            lease_id: lease.id,
            property_id: *property_id,
            tenant: caller.clone(),
            landlord: quote.landlord.clone(),
            rent: quote.rent,
            deposit: quote.deposit,
        });
        Ok(RentSplit {
            lease,
            rent,
            deposit,
            landlord: quote.landlord,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::Wallets;

    fn party(name: &str) -> PartyId {
        PartyId::new(name).unwrap()
    }

    fn listed(monthly_rent: u64) -> (Platform, PropertyId) {
        let mut platform = Platform::new(party("owner"));
        let (_, property) = platform
            .post_listing(monthly_rent, 1, "", "", &party("landlord"))
            .unwrap();
        (platform, property.id())
    }

    #[test]
    fn split_returns_portions_and_opens_entry() {
        let (mut platform, property_id) = listed(100);
        let mut payment = Coin::mint(400);
        let split = platform
            .pay_rent_split(&property_id, 3, &mut payment, &party("tenant"))
            .unwrap();
        assert_eq!(payment.value(), 0);
        assert_eq!(split.rent.value(), 300);
        assert_eq!(split.deposit.value(), 100);
        assert_eq!(split.landlord.as_str(), "landlord");
        assert_eq!(split.lease.rent_paid(), 300);
        assert_eq!(split.lease.deposit_paid(), 100);
        assert_eq!(split.lease.tenancy_months(), 3);
        assert_eq!(platform.deposit_recorded(&property_id), 100);
        assert!(platform.listing(&property_id).is_none());

        // Deposit not merged yet.
        assert!(platform.check_solvency().is_err());
        platform.fund_pool(split.deposit).unwrap();
        assert!(platform.check_solvency().is_ok());
    }

    #[test]
    fn pay_rent_funds_pool_and_pays_landlord() {
        let (mut platform, property_id) = listed(100);
        let mut wallets = Wallets::new();
        let mut payment = Coin::mint(400);
        let lease = platform
            .pay_rent(&property_id, 3, &mut payment, &party("tenant"), &mut wallets)
            .unwrap();
        assert_eq!(lease.tenant().as_str(), "tenant");
        assert_eq!(platform.pool_value(), 100);
        assert_eq!(wallets.balance_of(&party("landlord")), 300);
        let kinds: Vec<_> = platform.events().iter().map(|e| e.kind.name()).collect();
        assert_eq!(kinds, ["listing_posted", "lease_signed", "pool_funded"]);
    }

    #[test]
    fn zero_months_rejected() {
        let (mut platform, property_id) = listed(100);
        let mut payment = Coin::mint(100);
        assert_eq!(
            platform
                .pay_rent_split(&property_id, 0, &mut payment, &party("tenant"))
                .unwrap_err(),
            EscrowError::InvalidTenancy { months: 0 }
        );
    }

    #[test]
    fn unlisted_property_rejected() {
        let mut platform = Platform::new(party("owner"));
        let property_id = PropertyId::new();
        let mut payment = Coin::mint(400);
        assert_eq!(
            platform
                .pay_rent_split(&property_id, 3, &mut payment, &party("tenant"))
                .unwrap_err(),
            EscrowError::InvalidNotice { property_id }
        );
    }

    #[test]
    fn inexact_tender_leaves_payment_untouched() {
        let (mut platform, property_id) = listed(100);
        for tendered in [399, 401] {
            let mut payment = Coin::mint(tendered);
            let err = platform
                .pay_rent_split(&property_id, 3, &mut payment, &party("tenant"))
                .unwrap_err();
            assert_eq!(err, EscrowError::InvalidAmount { tendered, due: 400 });
            assert_eq!(payment.value(), tendered);
        }
        assert!(platform.listing(&property_id).is_some());
        assert_eq!(platform.deposit_recorded(&property_id), 0);
    }

    #[test]
    fn rent_overflow_rejected() {
        let (mut platform, property_id) = listed(u64::MAX / 100);
        let mut payment = Coin::mint(0);
        let err = platform
            .pay_rent_split(&property_id, 1_000, &mut payment, &party("tenant"))
            .unwrap_err();
        assert_eq!(err, EscrowError::Overflow { operation: "rent" });
    }

    #[test]
    fn split_rejects_deposit_the_pool_cannot_absorb() {
        let (mut platform, property_id) = listed(100);
        platform.fund_pool(Coin::mint(u64::MAX - 50)).unwrap();
        let events = platform.events().len();
        let mut payment = Coin::mint(400);
        let err = platform
            .pay_rent_split(&property_id, 3, &mut payment, &party("tenant"))
            .unwrap_err();
        assert_eq!(
            err,
            EscrowError::Overflow {
                operation: "deposit pool value"
            }
        );
        assert_eq!(payment.value(), 400);
        assert!(platform.listing(&property_id).is_some());
        assert_eq!(platform.deposit_recorded(&property_id), 0);
        assert_eq!(platform.events().len(), events);
        assert!(platform.check_solvency().is_ok());
    }

    #[test]
    fn pool_overflow_rejected_before_commit() {
        let (mut platform, property_id) = listed(100);
        platform.fund_pool(Coin::mint(u64::MAX - 50)).unwrap();
        let mut wallets = Wallets::new();
        let mut payment = Coin::mint(400);
        let err = platform
            .pay_rent(&property_id, 3, &mut payment, &party("tenant"), &mut wallets)
            .unwrap_err();
        assert_eq!(err.code(), "Overflow");
        assert_eq!(payment.value(), 400);
        assert!(platform.listing(&property_id).is_some());
        assert_eq!(platform.deposit_recorded(&property_id), 0);
    }
}
