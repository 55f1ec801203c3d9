//! # Return and Settlement
//!
//! The tenant hands the property back; whatever remains of the deposit is
//! refunded and the escrow for the property closes.

use tenure_core::{PartyId, ValueSink};

use crate::error::EscrowError;
use crate::events::EventKind;
use crate::lease::Lease;
use crate::listing::Property;
use crate::platform::Platform;

impl Platform {
    /// Return `property` to its landlord and refund the remaining deposit
    /// to the tenant.
    ///
    /// The deposit entry is closed even when nothing remains, after which
    /// the property may be relisted. Custody passes back to the lease's
    /// landlord. Returns the amount refunded.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::InvalidHouse`] if `property` is not the lease's property.
    /// - [`EscrowError::NoPermission`] if `caller` is not the lease's tenant.
    /// - [`EscrowError::InvalidDeposit`] if no entry for this lease is open.
    /// - [`EscrowError::InsufficientBalance`] if the pool cannot cover the refund.
    pub fn return_property(
        &mut self,
        lease: &Lease,
        property: &mut Property,
        caller: &PartyId,
        sink: &mut impl ValueSink,
    ) -> Result<u64, EscrowError> {
        property.ensure_matches(lease)?;
        if caller != lease.tenant() {
            tracing::warn!(%caller, lease = %lease.id(), "property return by non-tenant rejected");
            return Err(EscrowError::no_permission(
                "return property",
                caller,
                "lease tenant",
            ));
        }

        let refund = self.ledger.close(&lease.property_id(), &lease.id())?;
        let refunded = refund.value();
        if refunded > 0 {
            sink.transfer(lease.tenant(), refund);
        }
        property.set_custodian(lease.landlord().clone());

        tracing::info!(
            property = %lease.property_id(),
            tenant = %caller,
            refunded,
            "property returned"
        );
        self.record(EventKind::PropertyReturned {
            property_id: lease.property_id(),
            tenant: caller.clone(),
            refunded,
        });
        Ok(refunded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::{Coin, Wallets};

    fn party(name: &str) -> PartyId {
        PartyId::new(name).unwrap()
    }

    fn leased() -> (Platform, Wallets, Lease, Property) {
        let mut platform = Platform::new(party("owner"));
        let mut wallets = Wallets::new();
        let (_, mut property) = platform
            .post_listing(100, 1, "", "", &party("landlord"))
            .unwrap();
        let mut payment = Coin::mint(200);
        let lease = platform
            .pay_rent(&property.id(), 1, &mut payment, &party("tenant"), &mut wallets)
            .unwrap();
        platform.handover_property(&lease, &mut property).unwrap();
        (platform, wallets, lease, property)
    }

    #[test]
    fn return_refunds_and_closes() {
        let (mut platform, mut wallets, lease, mut property) = leased();
        assert_eq!(property.custodian().as_str(), "tenant");
        let refunded = platform
            .return_property(&lease, &mut property, &party("tenant"), &mut wallets)
            .unwrap();
        assert_eq!(refunded, 100);
        assert_eq!(wallets.balance_of(&party("tenant")), 100);
        assert_eq!(platform.deposit_recorded(&property.id()), 0);
        assert_eq!(platform.pool_value(), 0);
        assert_eq!(property.custodian().as_str(), "landlord");
    }

    #[test]
    fn return_by_stranger_rejected() {
        let (mut platform, mut wallets, lease, mut property) = leased();
        let err = platform
            .return_property(&lease, &mut property, &party("landlord"), &mut wallets)
            .unwrap_err();
        assert_eq!(err.code(), "NoPermission");
        assert_eq!(platform.deposit_recorded(&property.id()), 100);
        assert_eq!(property.custodian().as_str(), "tenant");
    }

    #[test]
    fn underfunded_pool_rejects_return_without_change() {
        let tenant = party("tenant");
        let mut platform = Platform::new(party("owner"));
        let mut wallets = Wallets::new();
        let (_, mut property) = platform
            .post_listing(100, 1, "", "", &party("landlord"))
            .unwrap();
        let mut payment = Coin::mint(200);
        let split = platform
            .pay_rent_split(&property.id(), 1, &mut payment, &tenant)
            .unwrap();
        let lease = split.lease;
        drop(split.deposit);
        platform.handover_property(&lease, &mut property).unwrap();
        let events = platform.events().len();

        let err = platform
            .return_property(&lease, &mut property, &tenant, &mut wallets)
            .unwrap_err();
        assert_eq!(
            err,
            EscrowError::InsufficientBalance {
                held_by: "deposit pool",
                required: 100,
                available: 0,
            }
        );
        assert_eq!(platform.deposit_recorded(&property.id()), 100);
        assert_eq!(platform.pool_value(), 0);
        assert_eq!(platform.events().len(), events);
        assert_eq!(property.custodian(), &tenant);
        assert_eq!(wallets.balance_of(&tenant), 0);
    }

    #[test]
    fn second_return_rejected() {
        let (mut platform, mut wallets, lease, mut property) = leased();
        let tenant = party("tenant");
        platform
            .return_property(&lease, &mut property, &tenant, &mut wallets)
            .unwrap();
        assert_eq!(
            platform.return_property(&lease, &mut property, &tenant, &mut wallets),
            Err(EscrowError::InvalidDeposit {
                property_id: property.id()
            })
        );
        assert_eq!(wallets.balance_of(&tenant), 100);
    }

    #[test]
    fn mismatched_property_rejected() {
        let (mut platform, mut wallets, lease, _) = leased();
        let (_, mut other) = platform
            .post_listing(100, 1, "", "", &party("landlord"))
            .unwrap();
        let err = platform
            .return_property(&lease, &mut other, &party("tenant"), &mut wallets)
            .unwrap_err();
        assert_eq!(
            err,
            EscrowError::InvalidHouse {
                expected: lease.property_id(),
                presented: other.id(),
            }
        );
    }

    #[test]
    fn property_can_be_relisted_after_return() {
        let (mut platform, mut wallets, lease, mut property) = leased();
        let landlord = party("landlord");
        assert_eq!(
            platform
                .relist_property(&property, 150, &party("tenant"))
                .unwrap_err()
                .code(),
            "NoPermission"
        );
        assert_eq!(
            platform
                .relist_property(&property, 150, &landlord)
                .unwrap_err()
                .code(),
            "DoubleBooking"
        );
        platform
            .return_property(&lease, &mut property, &party("tenant"), &mut wallets)
            .unwrap();
        let listing = platform.relist_property(&property, 150, &landlord).unwrap();
        assert_eq!(listing.property_id, property.id());

        // The previous cycle's lease no longer reaches the escrow.
        let mut payment = Coin::mint(300);
        platform
            .pay_rent(&property.id(), 1, &mut payment, &party("tenant2"), &mut wallets)
            .unwrap();
        assert_eq!(
            platform.return_property(&lease, &mut property, &party("tenant"), &mut wallets),
            Err(EscrowError::InvalidDeposit {
                property_id: property.id()
            })
        );
        assert_eq!(platform.deposit_recorded(&property.id()), 150);
    }
}
