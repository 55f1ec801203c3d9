//! End-to-end rental lifecycle tests.
//!
//! Drives a platform through listing, lease formation, handover, inspection,
//! adjudication, and return, checking the deposit ledger, the pool, and the
//! parties' wallets at every stage.

use tenure_core::{PartyId, ValueSink, Wallets};
use tenure_escrow::{
    deduction_for, AdminToken, EscrowError, InspectionStatus, Lease, Platform,
    PlatformConfig, Property,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn party(name: &str) -> PartyId {
    PartyId::new(name).unwrap()
}

struct World {
    platform: Platform,
    wallets: Wallets,
    owner: PartyId,
    landlord: PartyId,
    tenant: PartyId,
}

impl World {
    fn new() -> Self {
        let owner = party("platform-owner");
        Self {
            platform: Platform::new(owner.clone()),
            wallets: Wallets::new(),
            owner,
            landlord: party("landlord"),
            tenant: party("tenant"),
        }
    }

    fn list(&mut self, monthly_rent: u64) -> Property {
        let (_, property) = self
            .platform
            .post_listing(monthly_rent, 80, "two bedroom flat", "photo://front", &self.landlord)
            .unwrap();
        property
    }

    fn lease(&mut self, property: &Property, months: u64, tender: u64) -> Result<Lease, EscrowError> {
        self.wallets.fund(&self.tenant, tender);
        let mut payment = self.wallets.withdraw(&self.tenant, tender).unwrap();
        let result = self.platform.pay_rent(
            &property.id(),
            months,
            &mut payment,
            &self.tenant,
            &mut self.wallets,
        );
        // Whatever was not consumed goes back to the tenant.
        self.wallets.transfer(&self.tenant, payment);
        result
    }

    fn admin(&mut self) -> AdminToken {
        let owner = self.owner.clone();
        self.platform.mint_admin(&owner).unwrap()
    }

    fn snapshot(&self, property: &Property) -> (u64, u64, usize) {
        (
            self.platform.deposit_recorded(&property.id()),
            self.platform.pool_value(),
            self.platform.events().len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Full cycle
// ---------------------------------------------------------------------------

#[test]
fn full_cycle_returns_pool_to_prior_value() {
    let mut w = World::new();
    let pool_before = w.platform.pool_value();

    let mut property = w.list(100);
    assert_eq!(w.platform.listing(&property.id()).unwrap().deposit, 100);

    let lease = w.lease(&property, 3, 400).unwrap();
    assert_eq!(lease.rent_paid(), 300);
    assert_eq!(lease.deposit_paid(), 100);
    assert_eq!(w.platform.deposit_recorded(&property.id()), 100);
    assert_eq!(w.platform.pool_value(), pool_before + 100);
    assert_eq!(w.wallets.balance_of(&w.landlord), 300);

    w.platform.handover_property(&lease, &mut property).unwrap();
    assert_eq!(property.custodian(), &w.tenant);

    let mut inspection = w
        .platform
        .submit_inspection(
            &lease,
            2,
            "paint damage in hallway",
            vec!["photo://hallway".to_string()],
            &w.landlord,
        )
        .unwrap();
    assert_eq!(inspection.status(), InspectionStatus::Pending);

    let token = w.admin();
    let owner = w.owner.clone();
    let deducted = w
        .platform
        .review_inspection(&lease, &mut inspection, &token, 2, &owner, &mut w.wallets)
        .unwrap();
    assert_eq!(deducted, 50);
    assert_eq!(w.platform.deposit_recorded(&property.id()), 50);
    assert_eq!(w.wallets.balance_of(&w.landlord), 350);

    let tenant = w.tenant.clone();
    let refunded = w
        .platform
        .return_property(&lease, &mut property, &tenant, &mut w.wallets)
        .unwrap();
    assert_eq!(refunded, 50);
    assert_eq!(w.wallets.balance_of(&w.tenant), 50);
    assert_eq!(w.platform.deposit_recorded(&property.id()), 0);
    assert_eq!(w.platform.pool_value(), pool_before);
    assert_eq!(property.custodian(), &w.landlord);
    assert!(w.platform.check_solvency().is_ok());

    let kinds: Vec<_> = w.platform.events().iter().map(|e| e.kind.name()).collect();
    assert_eq!(
        kinds,
        [
            "listing_posted",
            "lease_signed",
            "pool_funded",
            "property_handed_over",
            "inspection_submitted",
            "admin_granted",
            "inspection_reviewed",
            "property_returned",
        ]
    );
    let sequences: Vec<_> = w.platform.events().iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, [0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn value_is_conserved_across_cycle() {
    let mut w = World::new();
    let mut property = w.list(250);
    let lease = w.lease(&property, 2, 750).unwrap();
    w.platform.handover_property(&lease, &mut property).unwrap();
    let mut inspection = w
        .platform
        .submit_inspection(&lease, 3, "", vec![], &w.landlord)
        .unwrap();
    let token = w.admin();
    let owner = w.owner.clone();
    w.platform
        .review_inspection(&lease, &mut inspection, &token, 1, &owner, &mut w.wallets)
        .unwrap();
    let tenant = w.tenant.clone();
    w.platform
        .return_property(&lease, &mut property, &tenant, &mut w.wallets)
        .unwrap();

    assert_eq!(
        w.wallets.total() + u128::from(w.platform.pool_value()),
        750,
        "minted value must be fully accounted for"
    );
    assert_eq!(w.wallets.balance_of(&w.landlord), 500 + 62);
    assert_eq!(w.wallets.balance_of(&w.tenant), 188);
}

// ---------------------------------------------------------------------------
// Deposit formula
// ---------------------------------------------------------------------------

#[test]
fn deposit_matches_configured_percent() {
    for (percent, rent, deposit) in [(100, 100, 100), (50, 99, 49), (200, 1234, 2468), (0, 500, 0)] {
        let config = PlatformConfig {
            deposit_percent: percent,
        };
        let mut platform = Platform::with_config(party("owner"), config).unwrap();
        let (listing, _) = platform
            .post_listing(rent, 1, "", "", &party("landlord"))
            .unwrap();
        assert_eq!(listing.deposit, deposit, "percent {percent}, rent {rent}");
    }
}

// ---------------------------------------------------------------------------
// Double booking
// ---------------------------------------------------------------------------

#[test]
fn second_rent_payment_on_leased_property_fails() {
    let mut w = World::new();
    let property = w.list(100);
    w.lease(&property, 1, 200).unwrap();

    let err = w.lease(&property, 1, 200).unwrap_err();
    // The listing was consumed by the first lease.
    assert_eq!(
        err,
        EscrowError::InvalidNotice {
            property_id: property.id()
        }
    );

    // Relisting while escrow is outstanding is refused as double booking.
    let landlord = w.landlord.clone();
    let err = w
        .platform
        .relist_property(&property, 100, &landlord)
        .unwrap_err();
    assert!(matches!(err, EscrowError::DoubleBooking { outstanding: 100, .. }));
    assert_eq!(w.platform.deposit_recorded(&property.id()), 100);
    assert_eq!(w.platform.ledger().len(), 1);
}

// ---------------------------------------------------------------------------
// Exact tender
// ---------------------------------------------------------------------------

#[test]
fn tender_must_match_exactly() {
    for tender in [399, 401] {
        let mut w = World::new();
        let property = w.list(100);
        let (deposit, pool, events) = w.snapshot(&property);
        let err = w.lease(&property, 3, tender).unwrap_err();
        assert_eq!(err, EscrowError::InvalidAmount { tendered: tender, due: 400 });
        assert_eq!(w.snapshot(&property), (deposit, pool, events));
        assert_eq!(w.wallets.balance_of(&w.tenant), u128::from(tender));
        assert!(w.platform.listing(&property.id()).is_some());
    }

    let mut w = World::new();
    let property = w.list(100);
    assert!(w.lease(&property, 3, 400).is_ok());
}

// ---------------------------------------------------------------------------
// Adjudication
// ---------------------------------------------------------------------------

#[test]
fn second_review_rejected_and_ledgers_unchanged() {
    let mut w = World::new();
    let property = w.list(1000);
    let lease = w.lease(&property, 1, 2000).unwrap();
    let mut inspection = w
        .platform
        .submit_inspection(&lease, 1, "", vec![], &w.landlord)
        .unwrap();
    let token = w.admin();
    let owner = w.owner.clone();

    w.platform
        .review_inspection(&lease, &mut inspection, &token, 1, &owner, &mut w.wallets)
        .unwrap();
    assert_eq!(inspection.deducted(), deduction_for(1000, 1));

    let before = w.snapshot(&property);
    let landlord_before = w.wallets.balance_of(&w.landlord);
    let err = w
        .platform
        .review_inspection(&lease, &mut inspection, &token, 3, &owner, &mut w.wallets)
        .unwrap_err();
    assert_eq!(err.code(), "InspectionReviewed");
    assert_eq!(w.snapshot(&property), before);
    assert_eq!(w.wallets.balance_of(&w.landlord), landlord_before);
    assert_eq!(inspection.deducted(), 250);
}

#[test]
fn delegated_admin_can_review() {
    let mut w = World::new();
    let property = w.list(100);
    let lease = w.lease(&property, 1, 200).unwrap();
    let mut inspection = w
        .platform
        .submit_inspection(&lease, 3, "", vec![], &w.landlord)
        .unwrap();

    let owner = w.owner.clone();
    let adjudicator = party("adjudicator");
    let token = w.platform.grant_admin(&owner, adjudicator.clone()).unwrap();
    let deducted = w
        .platform
        .review_inspection(&lease, &mut inspection, &token, 3, &adjudicator, &mut w.wallets)
        .unwrap();
    assert_eq!(deducted, 100);
    assert_eq!(w.platform.deposit_recorded(&property.id()), 0);

    // Nothing left to refund, but the escrow still closes.
    let mut property = property;
    let tenant = w.tenant.clone();
    let refunded = w
        .platform
        .return_property(&lease, &mut property, &tenant, &mut w.wallets)
        .unwrap();
    assert_eq!(refunded, 0);
    assert!(w.platform.ledger().is_empty());
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[test]
fn unauthorized_callers_leave_ledgers_unchanged() {
    let mut w = World::new();
    let mut property = w.list(100);
    let lease = w.lease(&property, 3, 400).unwrap();
    w.platform.handover_property(&lease, &mut property).unwrap();
    let mallory = party("mallory");

    // Only the landlord may file an inspection.
    let err = w
        .platform
        .submit_inspection(&lease, 3, "", vec![], &mallory)
        .unwrap_err();
    assert_eq!(err.code(), "NoPermission");
    let err = w
        .platform
        .submit_inspection(&lease, 3, "", vec![], &w.tenant)
        .unwrap_err();
    assert_eq!(err.code(), "NoPermission");

    // Reviewing with someone else's token.
    let mut inspection = w
        .platform
        .submit_inspection(&lease, 3, "", vec![], &w.landlord)
        .unwrap();
    let token = w.admin();
    let before = w.snapshot(&property);
    let err = w
        .platform
        .review_inspection(&lease, &mut inspection, &token, 3, &mallory, &mut w.wallets)
        .unwrap_err();
    assert_eq!(err.code(), "NoPermission");
    assert_eq!(w.snapshot(&property), before);
    assert_eq!(inspection.status(), InspectionStatus::Pending);

    // A token minted by a platform the landlord owns carries no authority here.
    let landlord = w.landlord.clone();
    let mut own = Platform::new(landlord.clone());
    let self_minted = own.mint_admin(&landlord).unwrap();
    let err = w
        .platform
        .review_inspection(&lease, &mut inspection, &self_minted, 3, &landlord, &mut w.wallets)
        .unwrap_err();
    assert_eq!(err.code(), "NoPermission");
    assert_eq!(w.snapshot(&property), before);
    assert_eq!(inspection.status(), InspectionStatus::Pending);
    assert_eq!(w.wallets.balance_of(&landlord), 300);

    // Only the owner mints tokens.
    let err = w.platform.mint_admin(&mallory).unwrap_err();
    assert_eq!(err.code(), "NoPermission");
    let err = w.platform.grant_admin(&landlord, landlord.clone()).unwrap_err();
    assert_eq!(err.code(), "NoPermission");

    // Only the tenant may return.
    for caller in [mallory.clone(), w.landlord.clone()] {
        let err = w
            .platform
            .return_property(&lease, &mut property, &caller, &mut w.wallets)
            .unwrap_err();
        assert_eq!(err.code(), "NoPermission");
    }
    assert_eq!(w.snapshot(&property), before);
    assert_eq!(property.custodian(), &w.tenant);
    assert_eq!(w.wallets.balance_of(&mallory), 0);
}

#[test]
fn cancel_listing_binds_to_real_caller() {
    let mut w = World::new();
    let property = w.list(100);
    let err = w
        .platform
        .cancel_listing(&property.id(), &party("mallory"))
        .unwrap_err();
    assert_eq!(err.code(), "NoPermission");
    assert!(w.platform.listing(&property.id()).is_some());

    let landlord = w.landlord.clone();
    w.platform.cancel_listing(&property.id(), &landlord).unwrap();
    let err = w.lease(&property, 1, 200).unwrap_err();
    assert_eq!(err.code(), "InvalidNotice");
    assert_eq!(w.wallets.balance_of(&w.tenant), 200);
}

// ---------------------------------------------------------------------------
// Multiple rental cycles
// ---------------------------------------------------------------------------

#[test]
fn property_supports_successive_cycles() {
    let mut w = World::new();
    let mut property = w.list(100);
    let first = w.lease(&property, 1, 200).unwrap();
    w.platform.handover_property(&first, &mut property).unwrap();
    let tenant = w.tenant.clone();
    w.platform
        .return_property(&first, &mut property, &tenant, &mut w.wallets)
        .unwrap();

    let landlord = w.landlord.clone();
    let listing = w.platform.relist_property(&property, 120, &landlord).unwrap();
    assert_eq!(listing.deposit, 120);
    let second = w.lease(&property, 2, 360).unwrap();
    assert_ne!(first.id(), second.id());

    // An inspection filed against the first lease cannot touch the second
    // cycle's escrow.
    let mut stale = w
        .platform
        .submit_inspection(&first, 3, "", vec![], &w.landlord)
        .unwrap();
    let token = w.admin();
    let owner = w.owner.clone();
    let err = w
        .platform
        .review_inspection(&first, &mut stale, &token, 3, &owner, &mut w.wallets)
        .unwrap_err();
    assert_eq!(
        err,
        EscrowError::InvalidDeposit {
            property_id: property.id()
        }
    );
    let err = w
        .platform
        .review_inspection(&second, &mut stale, &token, 3, &owner, &mut w.wallets)
        .unwrap_err();
    assert_eq!(err.code(), "WrongParams");
    assert_eq!(w.platform.deposit_recorded(&property.id()), 120);
}
