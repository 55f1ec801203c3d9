//! # Listing Registry
//!
//! Active rental offers keyed by property identifier, and the [`Property`]
//! record each offer describes.
//!
//! A listing lives from `post_listing` (or `relist_property`) until a lease
//! consumes it or the landlord cancels it. Registry key uniqueness is the
//! one-listing-per-property rule; a property with escrow still outstanding
//! cannot be listed again.

use serde::{Deserialize, Serialize};

use tenure_core::{PartyId, PropertyId};

use crate::error::EscrowError;
use crate::events::EventKind;
use crate::lease::Lease;
use crate::platform::Platform;

/// An offer to lease a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// The property on offer.
    pub property_id: PropertyId,
    /// The landlord who posted the offer.
    pub landlord: PartyId,
    /// Rent per month.
    pub monthly_rent: u64,
    /// Deposit computed from the platform's deposit percentage.
    pub deposit: u64,
}

/// The leasable asset and its current custodian.
///
/// Not `Clone` and not `Deserialize`: there is exactly one record per
/// property and custody changes only through the lifecycle operations.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Property {
    id: PropertyId,
    landlord: PartyId,
    area: u64,
    custodian: PartyId,
    photo: String,
    description: String,
}

impl Property {
    /// Property identifier.
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// The landlord who posted the property.
    pub fn landlord(&self) -> &PartyId {
        &self.landlord
    }

    /// Floor area.
    pub fn area(&self) -> u64 {
        self.area
    }

    /// Who currently holds the property.
    pub fn custodian(&self) -> &PartyId {
        &self.custodian
    }

    /// Photo reference.
    pub fn photo(&self) -> &str {
        &self.photo
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }

    fn hand_to(&mut self, tenant: &PartyId) {
        tracing::info!(
            property = %self.id,
            from = %self.custodian,
            to = %tenant,
            "property handed over"
        );
        self.custodian = tenant.clone();
    }

    pub(crate) fn ensure_matches(&self, lease: &Lease) -> Result<(), EscrowError> {
        if self.id != lease.property_id() {
            return Err(EscrowError::InvalidHouse {
                expected: lease.property_id(),
                presented: self.id,
            });
        }
        Ok(())
    }

    pub(crate) fn set_custodian(&mut self, custodian: PartyId) {
        self.custodian = custodian;
    }
}

impl Platform {
    /// Transfer custody of `property` to the lease's tenant.
    ///
    /// Holding both the property and a matching lease is the only gate; the
    /// landlord is not required to be the caller.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InvalidHouse`] if the lease is for a different
    /// property.
    pub fn handover_property(
        &mut self,
        lease: &Lease,
        property: &mut Property,
    ) -> Result<(), EscrowError> {
        property.ensure_matches(lease)?;
        property.hand_to(lease.tenant());
        self.record(EventKind::PropertyHandedOver {
            property_id: property.id,
            lease_id: lease.id(),
            tenant: lease.tenant().clone(),
        });
        Ok(())
    }

    /// Post a new listing for a freshly created property owned by `landlord`.
    ///
    /// `deposit = monthly_rent * deposit_percent / 100`, truncating.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::Overflow`] if the deposit computation overflows.
    /// - [`EscrowError::AlreadyListed`] if the registry already holds the key.
    pub fn post_listing(
        &mut self,
        monthly_rent: u64,
        area: u64,
        description: impl Into<String>,
        photo: impl Into<String>,
        landlord: &PartyId,
    ) -> Result<(Listing, Property), EscrowError> {
        let property = Property {
            id: PropertyId::new(),
            landlord: landlord.clone(),
            area,
            custodian: landlord.clone(),
            photo: photo.into(),
            description: description.into(),
        };
        let listing = self.list(property.id, monthly_rent, landlord)?;
        Ok((listing, property))
    }

    /// Offer an existing property for a new rental cycle.
    ///
    /// Only the property's landlord may, and any deposit from the previous
    /// cycle must have been settled.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::NoPermission`] if `caller` is not the landlord.
    /// - [`EscrowError::DoubleBooking`] if escrow is still outstanding.
    /// - [`EscrowError::AlreadyListed`] if a listing already exists.
    /// - [`EscrowError::Overflow`] if the deposit computation overflows.
    pub fn relist_property(
        &mut self,
        property: &Property,
        monthly_rent: u64,
        caller: &PartyId,
    ) -> Result<Listing, EscrowError> {
        if property.landlord != *caller {
            tracing::warn!(%caller, property = %property.id, "relist by non-landlord rejected");
            return Err(EscrowError::no_permission(
                "relist property",
                caller,
                "property landlord",
            ));
        }
        self.ledger.ensure_vacant(&property.id)?;
        self.list(property.id, monthly_rent, caller)
    }

    /// Remove an unclaimed listing. Only the landlord who posted it may.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::InvalidNotice`] if no listing exists.
    /// - [`EscrowError::NoPermission`] if `caller` is not the listing's landlord.
    pub fn cancel_listing(
        &mut self,
        property_id: &PropertyId,
        caller: &PartyId,
    ) -> Result<Listing, EscrowError> {
        let listing = self.require_listing(property_id)?;
        if listing.landlord != *caller {
            tracing::warn!(%caller, property = %property_id, "listing cancellation by non-landlord rejected");
            return Err(EscrowError::no_permission(
                "cancel listing",
                caller,
                "listing landlord",
            ));
        }
        let listing = self
            .listings
            .remove(property_id)
            .ok_or(EscrowError::InvalidNotice {
                property_id: *property_id,
            })?;
        tracing::info!(property = %property_id, landlord = %caller, "listing cancelled");
        self.record(EventKind::ListingCancelled {
            property_id: *property_id,
            landlord: listing.landlord.clone(),
        });
        Ok(listing)
    }

    /// Deposit due for `monthly_rent` under the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Overflow`] if the product exceeds 64 bits.
    pub fn deposit_for(&self, monthly_rent: u64) -> Result<u64, EscrowError> {
        monthly_rent
            .checked_mul(self.config().deposit_percent)
            .map(|scaled| scaled / 100)
            .ok_or(EscrowError::Overflow {
                operation: "deposit",
            })
    }

    pub(crate) fn require_listing(&self, property_id: &PropertyId) -> Result<&Listing, EscrowError> {
        self.listings
            .get(property_id)
            .ok_or(EscrowError::InvalidNotice {
                property_id: *property_id,
            })
    }

    fn list(
        &mut self,
        property_id: PropertyId,
        monthly_rent: u64,
        landlord: &PartyId,
    ) -> Result<Listing, EscrowError> {
        let deposit = self.deposit_for(monthly_rent)?;
        if self.listings.contains_key(&property_id) {
            return Err(EscrowError::AlreadyListed { property_id });
        }
        let listing = Listing {
            property_id,
            landlord: landlord.clone(),
            monthly_rent,
            deposit,
        };
        self.listings.insert(property_id, listing.clone());
        tracing::info!(property = %property_id, %landlord, monthly_rent, deposit, "listing posted");
        self.record(EventKind::ListingPosted {
            property_id,
            landlord: landlord.clone(),
            monthly_rent,
            deposit,
        });
        Ok(listing)
    }
}
