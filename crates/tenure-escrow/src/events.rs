//! # Lifecycle Events
//!
//! Append-only record of every committed platform operation. Rejected
//! operations never append, so the log is exactly the sequence of state
//! changes the ledgers went through.

use serde::{Deserialize, Serialize};

use tenure_core::{
    AdminTokenId, ContentDigest, InspectionId, LeaseId, PartyId, PropertyId, Timestamp,
};

use crate::schedule::DamageLevel;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// The owner granted an administrator capability.
    AdminGranted {
        token_id: AdminTokenId,
        holder: PartyId,
    },
    /// A landlord posted a listing.
    ListingPosted {
        property_id: PropertyId,
        landlord: PartyId,
        monthly_rent: u64,
        deposit: u64,
    },
    /// A landlord withdrew an unclaimed listing.
    ListingCancelled {
        property_id: PropertyId,
        landlord: PartyId,
    },
    /// A tenant paid rent and deposit; the listing became a lease.
    LeaseSigned {
        lease_id: LeaseId,
        property_id: PropertyId,
        tenant: PartyId,
        landlord: PartyId,
        rent: u64,
        deposit: u64,
    },
    /// Custody of the property passed to the tenant.
    PropertyHandedOver {
        property_id: PropertyId,
        lease_id: LeaseId,
        tenant: PartyId,
    },
    /// A landlord filed a damage report.
    InspectionSubmitted {
        inspection_id: InspectionId,
        property_id: PropertyId,
        reported: DamageLevel,
        evidence_digest: ContentDigest,
    },
    /// Value was merged into the deposit pool.
    PoolFunded { amount: u64, pool_value: u64 },
    /// An administrator adjudicated an inspection.
    InspectionReviewed {
        inspection_id: InspectionId,
        property_id: PropertyId,
        assessed: DamageLevel,
        deducted: u64,
    },
    /// The tenant returned the property and the escrow closed.
    PropertyReturned {
        property_id: PropertyId,
        tenant: PartyId,
        refunded: u64,
    },
}

impl EventKind {
    /// Short name of the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AdminGranted { .. } => "admin_granted",
            Self::ListingPosted { .. } => "listing_posted",
            Self::ListingCancelled { .. } => "listing_cancelled",
            Self::LeaseSigned { .. } => "lease_signed",
            Self::PropertyHandedOver { .. } => "property_handed_over",
            Self::InspectionSubmitted { .. } => "inspection_submitted",
            Self::PoolFunded { .. } => "pool_funded",
            Self::InspectionReviewed { .. } => "inspection_reviewed",
            Self::PropertyReturned { .. } => "property_returned",
        }
    }
}

/// A sequenced, timestamped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// When the operation committed.
    pub at: Timestamp,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}
