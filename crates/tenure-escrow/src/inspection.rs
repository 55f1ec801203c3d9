//! # Inspection and Adjudication
//!
//! After a tenancy the landlord files an [`Inspection`] reporting a damage
//! level with free-text and photo evidence. An administrator holding an
//! [`AdminToken`] assesses it exactly once; the assessed level fixes the
//! deduction moved from the pool to the landlord.
//!
//! ## State Machine
//!
//! ```text
//! PENDING ──review──▶ REVIEWED (terminal)
//! ```
//!
//! The status field is the only guard against a second adjudication.
//!
//! The evidence (reported level, description, photos) is fingerprinted with
//! a SHA-256 digest over its canonical JSON when the report is filed, so the
//! record an administrator reviews can be matched to what was submitted.

use serde::Serialize;

use tenure_core::{
    sha256_digest, CanonicalBytes, ContentDigest, InspectionId, LeaseId, PartyId, PropertyId,
    Timestamp, ValueSink,
};

use crate::error::EscrowError;
use crate::events::EventKind;
use crate::lease::Lease;
use crate::platform::{AdminToken, Platform};
use crate::schedule::DamageLevel;

/// Review status of an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    /// Filed, awaiting an administrator.
    Pending,
    /// Adjudicated. Terminal.
    Reviewed,
}

impl InspectionStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Reviewed)
    }

    /// Canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reviewed => "REVIEWED",
        }
    }
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence as it is fingerprinted.
#[derive(Serialize)]
struct Evidence<'a> {
    property_id: PropertyId,
    lease_id: LeaseId,
    reported: DamageLevel,
    description: &'a str,
    photos: &'a [String],
}

/// A landlord's damage report and its adjudication outcome.
///
/// Not `Clone` and not `Deserialize`, so a reviewed inspection cannot be
/// duplicated back into a pending one.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Inspection {
    id: InspectionId,
    property_id: PropertyId,
    lease_id: LeaseId,
    landlord: PartyId,
    reported: DamageLevel,
    description: String,
    photos: Vec<String>,
    evidence_digest: ContentDigest,
    assessed: Option<DamageLevel>,
    deducted: u64,
    status: InspectionStatus,
    submitted_at: Timestamp,
    reviewed_at: Option<Timestamp>,
}

impl Inspection {
    /// Build a pending report against `lease`, checking the filer and level.
    fn file(
        lease: &Lease,
        damage_level: u8,
        description: impl Into<String>,
        photos: Vec<String>,
        caller: &PartyId,
    ) -> Result<Self, EscrowError> {
        if caller != lease.landlord() {
            tracing::warn!(%caller, lease = %lease.id(), "inspection filed by non-landlord rejected");
            return Err(EscrowError::no_permission(
                "submit inspection",
                caller,
                "lease landlord",
            ));
        }
        let reported = DamageLevel::try_from(damage_level)?;
        let description = description.into();

        let canonical = CanonicalBytes::new(&Evidence {
            property_id: lease.property_id(),
            lease_id: lease.id(),
            reported,
            description: &description,
            photos: &photos,
        })
        .map_err(|e| EscrowError::Evidence {
            reason: e.to_string(),
        })?;
        let evidence_digest = sha256_digest(&canonical);

        let inspection = Self {
            id: InspectionId::new(),
            property_id: lease.property_id(),
            lease_id: lease.id(),
            landlord: caller.clone(),
            reported,
            description,
            photos,
            evidence_digest,
            assessed: None,
            deducted: 0,
            status: InspectionStatus::Pending,
            submitted_at: Timestamp::now(),
            reviewed_at: None,
        };
        tracing::info!(
            inspection = %inspection.id,
            property = %inspection.property_id,
            reported = %reported,
            "inspection submitted"
        );
        Ok(inspection)
    }

    /// Inspection identifier.
    pub fn id(&self) -> InspectionId {
        self.id
    }

    /// The inspected property.
    pub fn property_id(&self) -> PropertyId {
        self.property_id
    }

    /// The lease the report was filed against.
    pub fn lease_id(&self) -> LeaseId {
        self.lease_id
    }

    /// The landlord who filed.
    pub fn landlord(&self) -> &PartyId {
        &self.landlord
    }

    /// Damage level the landlord reported.
    pub fn reported(&self) -> DamageLevel {
        self.reported
    }

    /// Free-text evidence.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Photo references.
    pub fn photos(&self) -> &[String] {
        &self.photos
    }

    /// Fingerprint of the submitted evidence.
    pub fn evidence_digest(&self) -> &ContentDigest {
        &self.evidence_digest
    }

    /// Damage level the administrator assessed, once reviewed.
    pub fn assessed(&self) -> Option<DamageLevel> {
        self.assessed
    }

    /// Amount moved to the landlord on review (0 while pending).
    pub fn deducted(&self) -> u64 {
        self.deducted
    }

    /// Current status.
    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    /// When the report was filed.
    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    /// When the report was reviewed.
    pub fn reviewed_at(&self) -> Option<Timestamp> {
        self.reviewed_at
    }
}

impl Platform {
    /// File a damage report against `lease`. Only the lease's landlord may.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::NoPermission`] if `caller` is not the lease's landlord.
    /// - [`EscrowError::DamageIncorrect`] if `damage_level` is outside 0..=3.
    /// - [`EscrowError::Evidence`] if the evidence cannot be canonicalized.
    pub fn submit_inspection(
        &mut self,
        lease: &Lease,
        damage_level: u8,
        description: impl Into<String>,
        photos: Vec<String>,
        caller: &PartyId,
    ) -> Result<Inspection, EscrowError> {
        let inspection = Inspection::file(lease, damage_level, description, photos, caller)?;
        self.record(EventKind::InspectionSubmitted {
            inspection_id: inspection.id,
            property_id: inspection.property_id,
            reported: inspection.reported,
            evidence_digest: inspection.evidence_digest.clone(),
        });
        Ok(inspection)
    }

    /// Adjudicate `inspection` at `assessed` and pay the deduction to the
    /// landlord out of the pool.
    ///
    /// The deduction is the schedule applied to the lease's paid deposit. The
    /// pool check is against the whole pool; the property's own entry only
    /// has to be large enough not to underflow.
    ///
    /// Returns the amount deducted.
    ///
    /// # Errors
    ///
    /// Checked in this order, all before any mutation:
    ///
    /// - [`EscrowError::NoPermission`] if `token` was minted by another
    ///   platform or `caller` does not hold it.
    /// - [`EscrowError::DamageIncorrect`] if `assessed` is outside 0..=3.
    /// - [`EscrowError::WrongParams`] if the inspection belongs to another
    ///   property or lease.
    /// - [`EscrowError::InspectionReviewed`] if already reviewed.
    /// - [`EscrowError::InvalidDeposit`] if no entry for this lease is open.
    /// - [`EscrowError::InsufficientBalance`] if the pool, or the property's
    ///   entry, cannot cover the deduction.
    pub fn review_inspection(
        &mut self,
        lease: &Lease,
        inspection: &mut Inspection,
        token: &AdminToken,
        assessed: u8,
        caller: &PartyId,
        sink: &mut impl ValueSink,
    ) -> Result<u64, EscrowError> {
        self.authorize_admin(token, caller, "review inspection")?;
        let level = DamageLevel::try_from(assessed)?;
        if inspection.property_id != lease.property_id() {
            return Err(EscrowError::WrongParams {
                inspection_id: inspection.id,
                reason: "property does not match lease",
            });
        }
        if inspection.lease_id != lease.id() {
            return Err(EscrowError::WrongParams {
                inspection_id: inspection.id,
                reason: "filed against a different lease",
            });
        }
        if inspection.status.is_terminal() {
            return Err(EscrowError::InspectionReviewed {
                inspection_id: inspection.id,
            });
        }

        let deduction = level.deduction(lease.deposit_paid());
        tracing::debug!(
            inspection = %inspection.id,
            deposit = lease.deposit_paid(),
            level = %level,
            deduction,
            "deduction computed"
        );
        let payout = self
            .ledger
            .deduct(&lease.property_id(), &lease.id(), deduction)?;

        inspection.assessed = Some(level);
        inspection.deducted = deduction;
        inspection.status = InspectionStatus::Reviewed;
        inspection.reviewed_at = Some(Timestamp::now());
        if deduction > 0 {
            sink.transfer(lease.landlord(), payout);
        }

        tracing::info!(
            inspection = %inspection.id,
            property = %inspection.property_id,
            assessed = %level,
            deduction,
            admin = %caller,
            "inspection reviewed"
        );
        self.record(EventKind::InspectionReviewed {
            inspection_id: inspection.id,
            property_id: inspection.property_id,
            assessed: level,
            deducted: deduction,
        });
        Ok(deduction)
    }
}
