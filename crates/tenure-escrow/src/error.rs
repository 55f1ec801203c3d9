//! # Escrow Error Types
//!
//! Every rejection the engine can produce. All are terminal for the
//! invocation that raised them: the operation is aborted before any
//! mutation, and resubmission with corrected inputs is the caller's decision.
//!
//! Each variant carries enough context to diagnose the failure without logs,
//! and [`EscrowError::code`] gives a stable name for reports and scripts.

use thiserror::Error;

use tenure_core::{InspectionId, PartyId, PropertyId, ValueError};

/// Errors arising from escrow and lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Caller identity does not hold the role the action requires.
    #[error("{caller} may not {action}: requires {required}")]
    NoPermission {
        /// The attempted action (e.g., "cancel listing").
        action: &'static str,
        /// The invoking identity.
        caller: PartyId,
        /// The role that was required (e.g., "lease landlord").
        required: &'static str,
    },

    /// Requested tenancy duration is zero.
    #[error("invalid tenancy of {months} months: must be at least one month")]
    InvalidTenancy {
        /// The requested number of months.
        months: u64,
    },

    /// No listing exists for the property.
    #[error("no active listing for {property_id}")]
    InvalidNotice {
        /// The property that was looked up.
        property_id: PropertyId,
    },

    /// The property presented does not belong to the lease presented.
    #[error("{presented} is not the property of this lease ({expected})")]
    InvalidHouse {
        /// The property the lease refers to.
        expected: PropertyId,
        /// The property that was presented.
        presented: PropertyId,
    },

    /// No deposit is escrowed for the property.
    #[error("no escrowed deposit for {property_id}")]
    InvalidDeposit {
        /// The property that was looked up.
        property_id: PropertyId,
    },

    /// Tendered value does not exactly equal the total due.
    #[error("tendered {tendered} but exactly {due} is due")]
    InvalidAmount {
        /// The value tendered.
        tendered: u64,
        /// The exact value due.
        due: u64,
    },

    /// Damage level outside 0..=3.
    #[error("damage level {level} is outside 0..=3")]
    DamageIncorrect {
        /// The rejected level.
        level: u8,
    },

    /// Lease and inspection refer to different records.
    #[error("inspection {inspection_id} does not belong to this lease: {reason}")]
    WrongParams {
        /// The inspection presented.
        inspection_id: InspectionId,
        /// Which cross-reference failed.
        reason: &'static str,
    },

    /// The inspection has already been adjudicated.
    #[error("inspection {inspection_id} has already been reviewed")]
    InspectionReviewed {
        /// The inspection presented.
        inspection_id: InspectionId,
    },

    /// Custody cannot cover a required disbursement.
    #[error("insufficient balance in {held_by}: required {required}, available {available}")]
    InsufficientBalance {
        /// Which balance fell short ("deposit pool" or "deposit entry").
        held_by: &'static str,
        /// The amount that had to be disbursed.
        required: u64,
        /// The amount available.
        available: u64,
    },

    /// A listing already exists for the property.
    #[error("{property_id} is already listed")]
    AlreadyListed {
        /// The property key that collided.
        property_id: PropertyId,
    },

    /// A deposit is still escrowed for the property, so it cannot be leased again.
    #[error("{property_id} still has {outstanding} in escrow")]
    DoubleBooking {
        /// The property.
        property_id: PropertyId,
        /// The amount still escrowed.
        outstanding: u64,
    },

    /// An amount computation exceeded 64 bits.
    #[error("arithmetic overflow computing {operation}")]
    Overflow {
        /// What was being computed.
        operation: &'static str,
    },

    /// Inspection evidence could not be canonicalized for digesting.
    #[error("inspection evidence rejected: {reason}")]
    Evidence {
        /// Why canonicalization failed.
        reason: String,
    },

    /// The value primitive refused a transfer.
    #[error("value transfer failed: {0}")]
    Value(#[from] ValueError),
}

impl EscrowError {
    /// Stable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoPermission { .. } => "NoPermission",
            Self::InvalidTenancy { .. } => "InvalidTenancy",
            Self::InvalidNotice { .. } => "InvalidNotice",
            Self::InvalidHouse { .. } => "InvalidHouse",
            Self::InvalidDeposit { .. } => "InvalidDeposit",
            Self::InvalidAmount { .. } => "InvalidAmount",
            Self::DamageIncorrect { .. } => "DamageIncorrect",
            Self::WrongParams { .. } => "WrongParams",
            Self::InspectionReviewed { .. } => "InspectionReviewed",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::AlreadyListed { .. } => "AlreadyListed",
            Self::DoubleBooking { .. } => "DoubleBooking",
            Self::Overflow { .. } => "Overflow",
            Self::Evidence { .. } => "Evidence",
            Self::Value(_) => "Value",
        }
    }

    pub(crate) fn no_permission(
        action: &'static str,
        caller: &PartyId,
        required: &'static str,
    ) -> Self {
        Self::NoPermission {
            action,
            caller: caller.clone(),
            required,
        }
    }
}
