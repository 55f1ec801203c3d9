//! # tenure-escrow — Rental Lifecycle and Deposit Escrow
//!
//! The permissioned state machine coordinating a landlord, a tenant, and a
//! platform administrator over one property's rental cycle:
//!
//! ```text
//!   post_listing ──▶ Listing ──pay_rent──▶ Lease + DepositEntry
//!        ▲                                       │
//!        │                              handover_property
//!   relist_property                              │
//!        │                                       ▼
//!        │            submit_inspection ──▶ Inspection (PENDING)
//!        │                                       │
//!        │                              review_inspection
//!        │                          (deduction ▶ landlord)
//!        │                                       ▼
//!        └──────── return_property ◀──── Inspection (REVIEWED)
//!                 (remainder ▶ tenant,
//!                  entry closed)
//! ```
//!
//! ## Custody Model
//!
//! Deposits are held in one pooled [`tenure_core::Balance`] inside the
//! [`DepositLedger`], with a per-property [`DepositEntry`] recording how
//! much of the pool is earmarked for each property. The invariant
//! `sum(entries) <= pool` holds after every committed operation and is
//! auditable through [`Platform::check_solvency`].
//!
//! ## Atomicity
//!
//! Every operation performs all of its checks before its first mutation.
//! A rejected call changes nothing: not the registry, not the ledger, not
//! the pool, not the event log, not the caller's coin. Payouts leave the
//! engine through a [`tenure_core::ValueSink`] only after the commit.
//!
//! ## Authorization
//!
//! Every operation takes the authenticated caller explicitly. Landlord and
//! tenant roles are checked against the lease or listing; administrator
//! authority is an [`AdminToken`] that only the platform owner can mint, and
//! that carries no authority on any other platform.

pub mod config;
pub mod error;
pub mod events;
pub mod inspection;
pub mod lease;
pub mod ledger;
pub mod listing;
pub mod platform;
pub mod schedule;
pub mod settlement;

pub use config::{ConfigError, PlatformConfig};
pub use error::EscrowError;
pub use events::{EventKind, PlatformEvent};
pub use inspection::{Inspection, InspectionStatus};
pub use lease::{Lease, RentSplit};
pub use ledger::{DepositEntry, DepositLedger};
pub use listing::{Listing, Property};
pub use platform::{AdminToken, Platform};
pub use schedule::{deduction_for, DamageLevel};
