#![deny(missing_docs)]

//! # tenure-core — Foundational Types for the Tenure Escrow Engine
//!
//! This crate defines the types every other crate in the workspace depends on.
//! It has no internal crate dependencies — only `serde`, `serde_json`,
//! `thiserror`, `chrono`, `uuid`, and `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** You cannot pass a [`LeaseId`]
//!    where a [`PropertyId`] is expected, and a [`PartyId`] is validated at
//!    construction.
//!
//! 2. **[`CanonicalBytes`] is the sole path to digest computation.** Evidence
//!    digests for inspection reports flow through `CanonicalBytes::new()`.
//!
//! 3. **Value is linear.** [`Coin`] is not `Clone` and has no public
//!    constructor other than [`Coin::mint`]; value moves by `split`/`join`,
//!    never by copy.
//!
//! 4. **Structured errors.** `thiserror` enums, no `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod value;
pub mod wallet;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValidationError, ValueError};
pub use identity::{AdminTokenId, InspectionId, LeaseId, PartyId, PlatformId, PropertyId};
pub use temporal::Timestamp;
pub use value::{Balance, Coin};
pub use wallet::{ValueSink, Wallets};
