//! # Error Types
//!
//! Structured errors for the foundational types, built with `thiserror`.
//! Engine-level errors live in `tenure-escrow`; these cover the primitives
//! the engine is built on.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use integers for amounts: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for identifier newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Party identifier is empty, too long, or contains disallowed characters.
    #[error("invalid party identifier: \"{0}\" (expected 1-128 characters of [A-Za-z0-9._:-])")]
    InvalidPartyId(String),
}

/// Errors raised by the value custody primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A split or withdrawal asked for more value than is held.
    #[error("insufficient value: requested {requested}, available {available}")]
    Insufficient {
        /// The requested amount.
        requested: u64,
        /// The amount actually held.
        available: u64,
    },

    /// Joining would overflow the 64-bit value counter.
    #[error("value overflow joining {incoming} into {held}")]
    Overflow {
        /// The amount already held.
        held: u64,
        /// The amount being joined.
        incoming: u64,
    },

}
