//! # Identity Newtypes
//!
//! Identifiers for every tracked record. Each is a distinct type, so a
//! [`LeaseId`] can never be passed where a [`PropertyId`] is expected.
//!
//! ## Validation
//!
//! UUID-based identifiers are always valid by construction and stand in for
//! the object substrate's globally unique ids. [`PartyId`] is the identity of
//! an authenticated caller (landlord, tenant, administrator, platform owner)
//! and is validated at construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a platform deployment.
    PlatformId,
    "platform"
);
uuid_id!(
    /// Identifier of a leasable property. Also the key of the listing
    /// registry and the deposit ledger.
    PropertyId,
    "property"
);
uuid_id!(
    /// Identifier of a signed lease.
    LeaseId,
    "lease"
);
uuid_id!(
    /// Identifier of a damage inspection.
    InspectionId,
    "inspection"
);
uuid_id!(
    /// Identifier of a minted administrator capability.
    AdminTokenId,
    "admin"
);

/// Identity of an authenticated party.
///
/// Supplied by the transaction-authentication layer, never self-asserted by a
/// payload. 1-128 characters drawn from `[A-Za-z0-9._:-]`, which admits both
/// short handles (`alice`) and account addresses (`0x5f1c…`, `did:key:z6Mk…`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyId(String);

impl PartyId {
    /// Create a party identifier, validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPartyId`] if the value is empty,
    /// longer than 128 characters, or contains a disallowed character.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s.len() <= 128
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'));
        if !valid {
            return Err(ValidationError::InvalidPartyId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PartyId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartyId> for String {
    fn from(id: PartyId) -> Self {
        id.0
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
