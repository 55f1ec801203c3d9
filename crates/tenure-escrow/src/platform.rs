//! # Platform
//!
//! The owned aggregate every operation runs against: listing registry,
//! deposit ledger with its pool, owner identity, configuration, and the
//! event log. Operations take `&mut Platform`, so the borrow checker is the
//! single-writer guarantee; the operations themselves live next to the
//! records they create (`listing`, `lease`, `inspection`, `settlement`).

use std::collections::BTreeMap;

use serde::Serialize;

use tenure_core::{AdminTokenId, Coin, PartyId, PlatformId, PropertyId, Timestamp};

use crate::config::{ConfigError, PlatformConfig};
use crate::error::EscrowError;
use crate::events::{EventKind, PlatformEvent};
use crate::ledger::DepositLedger;
use crate::listing::Listing;

/// Proof of administrative authority.
///
/// Only [`Platform::grant_admin`] can construct one, and it is neither
/// `Clone` nor `Deserialize`, so possession cannot be forged or duplicated.
/// A token authorizes only the identity it was granted to, and only on the
/// platform that minted it.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AdminToken {
    id: AdminTokenId,
    platform: PlatformId,
    holder: PartyId,
    granted_at: Timestamp,
}

impl AdminToken {
    /// Token identifier.
    pub fn id(&self) -> AdminTokenId {
        self.id
    }

    /// The platform that minted this token.
    pub fn platform(&self) -> PlatformId {
        self.platform
    }

    /// The identity this token was granted to.
    pub fn holder(&self) -> &PartyId {
        &self.holder
    }

    /// When the token was minted.
    pub fn granted_at(&self) -> Timestamp {
        self.granted_at
    }
}

/// A platform deployment.
#[derive(Debug, Serialize)]
pub struct Platform {
    id: PlatformId,
    owner: PartyId,
    config: PlatformConfig,
    pub(crate) listings: BTreeMap<PropertyId, Listing>,
    pub(crate) ledger: DepositLedger,
    events: Vec<PlatformEvent>,
}

impl Platform {
    /// Create a platform owned by `owner` with the default configuration.
    pub fn new(owner: PartyId) -> Self {
        Self::build(owner, PlatformConfig::default())
    }

    /// Create a platform with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn with_config(owner: PartyId, config: PlatformConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(owner, config))
    }

    fn build(owner: PartyId, config: PlatformConfig) -> Self {
        let platform = Self {
            id: PlatformId::new(),
            owner,
            config,
            listings: BTreeMap::new(),
            ledger: DepositLedger::new(),
            events: Vec::new(),
        };
        tracing::info!(
            platform = %platform.id,
            owner = %platform.owner,
            deposit_percent = config.deposit_percent,
            "platform created"
        );
        platform
    }

    /// Mint an admin token for the caller. Only the owner may do this.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::NoPermission`] if `caller` is not the owner.
    pub fn mint_admin(&mut self, caller: &PartyId) -> Result<AdminToken, EscrowError> {
        self.grant_admin(caller, caller.clone())
    }

    /// Mint an admin token for `grantee`. Only the owner may do this.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::NoPermission`] if `caller` is not the owner.
    pub fn grant_admin(
        &mut self,
        caller: &PartyId,
        grantee: PartyId,
    ) -> Result<AdminToken, EscrowError> {
        if *caller != self.owner {
            tracing::warn!(%caller, "admin grant attempted by non-owner");
            return Err(EscrowError::no_permission(
                "grant admin",
                caller,
                "platform owner",
            ));
        }
        let token = AdminToken {
            id: AdminTokenId::new(),
            platform: self.id,
            holder: grantee,
            granted_at: Timestamp::now(),
        };
        tracing::info!(token = %token.id, holder = %token.holder, "admin token granted");
        self.record(EventKind::AdminGranted {
            token_id: token.id,
            holder: token.holder.clone(),
        });
        Ok(token)
    }

    /// Reject unless `token` was minted here and `caller` holds it.
    pub(crate) fn authorize_admin(
        &self,
        token: &AdminToken,
        caller: &PartyId,
        action: &'static str,
    ) -> Result<(), EscrowError> {
        if token.platform != self.id {
            tracing::warn!(%caller, token = %token.id, action, "admin token from another platform");
            return Err(EscrowError::no_permission(action, caller, "admin of this platform"));
        }
        if token.holder != *caller {
            tracing::warn!(%caller, token = %token.id, action, "admin token presented by non-holder");
            return Err(EscrowError::no_permission(action, caller, "admin token holder"));
        }
        Ok(())
    }

    /// Merge value into the deposit pool.
    ///
    /// This is how the deposit portion returned by
    /// [`Platform::pay_rent_split`] enters custody.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Overflow`] if the pool would exceed `u64::MAX`.
    pub fn fund_pool(&mut self, coin: Coin) -> Result<u64, EscrowError> {
        let amount = coin.value();
        let pool_value = self.ledger.fund(coin)?;
        tracing::debug!(amount, pool_value, "deposit pool funded");
        self.record(EventKind::PoolFunded { amount, pool_value });
        Ok(pool_value)
    }

    /// Platform identifier.
    pub fn id(&self) -> PlatformId {
        self.id
    }

    /// Owner identity.
    pub fn owner(&self) -> &PartyId {
        &self.owner
    }

    /// Active configuration.
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Escrowed deposit for `property_id`, zero if none is outstanding.
    pub fn deposit_recorded(&self, property_id: &PropertyId) -> u64 {
        self.ledger.recorded(property_id)
    }

    /// The active listing for `property_id`.
    pub fn listing(&self, property_id: &PropertyId) -> Option<&Listing> {
        self.listings.get(property_id)
    }

    /// All active listings in property order.
    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }

    /// The deposit ledger (read-only).
    pub fn ledger(&self) -> &DepositLedger {
        &self.ledger
    }

    /// Value in the deposit pool.
    pub fn pool_value(&self) -> u64 {
        self.ledger.pool_value()
    }

    /// Sum of every outstanding deposit entry.
    pub fn outstanding_deposits(&self) -> u128 {
        self.ledger.outstanding()
    }

    /// Verify `pool value >= outstanding deposits`.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InsufficientBalance`] if the invariant is broken.
    pub fn check_solvency(&self) -> Result<(), EscrowError> {
        self.ledger.check_solvency()
    }

    /// The event log, oldest first.
    pub fn events(&self) -> &[PlatformEvent] {
        &self.events
    }

    pub(crate) fn record(&mut self, kind: EventKind) {
        let sequence = self.events.len() as u64;
        self.events.push(PlatformEvent {
            sequence,
            at: Timestamp::now(),
            kind,
        });
    }
}
