//! # Scenario Runner
//!
//! Replays a YAML scenario against a fresh [`Platform`] with an in-memory
//! [`Wallets`] book and reports every step's outcome as JSON.
//!
//! ```yaml
//! owner: platform-owner
//! config:
//!   deposit_percent: 100
//! wallets:
//!   tenant: 400
//! steps:
//!   - action: post_listing
//!     property: flat
//!     landlord: landlord
//!     monthly_rent: 100
//!   - action: pay_rent
//!     property: flat
//!     tenant: tenant
//!     months: 3
//!   - action: return_property
//!     property: flat
//!     caller: landlord
//!     expect_error: NoPermission
//! ```
//!
//! Properties and inspections are named by labels. The lease of a property
//! is the most recent one formed against its label. A step may carry
//! `expect_error: <code>`; a step whose outcome differs from its expectation
//! fails the run but does not stop it.
//!
//! Engine rejections are step outcomes. Problems with the scenario itself
//! (unknown labels, an empty wallet, a missing admin token) abort the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tenure_core::{PartyId, PlatformId, ValueSink, Wallets};
use tenure_escrow::{
    AdminToken, EscrowError, Inspection, Lease, Platform, PlatformConfig, PlatformEvent, Property,
};

/// Arguments for `tenure run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario file (YAML).
    pub scenario: PathBuf,

    /// Write the JSON report to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// A declarative lifecycle scenario.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Platform owner.
    pub owner: PartyId,
    /// Platform configuration; defaults apply when absent.
    #[serde(default)]
    pub config: Option<PlatformConfig>,
    /// Opening wallet balances.
    #[serde(default)]
    pub wallets: BTreeMap<PartyId, u64>,
    /// Steps, executed in order.
    pub steps: Vec<Step>,
}

/// One scenario step.
#[derive(Debug, Deserialize)]
pub struct Step {
    /// Error code the step is expected to fail with.
    #[serde(default)]
    pub expect_error: Option<String>,
    /// The operation.
    #[serde(flatten)]
    pub action: Action,
}

/// Scenario operations, one per engine entry point.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    PostListing {
        property: String,
        landlord: PartyId,
        monthly_rent: u64,
        #[serde(default)]
        area: u64,
        #[serde(default)]
        description: String,
        #[serde(default)]
        photo: String,
    },
    RelistProperty {
        property: String,
        caller: PartyId,
        monthly_rent: u64,
    },
    CancelListing {
        property: String,
        caller: PartyId,
    },
    PayRent {
        property: String,
        tenant: PartyId,
        months: u64,
        /// Amount withdrawn from the tenant's wallet; defaults to the exact
        /// total due.
        #[serde(default)]
        tender: Option<u64>,
    },
    Handover {
        property: String,
    },
    SubmitInspection {
        inspection: String,
        property: String,
        caller: PartyId,
        damage_level: u8,
        #[serde(default)]
        description: String,
        #[serde(default)]
        photos: Vec<String>,
    },
    MintAdmin {
        caller: PartyId,
    },
    GrantAdmin {
        caller: PartyId,
        grantee: PartyId,
    },
    ReviewInspection {
        inspection: String,
        caller: PartyId,
        assessed: u8,
        /// Whose token to present; defaults to the caller's.
        #[serde(default)]
        token: Option<PartyId>,
        /// Present this property's lease instead of the one the inspection
        /// was filed against.
        #[serde(default)]
        property: Option<String>,
    },
    ReturnProperty {
        property: String,
        caller: PartyId,
    },
}

impl Action {
    /// The action tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PostListing { .. } => "post_listing",
            Self::RelistProperty { .. } => "relist_property",
            Self::CancelListing { .. } => "cancel_listing",
            Self::PayRent { .. } => "pay_rent",
            Self::Handover { .. } => "handover",
            Self::SubmitInspection { .. } => "submit_inspection",
            Self::MintAdmin { .. } => "mint_admin",
            Self::GrantAdmin { .. } => "grant_admin",
            Self::ReviewInspection { .. } => "review_inspection",
            Self::ReturnProperty { .. } => "return_property",
        }
    }
}

/// Result of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The engine committed the operation.
    Committed,
    /// The engine rejected the operation.
    Rejected,
}

/// Per-step entry of the report.
#[derive(Debug, Serialize)]
pub struct StepReport {
    /// Position in the scenario, starting at 0.
    pub index: usize,
    /// Action tag.
    pub action: &'static str,
    /// What the engine did.
    pub outcome: Outcome,
    /// Error code on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    /// Error message on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error code the scenario expected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<String>,
    /// Whether the outcome matched the expectation.
    pub matched: bool,
    /// Operation-specific output on commit.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub detail: Value,
}

/// Final state after a scenario.
#[derive(Debug, Serialize)]
pub struct Report {
    /// The platform the scenario ran against.
    pub platform_id: PlatformId,
    /// Its owner.
    pub owner: PartyId,
    /// Effective configuration.
    pub config: PlatformConfig,
    /// Per-step outcomes.
    pub steps: Vec<StepReport>,
    /// Value in the deposit pool.
    pub pool_value: u64,
    /// Sum of outstanding deposit entries.
    pub outstanding_deposits: u128,
    /// Whether the pool covers every outstanding entry.
    pub solvent: bool,
    /// Outstanding deposit per property label.
    pub deposits: BTreeMap<String, u64>,
    /// Closing wallet balances.
    pub wallets: BTreeMap<PartyId, u128>,
    /// The platform event log.
    pub events: Vec<PlatformEvent>,
}

impl Report {
    /// Whether every step matched its expectation.
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.matched)
    }
}

/// Execute `tenure run`.
pub fn run_scenario(args: &RunArgs, config_path: Option<&Path>) -> Result<u8> {
    let scenario = load_scenario(&args.scenario)?;
    let config = crate::resolve_config(scenario.config, config_path)?;
    let report = execute(scenario, config)?;

    let rendered = serde_json::to_string_pretty(&report).context("failed to render report")?;
    match &args.out {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write report {}", path.display()))?,
        None => println!("{rendered}"),
    }

    if report.passed() {
        Ok(0)
    } else {
        let failed = report.steps.iter().filter(|s| !s.matched).count();
        tracing::error!(failed, "scenario steps did not match their expectations");
        Ok(1)
    }
}

/// Parse a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse scenario {}", path.display()))
}

/// Run every step of `scenario` against a fresh platform.
///
/// # Errors
///
/// Fails on an invalid configuration or a malformed scenario; engine
/// rejections are recorded in the report instead.
pub fn execute(scenario: Scenario, config: PlatformConfig) -> Result<Report> {
    let platform = Platform::with_config(scenario.owner.clone(), config)
        .context("invalid platform configuration")?;
    let mut wallets = Wallets::new();
    for (party, amount) in &scenario.wallets {
        wallets.fund(party, *amount);
    }
    let mut runner = Runner {
        platform,
        wallets,
        properties: BTreeMap::new(),
        leases: BTreeMap::new(),
        inspections: BTreeMap::new(),
        tokens: BTreeMap::new(),
    };

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let action = step.action.name();
        let _span = tracing::info_span!("step", index, action).entered();
        let result = match runner.apply(&step.action) {
            Ok(detail) => Ok(detail),
            Err(StepFailure::Rejected(e)) => Err(e),
            Err(StepFailure::Aborted(e)) => {
                return Err(e.context(format!("step {index} ({action}) aborted")));
            }
        };
        steps.push(step_report(index, action, step.expect_error.clone(), result));
    }
    Ok(runner.into_report(steps))
}

fn step_report(
    index: usize,
    action: &'static str,
    expected_error: Option<String>,
    result: Result<Value, EscrowError>,
) -> StepReport {
    match result {
        Ok(detail) => StepReport {
            index,
            action,
            outcome: Outcome::Committed,
            error: None,
            message: None,
            matched: expected_error.is_none(),
            expected_error,
            detail,
        },
        Err(e) => {
            tracing::info!(code = e.code(), "step rejected: {e}");
            StepReport {
                index,
                action,
                outcome: Outcome::Rejected,
                error: Some(e.code()),
                message: Some(e.to_string()),
                matched: expected_error.as_deref() == Some(e.code()),
                expected_error,
                detail: Value::Null,
            }
        }
    }
}

/// Why a step did not commit.
enum StepFailure {
    /// The engine refused the operation.
    Rejected(EscrowError),
    /// The scenario cannot continue.
    Aborted(anyhow::Error),
}

impl From<EscrowError> for StepFailure {
    fn from(e: EscrowError) -> Self {
        Self::Rejected(e)
    }
}

impl From<anyhow::Error> for StepFailure {
    fn from(e: anyhow::Error) -> Self {
        Self::Aborted(e)
    }
}

/// An inspection together with the lease it was filed against.
struct Filed {
    lease: Lease,
    inspection: Inspection,
}

struct Runner {
    platform: Platform,
    wallets: Wallets,
    properties: BTreeMap<String, Property>,
    leases: BTreeMap<String, Lease>,
    inspections: BTreeMap<String, Filed>,
    tokens: BTreeMap<PartyId, AdminToken>,
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, kind: &str, label: &str) -> Result<&'a T> {
    map.get(label)
        .ok_or_else(|| anyhow!("unknown {kind} label \"{label}\""))
}

fn lookup_mut<'a, T>(map: &'a mut BTreeMap<String, T>, kind: &str, label: &str) -> Result<&'a mut T> {
    map.get_mut(label)
        .ok_or_else(|| anyhow!("unknown {kind} label \"{label}\""))
}

impl Runner {
    fn apply(&mut self, action: &Action) -> Result<Value, StepFailure> {
        match action {
            Action::PostListing {
                property,
                landlord,
                monthly_rent,
                area,
                description,
                photo,
            } => {
                if self.properties.contains_key(property) {
                    return Err(anyhow!("property label \"{property}\" already used").into());
                }
                let (listing, record) = self.platform.post_listing(
                    *monthly_rent,
                    *area,
                    description.as_str(),
                    photo.as_str(),
                    landlord,
                )?;
                self.properties.insert(property.clone(), record);
                Ok(json!({
                    "property_id": listing.property_id,
                    "deposit": listing.deposit,
                }))
            }

            Action::RelistProperty {
                property,
                caller,
                monthly_rent,
            } => {
                let record = lookup(&self.properties, "property", property)?;
                let listing = self
                    .platform
                    .relist_property(record, *monthly_rent, caller)?;
                Ok(json!({ "deposit": listing.deposit }))
            }

            Action::CancelListing { property, caller } => {
                let property_id = lookup(&self.properties, "property", property)?.id();
                let listing = self.platform.cancel_listing(&property_id, caller)?;
                Ok(json!({ "monthly_rent": listing.monthly_rent }))
            }

            Action::PayRent {
                property,
                tenant,
                months,
                tender,
            } => {
                let property_id = lookup(&self.properties, "property", property)?.id();
                let amount = tender.unwrap_or_else(|| {
                    self.platform
                        .listing(&property_id)
                        .map(|l| {
                            l.monthly_rent
                                .saturating_mul(*months)
                                .saturating_add(l.deposit)
                        })
                        .unwrap_or(0)
                });
                let mut payment = self
                    .wallets
                    .withdraw(tenant, amount)
                    .with_context(|| format!("{tenant} cannot tender {amount}"))?;
                match self.platform.pay_rent(
                    &property_id,
                    *months,
                    &mut payment,
                    tenant,
                    &mut self.wallets,
                ) {
                    Ok(lease) => {
                        let detail = json!({
                            "lease_id": lease.id(),
                            "rent_paid": lease.rent_paid(),
                            "deposit_paid": lease.deposit_paid(),
                        });
                        self.leases.insert(property.clone(), lease);
                        Ok(detail)
                    }
                    Err(e) => {
                        self.wallets.transfer(tenant, payment);
                        Err(e.into())
                    }
                }
            }

            Action::Handover { property } => {
                let lease = lookup(&self.leases, "lease", property)?;
                let record = lookup_mut(&mut self.properties, "property", property)?;
                self.platform.handover_property(lease, record)?;
                Ok(json!({ "custodian": record.custodian() }))
            }

            Action::SubmitInspection {
                inspection,
                property,
                caller,
                damage_level,
                description,
                photos,
            } => {
                if self.inspections.contains_key(inspection) {
                    return Err(anyhow!("inspection label \"{inspection}\" already used").into());
                }
                let lease = lookup(&self.leases, "lease", property)?;
                let filed = self.platform.submit_inspection(
                    lease,
                    *damage_level,
                    description.as_str(),
                    photos.clone(),
                    caller,
                )?;
                let detail = json!({
                    "inspection_id": filed.id(),
                    "evidence_digest": filed.evidence_digest().to_string(),
                });
                self.inspections.insert(
                    inspection.clone(),
                    Filed {
                        lease: lease.clone(),
                        inspection: filed,
                    },
                );
                Ok(detail)
            }

            Action::MintAdmin { caller } => {
                let token = self.platform.mint_admin(caller)?;
                Ok(self.keep_token(token))
            }

            Action::GrantAdmin { caller, grantee } => {
                let token = self.platform.grant_admin(caller, grantee.clone())?;
                Ok(self.keep_token(token))
            }

            Action::ReviewInspection {
                inspection,
                caller,
                assessed,
                token,
                property,
            } => {
                let holder = token.as_ref().unwrap_or(caller);
                let token = self
                    .tokens
                    .get(holder)
                    .ok_or_else(|| anyhow!("{holder} holds no admin token"))?;
                let filed = lookup_mut(&mut self.inspections, "inspection", inspection)?;
                let lease = match property {
                    Some(label) => lookup(&self.leases, "lease", label)?,
                    None => &filed.lease,
                };
                let deducted = self.platform.review_inspection(
                    lease,
                    &mut filed.inspection,
                    token,
                    *assessed,
                    caller,
                    &mut self.wallets,
                )?;
                Ok(json!({ "deducted": deducted }))
            }

            Action::ReturnProperty { property, caller } => {
                let lease = lookup(&self.leases, "lease", property)?;
                let record = lookup_mut(&mut self.properties, "property", property)?;
                let refunded =
                    self.platform
                        .return_property(lease, record, caller, &mut self.wallets)?;
                Ok(json!({ "refunded": refunded }))
            }
        }
    }

    fn keep_token(&mut self, token: AdminToken) -> Value {
        let detail = json!({ "token_id": token.id(), "holder": token.holder() });
        self.tokens.insert(token.holder().clone(), token);
        detail
    }

    fn into_report(self, steps: Vec<StepReport>) -> Report {
        let deposits = self
            .properties
            .iter()
            .filter_map(|(label, record)| {
                let amount = self.platform.deposit_recorded(&record.id());
                (amount > 0).then(|| (label.clone(), amount))
            })
            .collect();
        Report {
            platform_id: self.platform.id(),
            owner: self.platform.owner().clone(),
            config: *self.platform.config(),
            steps,
            pool_value: self.platform.pool_value(),
            outstanding_deposits: self.platform.outstanding_deposits(),
            solvent: self.platform.check_solvency().is_ok(),
            deposits,
            wallets: self.wallets.iter().map(|(p, b)| (p.clone(), b)).collect(),
            events: self.platform.events().to_vec(),
        }
    }
}
