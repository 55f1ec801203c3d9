//! # Schedule Subcommand
//!
//! Prints what each damage level would deduct from a given deposit.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use tenure_escrow::DamageLevel;

/// Arguments for `tenure schedule`.
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Deposit amount to apply the schedule to.
    #[arg(long)]
    pub deposit: u64,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// One line of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    /// Numeric level.
    pub level: u8,
    /// Level name.
    pub name: &'static str,
    /// Amount redirected to the landlord.
    pub deduction: u64,
    /// Amount refunded to the tenant.
    pub refund: u64,
}

/// The schedule applied to `deposit`, one row per level.
pub fn schedule_rows(deposit: u64) -> Vec<ScheduleRow> {
    DamageLevel::ALL
        .iter()
        .map(|level| {
            let deduction = level.deduction(deposit);
            ScheduleRow {
                level: level.as_u8(),
                name: level.as_str(),
                deduction,
                refund: deposit - deduction,
            }
        })
        .collect()
}

/// Execute `tenure schedule`.
pub fn run_schedule(args: &ScheduleArgs) -> Result<u8> {
    let rows = schedule_rows(args.deposit);
    if args.json {
        let rendered = serde_json::to_string_pretty(&rows).context("failed to render schedule")?;
        println!("{rendered}");
        return Ok(0);
    }
    println!("Deposit: {}", args.deposit);
    println!("  {:<5} {:<9} {:>20} {:>20}", "LEVEL", "NAME", "DEDUCTION", "REFUND");
    for row in &rows {
        println!(
            "  {:<5} {:<9} {:>20} {:>20}",
            row.level, row.name, row.deduction, row.refund
        );
    }
    Ok(0)
}
