//! Run schedules for an entire loan book
//!
//! Outputs per-period portfolio cashflows aggregated across all loans.
//! Config via environment variables:
//!   LOANS_CSV    (default data/sample_loans.csv)
//!   OUTPUT_PATH  (default portfolio_schedule.csv)
//! plus the AMORTIZATION_* engine settings.

use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use log::warn;

use loan_amortization::loan::{load_loans, loader::DEFAULT_LOANS_PATH};
use loan_amortization::report::format_amount;
use loan_amortization::scenario::{aggregate_by_period, ScenarioRunner};

fn main() -> Result<()> {
    env_logger::init();

    let loans_path = env::var("LOANS_CSV").unwrap_or_else(|_| DEFAULT_LOANS_PATH.to_string());
    let output_path = env::var("OUTPUT_PATH").unwrap_or_else(|_| "portfolio_schedule.csv".to_string());

    let start = Instant::now();
    println!("Loading loans from {}...", loans_path);

    let loans = load_loans(&loans_path).with_context(|| format!("Failed to load {}", loans_path))?;
    println!("Loaded {} loans in {:?}", loans.len(), start.elapsed());

    let runner = ScenarioRunner::from_env();

    println!("Building schedules...");
    let build_start = Instant::now();

    let mut schedules = Vec::with_capacity(loans.len());
    for (terms, result) in loans.iter().zip(runner.run_batch(&loans)) {
        match result {
            Ok(schedule) => schedules.push(schedule),
            Err(e) => warn!("Skipping loan {}: {}", terms.loan_id, e),
        }
    }

    println!("Schedules complete in {:?}", build_start.elapsed());

    let rows = aggregate_by_period(&schedules);

    let mut wtr = csv::Writer::from_path(&output_path)
        .with_context(|| format!("Failed to create {}", output_path))?;
    wtr.write_record(["Period", "LoansPaying", "Payment", "Interest", "Principal", "Insurance", "Balance"])?;
    for row in &rows {
        wtr.write_record([
            row.period.to_string(),
            row.loans_paying.to_string(),
            format!("{:.2}", row.payment),
            format!("{:.2}", row.interest),
            format!("{:.2}", row.principal),
            format!("{:.2}", row.insurance),
            format!("{:.2}", row.balance),
        ])?;
    }
    wtr.flush()?;

    println!("Output written to {}", output_path);

    let total_principal: f64 = schedules.iter().map(|s| s.principal).sum();
    let total_interest: f64 = schedules.iter().map(|s| s.summary().total_interest).sum();
    let total_insurance: f64 = schedules.iter().map(|s| s.summary().total_insurance).sum();

    println!("\nPortfolio Summary:");
    println!("  Loans scheduled: {} of {}", schedules.len(), loans.len());
    println!("  Principal:       {}", format_amount(total_principal));
    println!("  Interest:        {}", format_amount(total_interest));
    println!("  Insurance:       {}", format_amount(total_insurance));
    if let Some(first) = rows.first() {
        println!("  Period 1 collections: {}", format_amount(first.payment));
    }
    println!("  Longest schedule: {} periods", rows.len());

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
