//! Loan amortization CLI
//!
//! Builds installment schedules from command-line flags or a JSON terms file

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use loan_amortization::report::{format_amount, render_summary, render_table, write_csv};
use loan_amortization::{
    AmortizationMethod, InsuranceTerms, InsuranceWindow, LoanTerms, PaymentFrequency,
    ScenarioRunner, ScheduleSummary,
};

#[derive(Parser)]
#[command(name = "amortize", version, about = "Loan amortization schedules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the installment schedule for one loan
    Schedule(ScheduleArgs),
    /// Compare one loan across several annual rates
    Sensitivity(SensitivityArgs),
}

#[derive(Args)]
struct LoanArgs {
    /// Read loan terms from a JSON file; the loan flags below are ignored
    #[arg(long)]
    terms: Option<PathBuf>,

    /// Amount borrowed
    #[arg(long, default_value_t = 10_000.0)]
    principal: f64,

    /// Nominal annual rate in percent
    #[arg(long = "rate", default_value_t = 12.0)]
    rate_pct: f64,

    /// Term in months
    #[arg(long = "term", default_value_t = 36)]
    term_months: u32,

    /// daily, weekly, biweekly, monthly, bimonthly, quarterly, four_monthly,
    /// semiannual, annual or at_maturity
    #[arg(long, default_value = "monthly")]
    frequency: PaymentFrequency,

    /// level_payment or declining_balance
    #[arg(long, default_value = "level_payment")]
    method: AmortizationMethod,

    /// Monthly insurance premium per thousand of the balance after year one
    #[arg(long)]
    insurance_per_thousand: Option<f64>,

    /// Installments that carry the insurance premium
    #[arg(long, value_enum, default_value_t = WindowArg::ExcludeFinalYear)]
    insurance_window: WindowArg,

    /// Due date of the first installment (YYYY-MM-DD)
    #[arg(long)]
    first_payment: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WindowArg {
    All,
    FirstYear,
    ExcludeFinalYear,
}

impl From<WindowArg> for InsuranceWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::All => InsuranceWindow::AllPeriods,
            WindowArg::FirstYear => InsuranceWindow::FirstYear,
            WindowArg::ExcludeFinalYear => InsuranceWindow::ExcludeFinalYear,
        }
    }
}

impl LoanArgs {
    fn to_terms(&self) -> Result<LoanTerms> {
        if let Some(path) = &self.terms {
            let file = File::open(path)
                .with_context(|| format!("Unable to open terms file {}", path.display()))?;
            let terms = serde_json::from_reader(file)
                .with_context(|| format!("Invalid loan terms in {}", path.display()))?;
            return Ok(terms);
        }

        let mut terms = LoanTerms::new(
            self.principal,
            self.rate_pct,
            self.term_months,
            self.frequency,
            self.method,
        );
        if let Some(rate) = self.insurance_per_thousand {
            terms = terms.with_insurance(
                InsuranceTerms::per_thousand(rate).with_window(self.insurance_window.into()),
            );
        }
        if let Some(date) = self.first_payment {
            terms = terms.with_first_payment_date(date);
        }
        Ok(terms)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Args)]
struct ScheduleArgs {
    #[command(flatten)]
    loan: LoanArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SensitivityArgs {
    #[command(flatten)]
    loan: LoanArgs,

    /// Annual rates in percent, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    rates: Vec<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct SensitivityRow {
    rate_pct: f64,
    installment: f64,
    #[serde(flatten)]
    summary: ScheduleSummary,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let runner = ScenarioRunner::from_env();

    match cli.command {
        Commands::Schedule(args) => run_schedule(&runner, args),
        Commands::Sensitivity(args) => run_sensitivity(&runner, args),
    }
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Unable to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn run_schedule(runner: &ScenarioRunner, args: ScheduleArgs) -> Result<()> {
    let terms = args.loan.to_terms()?;
    let schedule = runner.run(&terms).context("Unable to build schedule")?;
    let mut out = open_output(args.output.as_ref())?;

    match args.format {
        OutputFormat::Table => {
            write!(out, "{}", render_table(&schedule))?;
            writeln!(out)?;
            write!(out, "{}", render_summary(&schedule.summary()))?;
        }
        OutputFormat::Csv => write_csv(&schedule, &mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &schedule)?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn run_sensitivity(runner: &ScenarioRunner, args: SensitivityArgs) -> Result<()> {
    let terms = args.loan.to_terms()?;
    let schedules = runner
        .rate_sensitivity(&terms, &args.rates)
        .context("Unable to build sensitivity schedules")?;

    let rows: Vec<SensitivityRow> = args
        .rates
        .iter()
        .zip(&schedules)
        .map(|(&rate_pct, schedule)| SensitivityRow {
            rate_pct,
            installment: schedule.installment,
            summary: schedule.summary(),
        })
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.format {
        OutputFormat::Table => {
            writeln!(
                out,
                "{:>8} {:>15} {:>15} {:>15} {:>15} {:>10}",
                "Rate%", "Installment", "First payment", "Interest", "Insurance", "EAR%"
            )?;
            for row in &rows {
                let ear = row
                    .summary
                    .effective_annual_rate
                    .map(|r| format!("{:.4}", r * 100.0))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    out,
                    "{:>8.3} {:>15} {:>15} {:>15} {:>15} {:>10}",
                    row.rate_pct,
                    format_amount(row.installment),
                    format_amount(row.summary.initial_payment),
                    format_amount(row.summary.total_interest),
                    format_amount(row.summary.total_insurance),
                    ear,
                )?;
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record([
                "RatePct", "Installment", "Payments", "FirstPayment", "TotalInterest",
                "TotalInsurance", "TotalPaid", "EffectiveAnnualRate",
            ])?;
            for row in &rows {
                wtr.write_record([
                    format!("{}", row.rate_pct),
                    format!("{:.2}", row.installment),
                    row.summary.payment_count.to_string(),
                    format!("{:.2}", row.summary.initial_payment),
                    format!("{:.2}", row.summary.total_interest),
                    format!("{:.2}", row.summary.total_insurance),
                    format!("{:.2}", row.summary.total_paid),
                    row.summary
                        .effective_annual_rate
                        .map(|r| format!("{:.8}", r))
                        .unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
