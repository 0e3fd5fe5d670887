//! Scenario runner for batch schedules
//!
//! Runs whole loan books or rate sensitivities in parallel against one
//! engine configuration.

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loan::LoanTerms;
use crate::schedule::{AmortizationEngine, AmortizationSchedule, ScheduleConfig};

/// Batch runner sharing one engine configuration
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_env();
/// for schedule in runner.rate_sensitivity(&terms, &[10.0, 12.0, 14.0])? {
///     println!("{:.2}", schedule.installment);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    engine: AmortizationEngine,
}

impl ScenarioRunner {
    /// Create runner with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create runner with configuration taken from the environment
    pub fn from_env() -> Self {
        Self::with_config(ScheduleConfig::from_env())
    }

    pub fn with_config(config: ScheduleConfig) -> Self {
        Self {
            engine: AmortizationEngine::new(config),
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        self.engine.config()
    }

    /// Build a single schedule
    pub fn run(&self, terms: &LoanTerms) -> Result<AmortizationSchedule> {
        self.engine.build_schedule(terms)
    }

    /// Build schedules for many loans in parallel.
    /// Results keep the input order; one invalid loan does not stop the others.
    pub fn run_batch(&self, loans: &[LoanTerms]) -> Vec<Result<AmortizationSchedule>> {
        let results: Vec<_> = loans.par_iter().map(|terms| self.run(terms)).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!("{} of {} loans failed validation", failed, loans.len());
        }
        info!("built {} schedules", loans.len() - failed);

        results
    }

    /// Rebuild the same loan at each annual rate (percent)
    pub fn rate_sensitivity(
        &self,
        terms: &LoanTerms,
        rates_pct: &[f64],
    ) -> Result<Vec<AmortizationSchedule>> {
        rates_pct
            .par_iter()
            .map(|&rate| {
                let mut scenario = terms.clone();
                scenario.annual_rate_pct = rate;
                self.run(&scenario)
            })
            .collect()
    }
}

/// Cashflows of a set of schedules summed by installment index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    pub period: u32,
    pub loans_paying: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub insurance: f64,
    /// Outstanding balance across loans still in their term
    pub balance: f64,
}

/// Sum schedules by installment index.
///
/// Installments are matched by position, not calendar date, so mixing
/// frequencies aggregates unlike periods.
pub fn aggregate_by_period(schedules: &[AmortizationSchedule]) -> Vec<PortfolioRow> {
    let longest = schedules.iter().map(|s| s.records.len()).max().unwrap_or(0);

    let mut rows: Vec<PortfolioRow> = (1..=longest as u32)
        .map(|period| PortfolioRow { period, ..Default::default() })
        .collect();

    for schedule in schedules {
        for record in &schedule.records {
            let row = &mut rows[(record.period - 1) as usize];
            row.loans_paying += 1;
            row.payment += record.payment;
            row.interest += record.interest;
            row.principal += record.principal;
            row.insurance += record.insurance;
            row.balance += record.balance;
        }
    }

    rows
}
