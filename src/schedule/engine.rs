//! Core amortization engine: turns loan terms into an installment schedule

use std::env;

use log::{debug, warn};

use super::irr::effective_annual_rate;
use super::records::{AmortizationSchedule, PaymentRecord};
use super::state::ScheduleState;
use crate::error::Result;
use crate::insurance::InsuranceCharger;
use crate::loan::{AmortizationMethod, LoanTerms};

/// Configuration for schedule generation
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Balances below this amount are treated as fully repaid
    pub balance_tolerance: f64,

    /// Whether to solve for the effective annual cost of each schedule
    pub effective_rate: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: 1e-6,
            effective_rate: true,
        }
    }
}

impl ScheduleConfig {
    /// Defaults overridden by `AMORTIZATION_BALANCE_TOLERANCE` and
    /// `AMORTIZATION_EFFECTIVE_RATE` (0/1/true/false) when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparseable or out-of-range values keep the default
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let balance_tolerance = lookup("AMORTIZATION_BALANCE_TOLERANCE")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(defaults.balance_tolerance);

        let effective_rate = lookup("AMORTIZATION_EFFECTIVE_RATE")
            .and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                _ => None,
            })
            .unwrap_or(defaults.effective_rate);

        Self {
            balance_tolerance,
            effective_rate,
        }
    }
}

/// Level installment that retires `principal` over `n` periods at rate `r`.
/// Degenerates to straight division when the rate is zero or too small to
/// register in `(1 + r)^n`.
pub fn level_payment(principal: f64, rate: f64, n: u32) -> f64 {
    if n == 0 {
        return principal;
    }
    let straight = principal / n as f64;
    if rate <= 0.0 {
        return straight;
    }
    // (1 + r)^n - 1 without cancellation for tiny r
    let accrued = (n as f64 * rate.ln_1p()).exp_m1();
    if !(accrued > 0.0) || !accrued.is_finite() {
        return straight;
    }
    principal * rate * (1.0 + accrued) / accrued
}

/// Main amortization engine
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    config: ScheduleConfig,
}

impl AmortizationEngine {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Build the full schedule for a loan, rejecting invalid terms up front
    pub fn build_schedule(&self, terms: &LoanTerms) -> Result<AmortizationSchedule> {
        terms.validate()?;

        let mut schedule = match terms.periods_per_year() {
            Some(ppy) => self.amortize(terms, ppy)?,
            None => self.bullet(terms)?,
        };

        if self.config.effective_rate {
            schedule.effective_annual_rate =
                effective_annual_rate(&schedule, terms.annualization_factor());
        }

        debug!(
            "loan {}: {} {} installments at {:.6} per period, installment {:.2}",
            terms.loan_id,
            schedule.payment_count,
            terms.frequency,
            schedule.periodic_rate,
            schedule.installment,
        );

        Ok(schedule)
    }

    /// Single payment of principal plus simple interest at the end of the term
    fn bullet(&self, terms: &LoanTerms) -> Result<AmortizationSchedule> {
        if terms.insurance.is_some() {
            warn!(
                "loan {}: insurance is not charged on an at-maturity loan",
                terms.loan_id
            );
        }

        let mut schedule = AmortizationSchedule::new(
            terms.loan_id,
            terms.frequency,
            terms.method,
            terms.principal,
        );
        schedule.payment_count = 1;
        schedule.periodic_rate = terms.periodic_rate();

        let interest = terms.principal * schedule.periodic_rate;

        let mut record = PaymentRecord::new(1);
        record.due_date = terms.due_date(1)?;
        record.opening_balance = terms.principal;
        record.interest = interest;
        record.principal = terms.principal;
        record.payment = interest + terms.principal;
        record.balance = 0.0;

        schedule.installment = record.payment;
        schedule.add_record(record);
        Ok(schedule)
    }

    /// Period-by-period amortization for periodic frequencies
    fn amortize(&self, terms: &LoanTerms, periods_per_year: u32) -> Result<AmortizationSchedule> {
        let n = terms.payment_count();
        let rate = terms.periodic_rate();

        let installment = match terms.method {
            AmortizationMethod::LevelPayment => level_payment(terms.principal, rate, n),
            AmortizationMethod::DecliningBalance => terms.principal / n as f64,
        };

        let mut schedule = AmortizationSchedule::new(
            terms.loan_id,
            terms.frequency,
            terms.method,
            terms.principal,
        );
        schedule.payment_count = n;
        schedule.periodic_rate = rate;
        schedule.installment = installment;
        schedule.records.reserve(n as usize);

        let mut charger = terms.insurance.as_ref().map(|insurance| {
            let reference = scheduled_balance_after(
                terms.method,
                terms.principal,
                rate,
                installment,
                periods_per_year.min(n),
            );
            InsuranceCharger::new(insurance, periods_per_year, n, terms.principal, reference)
        });

        let mut state = ScheduleState::at_disbursement(terms.principal);

        for _ in 1..=n {
            state.advance_period();

            let mut record = self.calculate_period(terms.method, rate, installment, n, &mut state);
            record.due_date = terms.due_date(state.period)?;

            if let Some(charger) = charger.as_mut() {
                record.insurance = charger.charge(state.period, record.opening_balance);
                record.payment += record.insurance;
            }

            schedule.add_record(record);
        }

        Ok(schedule)
    }

    /// Interest and principal for the current installment
    fn calculate_period(
        &self,
        method: AmortizationMethod,
        rate: f64,
        installment: f64,
        payment_count: u32,
        state: &mut ScheduleState,
    ) -> PaymentRecord {
        let mut record = PaymentRecord::new(state.period);
        record.opening_balance = state.opening_balance;
        record.interest = state.opening_balance * rate;

        let scheduled_principal = match method {
            AmortizationMethod::LevelPayment => installment - record.interest,
            AmortizationMethod::DecliningBalance => installment,
        };

        // The last installment retires whatever rounding has left behind
        let principal = if state.period == payment_count {
            state.opening_balance
        } else {
            scheduled_principal
        };

        record.principal = state.repay(principal, self.config.balance_tolerance);
        record.balance = state.closing_balance;
        record.payment = record.interest + record.principal;
        record
    }
}

/// Scheduled balance after the first `periods` installments, before insurance
fn scheduled_balance_after(
    method: AmortizationMethod,
    principal: f64,
    rate: f64,
    installment: f64,
    periods: u32,
) -> f64 {
    let mut balance = principal;
    for _ in 0..periods {
        let repaid = match method {
            AmortizationMethod::LevelPayment => installment - balance * rate,
            AmortizationMethod::DecliningBalance => installment,
        };
        balance = (balance - repaid).max(0.0);
    }
    balance
}

/// Build a schedule with the default configuration
pub fn build_schedule(terms: &LoanTerms) -> Result<AmortizationSchedule> {
    AmortizationEngine::default().build_schedule(terms)
}
