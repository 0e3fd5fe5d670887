//! Premium bases and the per-schedule premium charger

use serde::{Deserialize, Serialize};

use super::{InsuranceTerms, InsuranceWindow};
use crate::error::{AmortizationError, Result};

/// How the premium for a charged installment is sized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PremiumBasis {
    /// Same amount on every charged installment
    FlatCharge { amount: f64 },

    /// Annual percentage of the amount originally borrowed
    OriginalBalance { annual_rate_pct: f64 },

    /// Annual percentage of the outstanding balance, re-read every
    /// `recompute_every` installments
    DecliningBalance { annual_rate_pct: f64, recompute_every: u32 },

    /// Each loan year's premium is sized on the balance at the start of that
    /// year and spread evenly over the year's charged installments
    AnnualLumpSum { annual_rate_pct: f64 },

    /// Level premium per thousand of the balance left after the first year
    /// of scheduled payments, quoted as a monthly rate
    ReferenceBalance { monthly_rate_per_thousand: f64 },
}

impl PremiumBasis {
    pub fn validate(&self) -> Result<()> {
        let (field, value) = match *self {
            PremiumBasis::FlatCharge { amount } => ("insurance.amount", amount),
            PremiumBasis::OriginalBalance { annual_rate_pct }
            | PremiumBasis::AnnualLumpSum { annual_rate_pct } => {
                ("insurance.annual_rate_pct", annual_rate_pct)
            }
            PremiumBasis::DecliningBalance { annual_rate_pct, recompute_every } => {
                if recompute_every == 0 {
                    return Err(AmortizationError::invalid(
                        "insurance.recompute_every",
                        "must be at least one installment",
                    ));
                }
                ("insurance.annual_rate_pct", annual_rate_pct)
            }
            PremiumBasis::ReferenceBalance { monthly_rate_per_thousand } => {
                ("insurance.monthly_rate_per_thousand", monthly_rate_per_thousand)
            }
        };

        if !value.is_finite() || value < 0.0 {
            return Err(AmortizationError::invalid(
                field,
                format!("must be zero or positive, got {}", value),
            ));
        }
        Ok(())
    }
}

/// Stateful premium calculator for a single schedule.
///
/// Must be called once per installment, in period order, so balance-based
/// bases can refresh their base balance at the right installments.
#[derive(Debug, Clone)]
pub struct InsuranceCharger {
    basis: PremiumBasis,
    window: InsuranceWindow,
    periods_per_year: u32,
    payment_count: u32,
    principal: f64,
    reference_balance: f64,
    per_period_charge: f64,
    loading: f64,

    // Balance the current premium is sized on
    base_balance: f64,
    // AnnualLumpSum: premium per charged installment for the current year
    year_installment: f64,
}

impl InsuranceCharger {
    pub fn new(
        terms: &InsuranceTerms,
        periods_per_year: u32,
        payment_count: u32,
        principal: f64,
        reference_balance: f64,
    ) -> Self {
        Self {
            basis: terms.basis,
            window: terms.window,
            periods_per_year,
            payment_count,
            principal,
            reference_balance,
            per_period_charge: terms.fixed_annual_charge / periods_per_year as f64,
            loading: terms.loading_factor(),
            base_balance: principal,
            year_installment: 0.0,
        }
    }

    /// Insurance amount for `period`, given the balance outstanding at its start
    pub fn charge(&mut self, period: u32, opening_balance: f64) -> f64 {
        let ppy = self.periods_per_year as f64;
        let starts_year = (period - 1) % self.periods_per_year == 0;

        let premium = match self.basis {
            PremiumBasis::FlatCharge { amount } => amount,
            PremiumBasis::OriginalBalance { annual_rate_pct } => {
                self.principal * annual_rate_pct / 100.0 / ppy
            }
            PremiumBasis::DecliningBalance { annual_rate_pct, recompute_every } => {
                if (period - 1) % recompute_every == 0 {
                    self.base_balance = opening_balance;
                }
                self.base_balance * annual_rate_pct / 100.0 / ppy
            }
            PremiumBasis::AnnualLumpSum { annual_rate_pct } => {
                if starts_year {
                    self.start_lump_sum_year(period, opening_balance, annual_rate_pct);
                }
                self.year_installment
            }
            PremiumBasis::ReferenceBalance { monthly_rate_per_thousand } => {
                (self.reference_balance / 1000.0) * monthly_rate_per_thousand * 12.0 / ppy
            }
        };

        if !self.window.contains(period, self.periods_per_year, self.payment_count) {
            return 0.0;
        }

        ((premium + self.per_period_charge) * self.loading).max(0.0)
    }

    fn start_lump_sum_year(&mut self, period: u32, opening_balance: f64, annual_rate_pct: f64) {
        let year = (period - 1) / self.periods_per_year + 1;
        let remaining = self.payment_count - (period - 1);
        // A short final year pays a pro-rated premium
        let year_fraction = remaining.min(self.periods_per_year) as f64 / self.periods_per_year as f64;
        let lump_sum = opening_balance * annual_rate_pct / 100.0 * year_fraction;

        let charged = self.window.charged_in_year(year, self.periods_per_year, self.payment_count);
        self.base_balance = opening_balance;
        self.year_installment = if charged > 0 {
            lump_sum / charged as f64
        } else {
            0.0
        };
    }
}
