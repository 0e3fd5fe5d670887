//! Credit insurance add-ons: premium basis, eligibility window and loadings
//!
//! Loan calculators disagree on when insurance is charged, so both the
//! premium size and the set of charged installments are policy parameters.

mod basis;
mod window;

pub use basis::{InsuranceCharger, PremiumBasis};
pub use window::InsuranceWindow;

use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, Result};

/// Insurance terms attached to a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceTerms {
    pub basis: PremiumBasis,

    #[serde(default)]
    pub window: InsuranceWindow,

    /// Fixed yearly charge, spread evenly over the installments of a year
    #[serde(default)]
    pub fixed_annual_charge: f64,

    /// Tax on the premium, as a percentage
    #[serde(default)]
    pub tax_rate_pct: f64,

    /// Surcharge on the premium, as a percentage
    #[serde(default)]
    pub surcharge_rate_pct: f64,
}

impl InsuranceTerms {
    pub fn new(basis: PremiumBasis) -> Self {
        Self {
            basis,
            window: InsuranceWindow::AllPeriods,
            fixed_annual_charge: 0.0,
            tax_rate_pct: 0.0,
            surcharge_rate_pct: 0.0,
        }
    }

    /// Classic calculator rule: per-thousand premium on the balance left after
    /// the first year, charged on every installment except the final year's
    pub fn per_thousand(monthly_rate_per_thousand: f64) -> Self {
        Self::new(PremiumBasis::ReferenceBalance { monthly_rate_per_thousand })
            .with_window(InsuranceWindow::ExcludeFinalYear)
    }

    pub fn with_window(mut self, window: InsuranceWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_fixed_annual_charge(mut self, charge: f64) -> Self {
        self.fixed_annual_charge = charge;
        self
    }

    pub fn with_tax_rate_pct(mut self, pct: f64) -> Self {
        self.tax_rate_pct = pct;
        self
    }

    pub fn with_surcharge_rate_pct(mut self, pct: f64) -> Self {
        self.surcharge_rate_pct = pct;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.basis.validate()?;
        self.window.validate()?;

        for (field, value) in [
            ("insurance.fixed_annual_charge", self.fixed_annual_charge),
            ("insurance.tax_rate_pct", self.tax_rate_pct),
            ("insurance.surcharge_rate_pct", self.surcharge_rate_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AmortizationError::invalid(
                    field,
                    format!("must be zero or positive, got {}", value),
                ));
            }
        }
        Ok(())
    }

    /// Multiplier applied to premium plus charges for tax and surcharge
    pub fn loading_factor(&self) -> f64 {
        1.0 + (self.tax_rate_pct + self.surcharge_rate_pct) / 100.0
    }
}
