//! Which installments carry an insurance charge

use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, Result};

/// Eligibility window for insurance charges, in 1-based period indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsuranceWindow {
    /// Every installment
    #[default]
    AllPeriods,
    /// Only the installments of the first loan year
    FirstYear,
    /// Every installment except those of the final loan year
    ExcludeFinalYear,
    /// Every installment after the first `periods`
    SkipFirst { periods: u32 },
    /// Installments `first..=last`
    Range { first: u32, last: u32 },
}

impl InsuranceWindow {
    pub fn validate(&self) -> Result<()> {
        if let InsuranceWindow::Range { first, last } = *self {
            if first == 0 || first > last {
                return Err(AmortizationError::invalid(
                    "insurance.window",
                    format!("range {}..={} must be 1-based and non-empty", first, last),
                ));
            }
        }
        Ok(())
    }

    /// Whether `period` is charged on a schedule of `payment_count` installments
    pub fn contains(&self, period: u32, periods_per_year: u32, payment_count: u32) -> bool {
        if period == 0 || period > payment_count {
            return false;
        }
        match *self {
            InsuranceWindow::AllPeriods => true,
            InsuranceWindow::FirstYear => period <= periods_per_year,
            InsuranceWindow::ExcludeFinalYear => {
                period <= payment_count.saturating_sub(periods_per_year)
            }
            InsuranceWindow::SkipFirst { periods } => period > periods,
            InsuranceWindow::Range { first, last } => period >= first && period <= last,
        }
    }

    /// Number of charged installments within the given 1-based loan year
    pub fn charged_in_year(&self, year: u32, periods_per_year: u32, payment_count: u32) -> u32 {
        let first = (year.saturating_sub(1)) * periods_per_year + 1;
        let last = (year * periods_per_year).min(payment_count);
        (first..=last)
            .filter(|&p| self.contains(p, periods_per_year, payment_count))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_final_year() {
        let window = InsuranceWindow::ExcludeFinalYear;
        // 36 monthly payments: charged 1..=24
        assert!(window.contains(1, 12, 36));
        assert!(window.contains(24, 12, 36));
        assert!(!window.contains(25, 12, 36));
        // A one-year loan has no charged installments at all
        assert!(!window.contains(1, 12, 12));
    }

    #[test]
    fn test_first_year_and_skip() {
        assert!(InsuranceWindow::FirstYear.contains(4, 4, 12));
        assert!(!InsuranceWindow::FirstYear.contains(5, 4, 12));

        let skip = InsuranceWindow::SkipFirst { periods: 3 };
        assert!(!skip.contains(3, 12, 24));
        assert!(skip.contains(4, 12, 24));
        assert!(!skip.contains(25, 12, 24));
    }

    #[test]
    fn test_range_and_counts() {
        let range = InsuranceWindow::Range { first: 10, last: 15 };
        assert!(range.validate().is_ok());
        assert_eq!(range.charged_in_year(1, 12, 24), 3);
        assert_eq!(range.charged_in_year(2, 12, 24), 3);
        assert_eq!(InsuranceWindow::AllPeriods.charged_in_year(2, 12, 18), 6);

        assert!(InsuranceWindow::Range { first: 0, last: 3 }.validate().is_err());
        assert!(InsuranceWindow::Range { first: 5, last: 4 }.validate().is_err());
    }
}
