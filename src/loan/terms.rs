//! Loan term structures as entered on the calculator form

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, Result};
use crate::insurance::InsuranceTerms;

/// How often installments fall due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    /// Every two months
    Bimonthly,
    Quarterly,
    FourMonthly,
    Semiannual,
    Annual,
    /// Single bullet payment at the end of the term
    AtMaturity,
}

/// Spacing between consecutive due dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStep {
    Days(u64),
    Months(u32),
}

impl PaymentFrequency {
    pub const ALL: [PaymentFrequency; 10] = [
        PaymentFrequency::Daily,
        PaymentFrequency::Weekly,
        PaymentFrequency::Biweekly,
        PaymentFrequency::Monthly,
        PaymentFrequency::Bimonthly,
        PaymentFrequency::Quarterly,
        PaymentFrequency::FourMonthly,
        PaymentFrequency::Semiannual,
        PaymentFrequency::Annual,
        PaymentFrequency::AtMaturity,
    ];

    /// Periods per year on a 30/360 basis (None for a bullet payment)
    pub fn periods_per_year(&self) -> Option<u32> {
        match self {
            PaymentFrequency::Daily => Some(360),
            PaymentFrequency::Weekly => Some(52),
            PaymentFrequency::Biweekly => Some(26),
            PaymentFrequency::Monthly => Some(12),
            PaymentFrequency::Bimonthly => Some(6),
            PaymentFrequency::Quarterly => Some(4),
            PaymentFrequency::FourMonthly => Some(3),
            PaymentFrequency::Semiannual => Some(2),
            PaymentFrequency::Annual => Some(1),
            PaymentFrequency::AtMaturity => None,
        }
    }

    /// Distance between due dates. For a bullet payment the step is the whole term.
    pub fn due_step(&self, term_months: u32) -> DueStep {
        match self {
            PaymentFrequency::Daily => DueStep::Days(1),
            PaymentFrequency::Weekly => DueStep::Days(7),
            PaymentFrequency::Biweekly => DueStep::Days(14),
            PaymentFrequency::Monthly => DueStep::Months(1),
            PaymentFrequency::Bimonthly => DueStep::Months(2),
            PaymentFrequency::Quarterly => DueStep::Months(3),
            PaymentFrequency::FourMonthly => DueStep::Months(4),
            PaymentFrequency::Semiannual => DueStep::Months(6),
            PaymentFrequency::Annual => DueStep::Months(12),
            PaymentFrequency::AtMaturity => DueStep::Months(term_months),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Daily => "daily",
            PaymentFrequency::Weekly => "weekly",
            PaymentFrequency::Biweekly => "biweekly",
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Bimonthly => "bimonthly",
            PaymentFrequency::Quarterly => "quarterly",
            PaymentFrequency::FourMonthly => "four_monthly",
            PaymentFrequency::Semiannual => "semiannual",
            PaymentFrequency::Annual => "annual",
            PaymentFrequency::AtMaturity => "at_maturity",
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentFrequency {
    type Err = AmortizationError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "daily" => Ok(PaymentFrequency::Daily),
            "weekly" => Ok(PaymentFrequency::Weekly),
            "biweekly" => Ok(PaymentFrequency::Biweekly),
            "monthly" => Ok(PaymentFrequency::Monthly),
            "bimonthly" => Ok(PaymentFrequency::Bimonthly),
            "quarterly" => Ok(PaymentFrequency::Quarterly),
            "four_monthly" | "four_month" => Ok(PaymentFrequency::FourMonthly),
            "semiannual" | "semi_annual" => Ok(PaymentFrequency::Semiannual),
            "annual" | "yearly" => Ok(PaymentFrequency::Annual),
            "at_maturity" | "maturity" | "bullet" => Ok(PaymentFrequency::AtMaturity),
            _ => Err(AmortizationError::UnknownLabel {
                kind: "payment frequency",
                value: s.to_string(),
            }),
        }
    }
}

/// How principal is repaid across the installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmortizationMethod {
    /// Constant installment (annuity); principal share grows over time
    LevelPayment,
    /// Constant principal share; installment shrinks with the balance
    DecliningBalance,
}

impl AmortizationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmortizationMethod::LevelPayment => "level_payment",
            AmortizationMethod::DecliningBalance => "declining_balance",
        }
    }
}

impl fmt::Display for AmortizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AmortizationMethod {
    type Err = AmortizationError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "level" | "level_payment" | "annuity" => Ok(AmortizationMethod::LevelPayment),
            "declining" | "declining_balance" | "constant_principal" => {
                Ok(AmortizationMethod::DecliningBalance)
            }
            _ => Err(AmortizationError::UnknownLabel {
                kind: "amortization method",
                value: s.to_string(),
            }),
        }
    }
}

fn normalize_label(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// Immutable description of a loan to amortize
/// Longest accepted term (100 years)
pub const MAX_TERM_MONTHS: u32 = 1_200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Caller-assigned identifier (0 when the loan stands alone)
    #[serde(default)]
    pub loan_id: u32,

    /// Amount borrowed
    pub principal: f64,

    /// Nominal annual rate as a percentage (12.0 = 12%)
    pub annual_rate_pct: f64,

    /// Term length in months
    pub term_months: u32,

    pub frequency: PaymentFrequency,

    pub method: AmortizationMethod,

    /// Optional credit insurance add-on
    #[serde(default)]
    pub insurance: Option<InsuranceTerms>,

    /// Due date of the first installment, when due dates are wanted
    #[serde(default)]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanTerms {
    pub fn new(
        principal: f64,
        annual_rate_pct: f64,
        term_months: u32,
        frequency: PaymentFrequency,
        method: AmortizationMethod,
    ) -> Self {
        Self {
            loan_id: 0,
            principal,
            annual_rate_pct,
            term_months,
            frequency,
            method,
            insurance: None,
            first_payment_date: None,
        }
    }

    pub fn with_loan_id(mut self, loan_id: u32) -> Self {
        self.loan_id = loan_id;
        self
    }

    pub fn with_insurance(mut self, insurance: InsuranceTerms) -> Self {
        self.insurance = Some(insurance);
        self
    }

    pub fn with_first_payment_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_date = Some(date);
        self
    }

    /// Reject inputs the engine cannot amortize
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(AmortizationError::invalid(
                "principal",
                format!("must be a positive amount, got {}", self.principal),
            ));
        }
        if !self.annual_rate_pct.is_finite() || self.annual_rate_pct < 0.0 {
            return Err(AmortizationError::invalid(
                "annual_rate_pct",
                format!("must be zero or positive, got {}", self.annual_rate_pct),
            ));
        }
        if self.term_months == 0 {
            return Err(AmortizationError::invalid(
                "term_months",
                "term must be at least one month",
            ));
        }
        if self.term_months > MAX_TERM_MONTHS {
            return Err(AmortizationError::invalid(
                "term_months",
                format!(
                    "term of {} months exceeds the {} month maximum",
                    self.term_months, MAX_TERM_MONTHS
                ),
            ));
        }
        if self.payment_count() == 0 {
            return Err(AmortizationError::NoPaymentPeriods {
                term_months: self.term_months,
                frequency: self.frequency.as_str(),
            });
        }
        if let Some(insurance) = &self.insurance {
            insurance.validate()?;
        }
        Ok(())
    }

    /// Nominal annual rate as a decimal
    pub fn annual_rate(&self) -> f64 {
        self.annual_rate_pct / 100.0
    }

    pub fn periods_per_year(&self) -> Option<u32> {
        self.frequency.periods_per_year()
    }

    /// Number of installments: `term_months * periods_per_year / 12`, truncated
    pub fn payment_count(&self) -> u32 {
        match self.periods_per_year() {
            Some(ppy) => u32::try_from(self.term_months as u64 * ppy as u64 / 12).unwrap_or(u32::MAX),
            None => 1,
        }
    }

    /// Rate applied per period. A bullet loan accrues simple interest over the whole term.
    pub fn periodic_rate(&self) -> f64 {
        match self.periods_per_year() {
            Some(ppy) => self.annual_rate() / ppy as f64,
            None => self.annual_rate() * self.term_months as f64 / 12.0,
        }
    }

    /// Fractional number of periods in a year, used to annualize periodic rates
    pub fn annualization_factor(&self) -> f64 {
        match self.periods_per_year() {
            Some(ppy) => ppy as f64,
            None => 12.0 / self.term_months.max(1) as f64,
        }
    }

    /// Due date of a 1-based period, if a first payment date was given
    pub fn due_date(&self, period: u32) -> Result<Option<NaiveDate>> {
        let Some(first) = self.first_payment_date else {
            return Ok(None);
        };
        let offset = period.saturating_sub(1);

        let due = match self.frequency.due_step(self.term_months) {
            DueStep::Days(days) => first.checked_add_days(Days::new(days * offset as u64)),
            // The bullet payment falls on the first payment date itself
            DueStep::Months(_) if self.frequency == PaymentFrequency::AtMaturity => Some(first),
            DueStep::Months(months) => first.checked_add_months(Months::new(months * offset)),
        };

        due.map(Some).ok_or_else(|| {
            AmortizationError::Date(format!(
                "due date for period {} overflows the calendar (first payment {})",
                period, first
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly_loan() -> LoanTerms {
        LoanTerms::new(
            10_000.0,
            12.0,
            12,
            PaymentFrequency::Monthly,
            AmortizationMethod::LevelPayment,
        )
    }

    #[test]
    fn test_payment_count_truncates() {
        let mut loan = monthly_loan();
        loan.term_months = 36;
        assert_eq!(loan.payment_count(), 36);

        loan.frequency = PaymentFrequency::Quarterly;
        assert_eq!(loan.payment_count(), 12);

        // 14 months quarterly: 14 * 4 / 12 = 4.67 -> 4
        loan.term_months = 14;
        assert_eq!(loan.payment_count(), 4);

        loan.frequency = PaymentFrequency::AtMaturity;
        assert_eq!(loan.payment_count(), 1);

        loan.term_months = 12;
        loan.frequency = PaymentFrequency::Daily;
        assert_eq!(loan.payment_count(), 360);
    }

    #[test]
    fn test_periodic_rate() {
        let loan = monthly_loan();
        assert!((loan.periodic_rate() - 0.01).abs() < 1e-15);

        let mut bullet = monthly_loan();
        bullet.frequency = PaymentFrequency::AtMaturity;
        bullet.term_months = 6;
        assert!((bullet.periodic_rate() - 0.06).abs() < 1e-15);
    }

    #[test]
    fn test_validation_rejects_bad_inputs() {
        let mut loan = monthly_loan();
        loan.principal = -1.0;
        assert!(matches!(
            loan.validate(),
            Err(AmortizationError::InvalidInput { field: "principal", .. })
        ));

        let mut loan = monthly_loan();
        loan.annual_rate_pct = f64::NAN;
        assert!(loan.validate().is_err());

        let mut loan = monthly_loan();
        loan.term_months = 0;
        assert!(matches!(
            loan.validate(),
            Err(AmortizationError::InvalidInput { field: "term_months", .. })
        ));

        // One month cannot hold a semiannual installment
        let mut loan = monthly_loan();
        loan.term_months = 1;
        loan.frequency = PaymentFrequency::Semiannual;
        assert!(matches!(
            loan.validate(),
            Err(AmortizationError::NoPaymentPeriods { term_months: 1, .. })
        ));

        assert!(monthly_loan().validate().is_ok());
    }

    #[test]
    fn test_term_upper_bound() {
        let mut loan = monthly_loan();
        loan.frequency = PaymentFrequency::Daily;
        loan.term_months = MAX_TERM_MONTHS;
        assert!(loan.validate().is_ok());
        assert_eq!(loan.payment_count(), 36_000);

        loan.term_months = MAX_TERM_MONTHS + 1;
        assert!(matches!(
            loan.validate(),
            Err(AmortizationError::InvalidInput { field: "term_months", .. })
        ));

        // Large enough that a wrapping cast would yield 14 installments
        loan.term_months = 143_165_577;
        assert!(loan.validate().is_err());
        assert_eq!(loan.payment_count(), u32::MAX);
    }

    #[test]
    fn test_labels_round_trip() {
        for freq in PaymentFrequency::ALL {
            assert_eq!(freq.as_str().parse::<PaymentFrequency>().unwrap(), freq);
        }
        assert_eq!("Four-Month".parse::<PaymentFrequency>().unwrap(), PaymentFrequency::FourMonthly);
        assert_eq!("level".parse::<AmortizationMethod>().unwrap(), AmortizationMethod::LevelPayment);
        assert!("fortnightly-ish".parse::<PaymentFrequency>().is_err());
    }

    #[test]
    fn test_due_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let loan = monthly_loan().with_first_payment_date(start);

        assert_eq!(loan.due_date(1).unwrap(), Some(start));
        // Month arithmetic clamps to the end of February
        assert_eq!(loan.due_date(2).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(loan.due_date(13).unwrap(), NaiveDate::from_ymd_opt(2025, 1, 31));

        let mut weekly = loan.clone();
        weekly.frequency = PaymentFrequency::Weekly;
        assert_eq!(weekly.due_date(3).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 14));

        assert_eq!(monthly_loan().due_date(5).unwrap(), None);
    }

    #[test]
    fn test_bullet_due_on_first_payment_date() {
        let maturity = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let mut bullet = monthly_loan().with_first_payment_date(maturity);
        bullet.frequency = PaymentFrequency::AtMaturity;
        bullet.term_months = 18;

        assert_eq!(bullet.payment_count(), 1);
        assert_eq!(bullet.due_date(1).unwrap(), Some(maturity));
    }
}
