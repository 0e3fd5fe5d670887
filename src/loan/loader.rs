//! Load loan terms from a loans CSV

use std::path::Path;

use chrono::NaiveDate;
use csv::Reader;

use super::{AmortizationMethod, LoanTerms, PaymentFrequency};
use crate::error::{AmortizationError, Result};
use crate::insurance::InsuranceTerms;

/// Default location of the sample loan book
pub const DEFAULT_LOANS_PATH: &str = "data/sample_loans.csv";

/// Raw CSV row matching the loans file columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanID")]
    loan_id: u32,
    #[serde(rename = "Principal")]
    principal: f64,
    #[serde(rename = "AnnualRatePct")]
    annual_rate_pct: f64,
    #[serde(rename = "TermMonths")]
    term_months: u32,
    #[serde(rename = "Frequency")]
    frequency: String,
    #[serde(rename = "Method")]
    method: String,
    #[serde(rename = "InsuranceRatePerThousand", default)]
    insurance_rate_per_thousand: Option<f64>,
    #[serde(rename = "StartDate", default)]
    start_date: Option<String>,
}

impl CsvRow {
    fn into_terms(self) -> Result<LoanTerms> {
        let frequency: PaymentFrequency = self.frequency.parse()?;
        let method: AmortizationMethod = self.method.parse()?;

        let mut terms = LoanTerms::new(
            self.principal,
            self.annual_rate_pct,
            self.term_months,
            frequency,
            method,
        )
        .with_loan_id(self.loan_id);

        // Blank or zero means the loan carries no insurance
        if let Some(rate) = self.insurance_rate_per_thousand.filter(|r| *r != 0.0) {
            let insurance = InsuranceTerms::per_thousand(rate);
            insurance.validate()?;
            terms = terms.with_insurance(insurance);
        }

        if let Some(raw) = self.start_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                AmortizationError::Date(format!("loan {}: bad StartDate '{}': {}", self.loan_id, raw, e))
            })?;
            terms = terms.with_first_payment_date(date);
        }

        Ok(terms)
    }
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<LoanTerms>> {
    let reader = Reader::from_path(path)?;
    collect_loans(reader)
}

/// Load loans from any reader (e.g., string buffer, stdin)
pub fn load_loans_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<LoanTerms>> {
    collect_loans(Reader::from_reader(reader))
}

/// Load loans from the default sample loan book
pub fn load_default_loans() -> Result<Vec<LoanTerms>> {
    load_loans(DEFAULT_LOANS_PATH)
}

fn collect_loans<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<LoanTerms>> {
    let mut loans = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        loans.push(row.into_terms()?);
    }

    Ok(loans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insurance::{InsuranceWindow, PremiumBasis};

    const LOANS: &str = "\
LoanID,Principal,AnnualRatePct,TermMonths,Frequency,Method,InsuranceRatePerThousand,StartDate
1,10000,12,12,monthly,level_payment,,
2,25000,9.5,36,quarterly,declining_balance,0.5,2025-03-01
3,5000,0,6,at_maturity,level,,
";

    #[test]
    fn test_load_loans_from_reader() {
        let loans = load_loans_from_reader(LOANS.as_bytes()).expect("Failed to load loans");
        assert_eq!(loans.len(), 3);

        let first = &loans[0];
        assert_eq!(first.loan_id, 1);
        assert_eq!(first.frequency, PaymentFrequency::Monthly);
        assert!(first.insurance.is_none());
        assert!(first.first_payment_date.is_none());

        let second = &loans[1];
        assert_eq!(second.method, AmortizationMethod::DecliningBalance);
        assert_eq!(second.first_payment_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        let insurance = second.insurance.as_ref().unwrap();
        assert_eq!(insurance.window, InsuranceWindow::ExcludeFinalYear);
        assert_eq!(
            insurance.basis,
            PremiumBasis::ReferenceBalance { monthly_rate_per_thousand: 0.5 }
        );

        assert_eq!(loans[2].frequency, PaymentFrequency::AtMaturity);
    }

    #[test]
    fn test_unknown_frequency_is_rejected() {
        let data = "\
LoanID,Principal,AnnualRatePct,TermMonths,Frequency,Method
7,1000,5,12,hourly,level_payment
";
        let err = load_loans_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, AmortizationError::UnknownLabel { kind: "payment frequency", .. }));
    }

    #[test]
    fn test_bad_start_date_is_rejected() {
        let data = "\
LoanID,Principal,AnnualRatePct,TermMonths,Frequency,Method,InsuranceRatePerThousand,StartDate
8,1000,5,12,monthly,level_payment,,2025-13-40
";
        let err = load_loans_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, AmortizationError::Date(_)));
    }

    #[test]
    fn test_negative_insurance_rate_is_rejected() {
        let data = "\
LoanID,Principal,AnnualRatePct,TermMonths,Frequency,Method,InsuranceRatePerThousand,StartDate
9,1000,5,24,monthly,level_payment,-0.5,
";
        let err = load_loans_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, AmortizationError::InvalidInput { .. }));
    }

    #[test]
    fn test_zero_insurance_rate_means_uninsured() {
        let data = "\
LoanID,Principal,AnnualRatePct,TermMonths,Frequency,Method,InsuranceRatePerThousand,StartDate
10,1000,5,24,monthly,level_payment,0,
";
        let loans = load_loans_from_reader(data.as_bytes()).expect("Failed to load loans");
        assert!(loans[0].insurance.is_none());
    }
}
