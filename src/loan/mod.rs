//! Loan terms and loan-book loading

mod terms;
pub mod loader;

pub use terms::{AmortizationMethod, DueStep, LoanTerms, PaymentFrequency, MAX_TERM_MONTHS};
pub use loader::{load_default_loans, load_loans, load_loans_from_reader};
