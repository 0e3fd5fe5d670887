//! Loan Amortization - schedule engine for installment loans
//!
//! This library provides:
//! - Level-payment (annuity) and declining-balance schedules
//! - Daily through annual installment frequencies, plus bullet loans
//! - Configurable credit insurance premiums and eligibility windows
//! - Effective annual cost, batch runs and rate sensitivities
//! - Loan-book CSV loading and table/CSV rendering

pub mod error;
pub mod loan;
pub mod insurance;
pub mod schedule;
pub mod scenario;
pub mod report;

// Re-export commonly used types
pub use error::{AmortizationError, Result};
pub use loan::{AmortizationMethod, LoanTerms, PaymentFrequency};
pub use insurance::{InsuranceTerms, InsuranceWindow, PremiumBasis};
pub use schedule::{
    build_schedule, AmortizationEngine, AmortizationSchedule, PaymentRecord, ScheduleConfig,
    ScheduleSummary,
};
pub use scenario::ScenarioRunner;
