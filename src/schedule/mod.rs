//! Amortization schedule generation

mod state;
mod engine;
mod records;
mod irr;

pub use state::ScheduleState;
pub use engine::{build_schedule, level_payment, AmortizationEngine, ScheduleConfig};
pub use records::{AmortizationSchedule, PaymentRecord, ScheduleSummary};
pub use irr::{annualized_irr, effective_annual_rate, periodic_irr};
