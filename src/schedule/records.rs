//! Payment records and the schedule they form

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::loan::{AmortizationMethod, PaymentFrequency};

/// A single installment of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// 1-based installment index
    pub period: u32,
    pub due_date: Option<NaiveDate>,

    pub opening_balance: f64,

    /// Gross installment: interest + principal + insurance
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub insurance: f64,

    /// Balance outstanding after this installment
    pub balance: f64,
}

impl PaymentRecord {
    pub fn new(period: u32) -> Self {
        Self {
            period,
            due_date: None,
            opening_balance: 0.0,
            payment: 0.0,
            interest: 0.0,
            principal: 0.0,
            insurance: 0.0,
            balance: 0.0,
        }
    }

    /// Installment excluding insurance
    pub fn debt_service(&self) -> f64 {
        self.interest + self.principal
    }
}

/// Complete amortization schedule for one loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub loan_id: u32,
    pub frequency: PaymentFrequency,
    pub method: AmortizationMethod,
    pub principal: f64,

    /// Number of installments
    pub payment_count: u32,

    /// Interest rate applied per installment
    pub periodic_rate: f64,

    /// Installment before insurance: the level payment, or the fixed
    /// principal share for declining-balance loans
    pub installment: f64,

    /// Installments in period order
    pub records: Vec<PaymentRecord>,

    /// Annualized cost of the loan including insurance, when computed
    pub effective_annual_rate: Option<f64>,
}

impl AmortizationSchedule {
    pub fn new(
        loan_id: u32,
        frequency: PaymentFrequency,
        method: AmortizationMethod,
        principal: f64,
    ) -> Self {
        Self {
            loan_id,
            frequency,
            method,
            principal,
            payment_count: 0,
            periodic_rate: 0.0,
            installment: 0.0,
            records: Vec::new(),
            effective_annual_rate: None,
        }
    }

    /// Add a payment record
    pub fn add_record(&mut self, record: PaymentRecord) {
        self.records.push(record);
    }

    /// Borrower cashflows: the advance followed by each gross installment paid back
    pub fn borrower_cashflows(&self) -> Vec<f64> {
        std::iter::once(self.principal)
            .chain(self.records.iter().map(|r| -r.payment))
            .collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ScheduleSummary {
        let total_paid: f64 = self.records.iter().map(|r| r.payment).sum();
        let total_interest: f64 = self.records.iter().map(|r| r.interest).sum();
        let total_principal: f64 = self.records.iter().map(|r| r.principal).sum();
        let total_insurance: f64 = self.records.iter().map(|r| r.insurance).sum();

        let initial_payment = self.records.first().map(|r| r.payment).unwrap_or(0.0);
        let final_balance = self.records.last().map(|r| r.balance).unwrap_or(self.principal);

        ScheduleSummary {
            payment_count: self.records.len() as u32,
            total_paid,
            total_interest,
            total_principal,
            total_insurance,
            initial_payment,
            final_balance,
            effective_annual_rate: self.effective_annual_rate,
        }
    }
}

/// Summary totals for a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub payment_count: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub total_principal: f64,
    pub total_insurance: f64,
    /// Gross payment of the first installment
    pub initial_payment: f64,
    pub final_balance: f64,
    pub effective_annual_rate: Option<f64>,
}
