//! Running balance state while a schedule is built

/// State of the loan between installments
#[derive(Debug, Clone)]
pub struct ScheduleState {
    /// Current installment (1-indexed, 0 before the first)
    pub period: u32,

    /// Balance outstanding at the start of the current installment
    pub opening_balance: f64,

    /// Balance outstanding after the current installment
    pub closing_balance: f64,

    /// Principal repaid so far
    pub principal_repaid: f64,
}

impl ScheduleState {
    /// Initialize state at disbursement
    pub fn at_disbursement(principal: f64) -> Self {
        Self {
            period: 0,
            opening_balance: principal,
            closing_balance: principal,
            principal_repaid: 0.0,
        }
    }

    /// Advance to next installment; the opening balance comes from the prior close
    pub fn advance_period(&mut self) {
        self.period += 1;
        self.opening_balance = self.closing_balance;
    }

    /// Apply a principal repayment, never letting the balance go negative
    pub fn repay(&mut self, principal: f64, tolerance: f64) -> f64 {
        let applied = principal.clamp(0.0, self.opening_balance);
        let mut closing = (self.opening_balance - applied).max(0.0);
        if closing < tolerance {
            closing = 0.0;
        }
        self.closing_balance = closing;
        self.principal_repaid += applied;
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repay_clamps_overpayment() {
        let mut state = ScheduleState::at_disbursement(100.0);
        state.advance_period();
        let applied = state.repay(150.0, 1e-9);
        assert_eq!(applied, 100.0);
        assert_eq!(state.closing_balance, 0.0);

        state.advance_period();
        assert_eq!(state.period, 2);
        assert_eq!(state.opening_balance, 0.0);
    }

    #[test]
    fn test_repay_snaps_dust_to_zero() {
        let mut state = ScheduleState::at_disbursement(100.0);
        state.advance_period();
        state.repay(100.0 - 1e-12, 1e-9);
        assert_eq!(state.closing_balance, 0.0);
    }
}
