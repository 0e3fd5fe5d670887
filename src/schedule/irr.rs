//! Internal Rate of Return (IRR) calculation
//!
//! Used to annualize the all-in cost of a schedule, insurance included

use super::records::AmortizationSchedule;

const TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 1000;

/// Lowest and highest periodic rates searched
const RATE_BOUNDS: (f64, f64) = (-0.99, 10.0);

/// Periodic IRR of evenly spaced cashflows using Newton-Raphson,
/// falling back to bisection when the derivative vanishes or iteration stalls.
///
/// Returns None when the cashflows never change sign.
pub fn periodic_irr(cashflows: &[f64], initial_guess: f64) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }
    if cashflows.iter().all(|&cf| cf.abs() < 1e-10) {
        return Some(0.0);
    }
    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    let (low, high) = RATE_BOUNDS;
    let mut rate = initial_guess;
    for _ in 0..MAX_ITERATIONS {
        let (npv, slope) = discount(cashflows, rate);
        if slope.abs() < 1e-20 {
            break;
        }
        let next = (rate - npv / slope).clamp(low, high);
        if (next - rate).abs() < TOLERANCE {
            return Some(next);
        }
        rate = next;
    }

    bisect(cashflows, low, high)
}

/// Annual IRR given a (possibly fractional) number of periods per year
pub fn annualized_irr(cashflows: &[f64], periods_per_year: f64) -> Option<f64> {
    let guess = 0.05 / periods_per_year.max(1.0);
    periodic_irr(cashflows, guess).map(|r| (1.0 + r).powf(periods_per_year) - 1.0)
}

/// Effective annual cost of a schedule: IRR of the advance against every
/// gross installment, compounded over a year
pub fn effective_annual_rate(schedule: &AmortizationSchedule, periods_per_year: f64) -> Option<f64> {
    annualized_irr(&schedule.borrower_cashflows(), periods_per_year)
}

/// Present value at `rate` and its derivative, walking the discount factor
/// forward one period at a time
fn discount(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let step = 1.0 / (1.0 + rate);
    let mut factor = 1.0;
    let mut npv = 0.0;
    let mut slope = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        npv += cf * factor;
        slope -= t as f64 * cf * factor * step;
        factor *= step;
    }

    (npv, slope)
}

/// Halve `[low, high]` until the present value changes sign within tolerance
fn bisect(cashflows: &[f64], mut low: f64, mut high: f64) -> Option<f64> {
    let value_at = |rate: f64| discount(cashflows, rate).0;

    let mut at_low = value_at(low);
    if at_low * value_at(high) > 0.0 {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        let at_mid = value_at(mid);
        if at_mid.abs() < TOLERANCE || high - low < 2.0 * TOLERANCE {
            return Some(mid);
        }
        if at_mid.signum() == at_low.signum() {
            low = mid;
            at_low = at_mid;
        } else {
            high = mid;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_simple_irr() {
        // Investment of $1000, returns $1100 after 12 monthly periods
        let mut cashflows = vec![-1000.0];
        cashflows.extend(vec![0.0; 11]);
        cashflows.push(1100.0);

        let irr = annualized_irr(&cashflows, 12.0).unwrap();
        assert_abs_diff_eq!(irr, 0.10, epsilon = 1e-6);
    }

    #[test]
    fn test_annuity_irr_recovers_rate() {
        // 10000 repaid by 12 payments of the 1%-per-month annuity
        let mut cashflows = vec![10_000.0];
        cashflows.extend(vec![-888.487886783417; 12]);

        let periodic = periodic_irr(&cashflows, 0.005).unwrap();
        assert_abs_diff_eq!(periodic, 0.01, epsilon = 1e-8);
    }

    #[test]
    fn test_no_sign_change() {
        assert!(periodic_irr(&[100.0, 50.0], 0.01).is_none());
        assert!(periodic_irr(&[], 0.01).is_none());
        assert_eq!(periodic_irr(&[0.0, 0.0], 0.01), Some(0.0));
    }

    #[test]
    fn test_bisection_agrees_with_newton() {
        let mut cashflows = vec![10_000.0];
        cashflows.extend(vec![-888.487886783417; 12]);

        let (low, high) = RATE_BOUNDS;
        let bisected = bisect(&cashflows, low, high).unwrap();
        assert_abs_diff_eq!(bisected, 0.01, epsilon = 1e-8);
        assert!(bisect(&cashflows, 0.02, high).is_none());
    }
}
