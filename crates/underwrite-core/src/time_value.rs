use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

pub const MAX_IRR_ITERATIONS: u32 = 100;
const IRR_TOLERANCE: Decimal = dec!(0.000001);
const DERIVATIVE_FLOOR: Decimal = dec!(0.0000000001);

/// Standard fixed-rate payment: P * r(1+r)^n / ((1+r)^n - 1).
///
/// Degenerate terms degrade to defined results: a non-positive principal
/// or zero amortization returns 0, a zero rate is straight-line.
pub fn monthly_payment(principal: Money, annual_rate: Rate, amortization_years: u32) -> Money {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let total_months = amortization_years * 12;
    if total_months == 0 {
        return Decimal::ZERO;
    }

    let monthly_rate = annual_rate / dec!(12);
    if monthly_rate.is_zero() {
        return principal / Decimal::from(total_months);
    }

    // (1 + r)^n via iterative multiplication
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound *= Decimal::ONE + monthly_rate;
    }

    principal * monthly_rate * compound / (compound - Decimal::ONE)
}

/// Outstanding balance after `months_paid` payments, walking the
/// amortization forward so the result agrees with the schedule.
pub fn loan_balance_after(
    principal: Money,
    annual_rate: Rate,
    amortization_years: u32,
    months_paid: u32,
) -> Money {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let total_months = amortization_years * 12;
    if total_months == 0 {
        return principal;
    }

    let monthly_rate = annual_rate / dec!(12);
    let months = months_paid.min(total_months);

    if monthly_rate.is_zero() {
        let paid = principal * Decimal::from(months) / Decimal::from(total_months);
        return (principal - paid).max(Decimal::ZERO);
    }

    let payment = monthly_payment(principal, annual_rate, amortization_years);
    let mut balance = principal;
    for _ in 0..months {
        let interest = balance * monthly_rate;
        balance -= payment - interest;
        if balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
    }
    balance
}

/// Newton-Raphson IRR. cash_flows[0] is typically negative (investment).
///
/// Degrades rather than diverges: a near-zero derivative or iteration
/// cap returns the last estimate with a warning pushed to the caller.
pub fn irr(cash_flows: &[Money], warnings: &mut Vec<String>) -> Rate {
    let mut rate = dec!(0.10); // initial guess

    for _ in 0..MAX_IRR_ITERATIONS {
        let (npv, dnpv) = npv_and_derivative(cash_flows, rate);

        if dnpv.abs() < DERIVATIVE_FLOOR {
            warnings.push("IRR: derivative near zero — returning last estimate".into());
            return rate;
        }

        let next = rate - npv / dnpv;
        if (next - rate).abs() < IRR_TOLERANCE {
            return next;
        }
        rate = next;

        // Guard against runaway
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        }
        if rate > dec!(10.0) {
            rate = dec!(10.0);
        }
    }

    warnings.push(format!(
        "IRR: no convergence after {MAX_IRR_ITERATIONS} iterations — returning last estimate"
    ));
    rate
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
fn npv_and_derivative(cash_flows: &[Money], rate: Decimal) -> (Decimal, Decimal) {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^0

    for (t, cf) in cash_flows.iter().enumerate() {
        npv += *cf * discount;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            dnpv += Decimal::from(-(t as i64)) * *cf * discount / one_plus_r;
        }
        discount /= one_plus_r;
    }

    (npv, dnpv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_payment_reference_case() {
        // $187,500 at 7.0% over 30 years ≈ $1,247.44/mo
        let payment = monthly_payment(dec!(187500), dec!(0.07), 30);
        assert!(
            (payment - dec!(1247.44)).abs() < dec!(0.25),
            "payment {payment} outside expected band"
        );
    }

    #[test]
    fn test_monthly_payment_zero_rate() {
        // $360k interest-free over 30 years = $1000/mo
        assert_eq!(monthly_payment(dec!(360000), Decimal::ZERO, 30), dec!(1000));
    }

    #[test]
    fn test_monthly_payment_degenerate_inputs() {
        assert_eq!(monthly_payment(Decimal::ZERO, dec!(0.07), 30), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(-5000), dec!(0.07), 30), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(100000), dec!(0.07), 0), Decimal::ZERO);
    }

    #[test]
    fn test_loan_balance_walks_down() {
        let start = dec!(187500);
        let after_5y = loan_balance_after(start, dec!(0.07), 30, 60);
        let after_10y = loan_balance_after(start, dec!(0.07), 30, 120);
        assert!(after_5y < start);
        assert!(after_10y < after_5y);
        assert_eq!(loan_balance_after(start, dec!(0.07), 30, 360), Decimal::ZERO);
    }

    #[test]
    fn test_loan_balance_zero_amortization() {
        assert_eq!(loan_balance_after(dec!(100000), dec!(0.07), 0, 12), dec!(100000));
    }

    #[test]
    fn test_irr_one_period() {
        // Invest 100, receive 110 => 10%
        let mut warnings = Vec::new();
        let rate = irr(&[dec!(-100), dec!(110)], &mut warnings);
        assert!((rate - dec!(0.10)).abs() < dec!(0.0001));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_irr_multi_period() {
        // Invest 1000, receive 300/yr for 5 years => ~15.24%
        let cfs = vec![dec!(-1000), dec!(300), dec!(300), dec!(300), dec!(300), dec!(300)];
        let mut warnings = Vec::new();
        let rate = irr(&cfs, &mut warnings);
        assert!(rate > dec!(0.14) && rate < dec!(0.17), "got {rate}");
    }

    #[test]
    fn test_irr_degrades_on_flat_vector() {
        // A single cash flow has a zero derivative everywhere; the solver
        // must hand back its estimate, not diverge.
        let mut warnings = Vec::new();
        let rate = irr(&[dec!(-100)], &mut warnings);
        assert_eq!(rate, dec!(0.10));
        assert_eq!(warnings.len(), 1);
    }
}
