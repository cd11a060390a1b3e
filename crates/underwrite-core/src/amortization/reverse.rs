use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Extended, Money, Rate};

/// Largest loan whose payment keeps coverage at the target DSCR, given
/// the income a lender counts. Closed-form annuity present value of the
/// affordable payment. Zero when income, DSCR, or the amortization
/// window make the question degenerate.
pub fn max_supportable_loan(
    annual_income: Money,
    target_dscr: Decimal,
    annual_rate: Rate,
    amortization_years: u32,
) -> Money {
    let total_months = amortization_years * 12;
    if annual_income <= Decimal::ZERO || target_dscr <= Decimal::ZERO || total_months == 0 {
        return Decimal::ZERO;
    }

    let affordable_payment = (annual_income / target_dscr) / dec!(12);

    if annual_rate.is_zero() {
        return affordable_payment * Decimal::from(total_months);
    }

    let monthly_rate = annual_rate / dec!(12);
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound *= Decimal::ONE + monthly_rate;
    }

    // PV of an ordinary annuity: pmt * (c - 1) / (r * c)
    affordable_payment * (compound - Decimal::ONE) / (monthly_rate * compound)
}

/// Price a buyer can pay when the loan above covers everything but the
/// down payment. Unbounded when the structure needs no loan at all
/// (down payment at or above 100%).
pub fn max_supportable_price(max_loan: Money, down_payment_rate: Rate) -> Extended {
    if down_payment_rate >= Decimal::ONE {
        return Extended::Infinite;
    }
    let financed_share = Decimal::ONE - down_payment_rate;
    if financed_share <= Decimal::ZERO {
        return Extended::Infinite;
    }
    Extended::Finite((max_loan / financed_share).max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::monthly_payment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_solved_loan_hits_the_target_exactly() {
        // 21,600 NOI at a 1.25x target, 7% over 30 years
        let loan = max_supportable_loan(dec!(21600), dec!(1.25), dec!(0.07), 30);
        let payment = monthly_payment(loan, dec!(0.07), 30);
        let dscr = dec!(21600) / (payment * dec!(12));
        assert!((dscr - dec!(1.25)).abs() < dec!(0.0001), "dscr {dscr}");
    }

    #[test]
    fn test_higher_target_means_smaller_loan() {
        let loose = max_supportable_loan(dec!(100000), dec!(1.10), dec!(0.08), 25);
        let tight = max_supportable_loan(dec!(100000), dec!(1.50), dec!(0.08), 25);
        assert!(tight < loose);
    }

    #[test]
    fn test_zero_rate_is_straight_line_capacity() {
        let loan = max_supportable_loan(dec!(12000), dec!(1.0), Decimal::ZERO, 10);
        // 1,000/mo affordable for 120 months
        assert_eq!(loan, dec!(120000));
    }

    #[test]
    fn test_degenerate_inputs_support_nothing() {
        assert_eq!(
            max_supportable_loan(Decimal::ZERO, dec!(1.25), dec!(0.07), 30),
            Decimal::ZERO
        );
        assert_eq!(
            max_supportable_loan(dec!(50000), Decimal::ZERO, dec!(0.07), 30),
            Decimal::ZERO
        );
        assert_eq!(
            max_supportable_loan(dec!(50000), dec!(1.25), dec!(0.07), 0),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_price_scales_loan_by_financed_share() {
        assert_eq!(
            max_supportable_price(dec!(187500), dec!(0.25)),
            Extended::Finite(dec!(250000))
        );
    }

    #[test]
    fn test_all_cash_buyer_is_unconstrained() {
        assert_eq!(
            max_supportable_price(Decimal::ZERO, Decimal::ONE),
            Extended::Infinite
        );
    }
}
