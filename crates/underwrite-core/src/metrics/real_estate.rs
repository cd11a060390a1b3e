use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::projection::re_noi_in_year;
use super::{HOLD_YEARS, SELLING_COST_RATE};
use crate::deal::{FinancingTerms, RealEstateTerms};
use crate::time_value::{irr, loan_balance_after, monthly_payment};
use crate::types::{Extended, Money, Rate};

/// Derived rental-property metrics. Immutable; recomputed on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealEstateMetrics {
    /// Annual income after vacancy (rent + other income)
    pub effective_gross_income: Money,
    /// Annual fixed expenses plus management fee
    pub operating_expenses: Money,
    pub noi: Money,
    /// NOI / purchase price; 0 when price is 0
    pub cap_rate: Rate,
    pub operating_expense_ratio: Rate,
    pub monthly_debt_service: Money,
    pub annual_debt_service: Money,
    pub monthly_cash_flow: Money,
    pub annual_cash_flow: Money,
    pub total_cash_invested: Money,
    /// Annual cash flow / cash invested; 0 when nothing is invested
    pub cash_on_cash: Rate,
    /// NOI / annual debt service; unbounded with no debt
    pub dscr: Extended,
    /// Hold-period return including appreciation net of selling costs
    pub five_year_roi: Rate,
    pub irr: Rate,
}

pub fn real_estate_metrics(
    terms: &RealEstateTerms,
    financing: &FinancingTerms,
    warnings: &mut Vec<String>,
) -> RealEstateMetrics {
    let gross_income = (terms.monthly_rent + terms.other_monthly_income) * dec!(12);
    let effective_gross_income = gross_income * (Decimal::ONE - terms.vacancy_rate);
    let management_fee = effective_gross_income * terms.management_rate;
    let operating_expenses = terms.expenses.monthly_total() * dec!(12) + management_fee;
    let noi = effective_gross_income - operating_expenses;

    let cap_rate = if terms.purchase_price.is_zero() {
        Decimal::ZERO
    } else {
        noi / terms.purchase_price
    };

    let operating_expense_ratio = if effective_gross_income.is_zero() {
        Decimal::ZERO
    } else {
        operating_expenses / effective_gross_income
    };

    let monthly_debt_service = monthly_payment(
        financing.loan_amount,
        financing.interest_rate,
        financing.amortization_years,
    );
    let annual_debt_service = monthly_debt_service * dec!(12);

    let annual_cash_flow = noi - annual_debt_service;
    let monthly_cash_flow = annual_cash_flow / dec!(12);

    let down_payment = (terms.purchase_price - financing.loan_amount).max(Decimal::ZERO);
    let total_cash_invested = down_payment + terms.closing_costs + terms.rehab_costs;

    let cash_on_cash = if total_cash_invested <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        annual_cash_flow / total_cash_invested
    };

    let dscr = if annual_debt_service.is_zero() {
        Extended::Infinite
    } else {
        Extended::Finite(noi / annual_debt_service)
    };

    let (five_year_roi, irr) = hold_period_returns(terms, financing, annual_debt_service, total_cash_invested, warnings);

    if dscr.is_below(dec!(1.2)) {
        warnings.push(format!(
            "DSCR of {dscr} is below 1.20x — lender covenant risk"
        ));
    }
    if terms.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            terms.vacancy_rate * dec!(100)
        ));
    }

    RealEstateMetrics {
        effective_gross_income,
        operating_expenses,
        noi,
        cap_rate,
        operating_expense_ratio,
        monthly_debt_service,
        annual_debt_service,
        monthly_cash_flow,
        annual_cash_flow,
        total_cash_invested,
        cash_on_cash,
        dscr,
        five_year_roi,
        irr,
    }
}

/// Five-year hold: annual cash flows with compounded growth, then sale at
/// the appreciated price net of flat selling costs and the loan payoff.
fn hold_period_returns(
    terms: &RealEstateTerms,
    financing: &FinancingTerms,
    annual_debt_service: Money,
    total_cash_invested: Money,
    warnings: &mut Vec<String>,
) -> (Rate, Rate) {
    if total_cash_invested <= Decimal::ZERO {
        return (Decimal::ZERO, Decimal::ZERO);
    }

    let mut cash_flows = Vec::with_capacity(HOLD_YEARS as usize + 1);
    cash_flows.push(-total_cash_invested);
    let mut total_cf = Decimal::ZERO;
    for year in 1..=HOLD_YEARS {
        let cf = re_noi_in_year(terms, year) - annual_debt_service;
        total_cf += cf;
        cash_flows.push(cf);
    }

    let mut sale_price = terms.purchase_price;
    for _ in 0..HOLD_YEARS {
        sale_price *= Decimal::ONE + terms.appreciation_rate;
    }
    let loan_payoff = loan_balance_after(
        financing.loan_amount,
        financing.interest_rate,
        financing.amortization_years,
        HOLD_YEARS * 12,
    );
    let net_sale_proceeds = sale_price * (Decimal::ONE - SELLING_COST_RATE) - loan_payoff;

    if let Some(last) = cash_flows.last_mut() {
        *last += net_sale_proceeds;
    }

    let total_return = total_cf + net_sale_proceeds - total_cash_invested;
    let roi = total_return / total_cash_invested;
    let irr_rate = irr(&cash_flows, warnings);

    (roi, irr_rate)
}
