use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::projection::biz_sde_in_year;
use super::HOLD_YEARS;
use crate::deal::{BusinessTerms, FinancingTerms};
use crate::time_value::{loan_balance_after, monthly_payment};
use crate::types::{Extended, Money, Multiple, Rate};

/// Derived small-business acquisition metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub ebitda: Money,
    /// EBITDA plus owner salary and discretionary add-backs
    pub sde: Money,
    /// SDE / revenue; 0 when revenue is 0
    pub sde_margin: Rate,
    pub gross_margin: Rate,
    /// Fixed costs / gross margin; unbounded when margin is non-positive
    pub break_even_revenue: Extended,
    /// Asking price / revenue; 0 when revenue is 0
    pub revenue_multiple: Multiple,
    /// Asking price / SDE; 0 when SDE is non-positive
    pub sde_multiple: Multiple,
    pub monthly_debt_service: Money,
    pub annual_debt_service: Money,
    /// SDE less debt service (owner-operator view)
    pub annual_cash_flow: Money,
    pub total_cash_invested: Money,
    pub cash_on_cash: Rate,
    /// SDE / annual debt service; unbounded with no debt
    pub dscr: Extended,
    pub five_year_roi: Rate,
}

pub fn business_metrics(
    terms: &BusinessTerms,
    financing: &FinancingTerms,
    warnings: &mut Vec<String>,
) -> BusinessMetrics {
    let ebitda = terms.annual_revenue - terms.cost_of_goods - terms.operating_expenses
        + terms.add_backs.ebitda_total();
    let sde = ebitda + terms.owner_salary + terms.add_backs.other;

    let sde_margin = if terms.annual_revenue <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        sde / terms.annual_revenue
    };

    let gross_margin = if terms.annual_revenue <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        (terms.annual_revenue - terms.cost_of_goods) / terms.annual_revenue
    };

    let monthly_debt_service = monthly_payment(
        financing.loan_amount,
        financing.interest_rate,
        financing.amortization_years,
    );
    let annual_debt_service = monthly_debt_service * dec!(12);

    // Break-even treats operating costs plus debt service as the fixed
    // block; a non-positive margin can never cover it.
    let fixed_costs = terms.operating_expenses + annual_debt_service;
    let break_even_revenue = if gross_margin <= Decimal::ZERO {
        Extended::Infinite
    } else {
        Extended::Finite(fixed_costs / gross_margin)
    };

    let revenue_multiple = if terms.annual_revenue <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        terms.asking_price / terms.annual_revenue
    };
    let sde_multiple = if sde <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        terms.asking_price / sde
    };

    let annual_cash_flow = sde - annual_debt_service;

    let down_payment = (terms.asking_price - financing.loan_amount).max(Decimal::ZERO);
    let total_cash_invested = down_payment + terms.closing_costs;
    let cash_on_cash = if total_cash_invested <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        annual_cash_flow / total_cash_invested
    };

    let dscr = if annual_debt_service.is_zero() {
        Extended::Infinite
    } else {
        Extended::Finite(sde / annual_debt_service)
    };

    let five_year_roi = hold_period_roi(
        terms,
        financing,
        annual_debt_service,
        total_cash_invested,
        sde_multiple,
    );

    if dscr.is_below(dec!(1.2)) {
        warnings.push(format!(
            "DSCR of {dscr} is below 1.20x — lender covenant risk"
        ));
    }
    if sde <= Decimal::ZERO && terms.annual_revenue > Decimal::ZERO {
        warnings.push("SDE is non-positive — the business does not cover its own costs".into());
    }

    BusinessMetrics {
        ebitda,
        sde,
        sde_margin,
        gross_margin,
        break_even_revenue,
        revenue_multiple,
        sde_multiple,
        monthly_debt_service,
        annual_debt_service,
        annual_cash_flow,
        total_cash_invested,
        cash_on_cash,
        dscr,
        five_year_roi,
    }
}

/// Five-year hold: SDE-based cash flows, exit at the entry SDE multiple
/// on year-5 SDE, less the loan payoff.
fn hold_period_roi(
    terms: &BusinessTerms,
    financing: &FinancingTerms,
    annual_debt_service: Money,
    total_cash_invested: Money,
    entry_sde_multiple: Multiple,
) -> Rate {
    if total_cash_invested <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut total_cf = Decimal::ZERO;
    for year in 1..=HOLD_YEARS {
        total_cf += biz_sde_in_year(terms, year) - annual_debt_service;
    }

    let exit_value = biz_sde_in_year(terms, HOLD_YEARS) * entry_sde_multiple;
    let loan_payoff = loan_balance_after(
        financing.loan_amount,
        financing.interest_rate,
        financing.amortization_years,
        HOLD_YEARS * 12,
    );
    let net_exit = exit_value - loan_payoff;

    (total_cf + net_exit - total_cash_invested) / total_cash_invested
}
