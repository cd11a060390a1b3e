use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::projection::{biz_ebitda_in_year, hybrid_noi_in_year};
use super::{HOLD_YEARS, SELLING_COST_RATE};
use crate::deal::{FinancingTerms, HybridTerms};
use crate::time_value::{irr, loan_balance_after, monthly_payment};
use crate::types::{Extended, Money, Multiple, Rate};

/// Allocation drift beyond this share of price is surfaced as a warning.
pub(crate) const ALLOCATION_TOLERANCE: Decimal = dec!(0.05);

/// Derived metrics for a property-plus-business transaction. The two
/// sides are computed independently, then combined NOI (property NOI +
/// business EBITDA) drives coverage and cash flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridMetrics {
    pub property_noi: Money,
    /// Property NOI / property-value allocation; 0 when unallocated
    pub property_cap_rate: Rate,
    pub business_ebitda: Money,
    pub business_sde: Money,
    pub sde_margin: Rate,
    pub combined_noi: Money,
    /// Business-value allocation / revenue, not the full price
    pub revenue_multiple: Multiple,
    /// Business-value allocation / SDE, not the full price
    pub sde_multiple: Multiple,
    pub monthly_debt_service: Money,
    pub annual_debt_service: Money,
    pub annual_cash_flow: Money,
    pub total_cash_invested: Money,
    pub cash_on_cash: Rate,
    /// Combined NOI / annual debt service; unbounded with no debt
    pub dscr: Extended,
    pub five_year_roi: Rate,
    pub irr: Rate,
    /// |property + business allocation − purchase price|
    pub allocation_gap: Money,
}

pub fn hybrid_metrics(
    terms: &HybridTerms,
    financing: &FinancingTerms,
    warnings: &mut Vec<String>,
) -> HybridMetrics {
    // Property side
    let gross_income = (terms.monthly_rent + terms.other_monthly_income) * dec!(12);
    let egi = gross_income * (Decimal::ONE - terms.vacancy_rate);
    let property_opex = terms.property_expenses.monthly_total() * dec!(12) + egi * terms.management_rate;
    let property_noi = egi - property_opex;
    let property_cap_rate = if terms.property_value <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        property_noi / terms.property_value
    };

    // Business side
    let business_ebitda = terms.annual_revenue - terms.cost_of_goods - terms.operating_expenses
        + terms.add_backs.ebitda_total();
    let business_sde = business_ebitda + terms.owner_salary + terms.add_backs.other;
    let sde_margin = if terms.annual_revenue <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        business_sde / terms.annual_revenue
    };

    let combined_noi = property_noi + business_ebitda;

    // Multiples are computed against the business allocation only.
    let revenue_multiple = if terms.annual_revenue <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        terms.business_value / terms.annual_revenue
    };
    let sde_multiple = if business_sde <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        terms.business_value / business_sde
    };

    let monthly_debt_service = monthly_payment(
        financing.loan_amount,
        financing.interest_rate,
        financing.amortization_years,
    );
    let annual_debt_service = monthly_debt_service * dec!(12);
    let annual_cash_flow = combined_noi - annual_debt_service;

    let down_payment = (terms.purchase_price - financing.loan_amount).max(Decimal::ZERO);
    let total_cash_invested = down_payment + terms.closing_costs;
    let cash_on_cash = if total_cash_invested <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        annual_cash_flow / total_cash_invested
    };

    let dscr = if annual_debt_service.is_zero() {
        Extended::Infinite
    } else {
        Extended::Finite(combined_noi / annual_debt_service)
    };

    let allocation_gap = (terms.property_value + terms.business_value - terms.purchase_price).abs();
    if terms.purchase_price > Decimal::ZERO
        && allocation_gap > terms.purchase_price * ALLOCATION_TOLERANCE
    {
        warnings.push(format!(
            "Property/business allocation differs from purchase price by {allocation_gap} — \
             review the split before relying on per-side multiples"
        ));
    }

    let (five_year_roi, irr) = hold_period_returns(
        terms,
        financing,
        annual_debt_service,
        total_cash_invested,
        sde_multiple,
        warnings,
    );

    if dscr.is_below(dec!(1.2)) {
        warnings.push(format!(
            "DSCR of {dscr} is below 1.20x — lender covenant risk"
        ));
    }

    HybridMetrics {
        property_noi,
        property_cap_rate,
        business_ebitda,
        business_sde,
        sde_margin,
        combined_noi,
        revenue_multiple,
        sde_multiple,
        monthly_debt_service,
        annual_debt_service,
        annual_cash_flow,
        total_cash_invested,
        cash_on_cash,
        dscr,
        five_year_roi,
        irr,
        allocation_gap,
    }
}

/// Five-year hold: combined cash flows, property exit at the appreciated
/// allocation net of selling costs, business exit at the entry multiple.
fn hold_period_returns(
    terms: &HybridTerms,
    financing: &FinancingTerms,
    annual_debt_service: Money,
    total_cash_invested: Money,
    entry_sde_multiple: Multiple,
    warnings: &mut Vec<String>,
) -> (Rate, Rate) {
    if total_cash_invested <= Decimal::ZERO {
        return (Decimal::ZERO, Decimal::ZERO);
    }

    let mut cash_flows = Vec::with_capacity(HOLD_YEARS as usize + 1);
    cash_flows.push(-total_cash_invested);
    let mut total_cf = Decimal::ZERO;
    for year in 1..=HOLD_YEARS {
        let cf = hybrid_noi_in_year(terms, year) - annual_debt_service;
        total_cf += cf;
        cash_flows.push(cf);
    }

    let mut property_exit = terms.property_value;
    for _ in 0..HOLD_YEARS {
        property_exit *= Decimal::ONE + terms.appreciation_rate;
    }
    property_exit *= Decimal::ONE - SELLING_COST_RATE;

    let business_terms = crate::deal::BusinessTerms {
        asking_price: terms.business_value,
        closing_costs: Decimal::ZERO,
        annual_revenue: terms.annual_revenue,
        cost_of_goods: terms.cost_of_goods,
        operating_expenses: terms.operating_expenses,
        owner_salary: terms.owner_salary,
        add_backs: terms.add_backs.clone(),
        revenue_growth: terms.revenue_growth,
        expense_growth: terms.business_expense_growth,
    };
    let business_exit =
        (biz_ebitda_in_year(&business_terms, HOLD_YEARS) + terms.owner_salary + terms.add_backs.other)
            * entry_sde_multiple;

    let loan_payoff = loan_balance_after(
        financing.loan_amount,
        financing.interest_rate,
        financing.amortization_years,
        HOLD_YEARS * 12,
    );
    let net_exit = property_exit + business_exit - loan_payoff;

    if let Some(last) = cash_flows.last_mut() {
        *last += net_exit;
    }

    let roi = (total_cf + net_exit - total_cash_invested) / total_cash_invested;
    let irr_rate = irr(&cash_flows, warnings);

    (roi, irr_rate)
}
