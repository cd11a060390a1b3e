use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::deal::{BusinessTerms, Deal, DealKind, HybridTerms, RealEstateTerms};
use crate::time_value::monthly_payment;
use crate::types::Money;

const MONTHS: Decimal = dec!(12);
const DEFAULT_HORIZON: u32 = 10;

// ---------------------------------------------------------------------------
// Year-indexed income projection (year 1 = the base snapshot)
// ---------------------------------------------------------------------------

fn compounded(base: Money, rate: Decimal, years_of_growth: u32) -> Money {
    let mut value = base;
    for _ in 0..years_of_growth {
        value *= Decimal::ONE + rate;
    }
    value
}

/// Property NOI in a given year, compounding rent and expense growth.
pub(crate) fn re_noi_in_year(t: &RealEstateTerms, year: u32) -> Money {
    let growth_years = year.saturating_sub(1);
    let rent = compounded(t.monthly_rent + t.other_monthly_income, t.rent_growth, growth_years);
    let egi = rent * MONTHS * (Decimal::ONE - t.vacancy_rate);
    let fixed = compounded(t.expenses.monthly_total(), t.expense_growth, growth_years) * MONTHS;
    egi - egi * t.management_rate - fixed
}

/// Business SDE in a given year. COGS tracks revenue to hold the gross
/// margin; operating expenses compound on their own growth rate;
/// add-backs reflect the current P&L and stay flat.
pub(crate) fn biz_sde_in_year(t: &BusinessTerms, year: u32) -> Money {
    let growth_years = year.saturating_sub(1);
    let revenue = compounded(t.annual_revenue, t.revenue_growth, growth_years);
    let cogs = compounded(t.cost_of_goods, t.revenue_growth, growth_years);
    let opex = compounded(t.operating_expenses, t.expense_growth, growth_years);
    let ebitda = revenue - cogs - opex + t.add_backs.ebitda_total();
    ebitda + t.owner_salary + t.add_backs.other
}

pub(crate) fn biz_ebitda_in_year(t: &BusinessTerms, year: u32) -> Money {
    biz_sde_in_year(t, year) - t.owner_salary - t.add_backs.other
}

/// Combined hybrid income: property NOI plus business EBITDA, each side
/// compounding on its own growth rates.
pub(crate) fn hybrid_noi_in_year(t: &HybridTerms, year: u32) -> Money {
    let growth_years = year.saturating_sub(1);

    let rent = compounded(t.monthly_rent + t.other_monthly_income, t.rent_growth, growth_years);
    let egi = rent * MONTHS * (Decimal::ONE - t.vacancy_rate);
    let fixed = compounded(
        t.property_expenses.monthly_total(),
        t.property_expense_growth,
        growth_years,
    ) * MONTHS;
    let property_noi = egi - egi * t.management_rate - fixed;

    let revenue = compounded(t.annual_revenue, t.revenue_growth, growth_years);
    let cogs = compounded(t.cost_of_goods, t.revenue_growth, growth_years);
    let opex = compounded(t.operating_expenses, t.business_expense_growth, growth_years);
    let ebitda = revenue - cogs - opex + t.add_backs.ebitda_total();

    property_noi + ebitda
}

fn income_in_year(deal: &Deal, year: u32) -> Money {
    match &deal.kind {
        DealKind::RealEstate(t) => re_noi_in_year(t, year),
        DealKind::Business(t) => biz_sde_in_year(t, year),
        DealKind::Hybrid(t) => hybrid_noi_in_year(t, year),
    }
}

// ---------------------------------------------------------------------------
// Cash-flow projection iterator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCashFlow {
    pub year: u32,
    /// Pre-debt income for the year (NOI, SDE, or combined NOI by kind)
    pub noi: Money,
    pub cash_flow: Money,
    pub cumulative_cash_flow: Money,
}

/// A lazy, finite, restartable projection of annual cash flows. Each call
/// to `cash_flow_projection` starts from the deal snapshot; nothing is
/// memoized across calls.
#[derive(Debug, Clone)]
pub struct CashFlowProjection {
    deal: Deal,
    annual_debt_service: Money,
    horizon: u32,
    year: u32,
    cumulative: Money,
}

impl Iterator for CashFlowProjection {
    type Item = YearCashFlow;

    fn next(&mut self) -> Option<YearCashFlow> {
        if self.year >= self.horizon {
            return None;
        }
        self.year += 1;

        let noi = income_in_year(&self.deal, self.year);
        let cash_flow = noi - self.annual_debt_service;
        self.cumulative += cash_flow;

        Some(YearCashFlow {
            year: self.year,
            noi,
            cash_flow,
            cumulative_cash_flow: self.cumulative,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.horizon - self.year) as usize;
        (remaining, Some(remaining))
    }
}

/// Project annual cash flows over `horizon` years (default 10).
pub fn cash_flow_projection(deal: &Deal, horizon: Option<u32>) -> CashFlowProjection {
    let f = &deal.financing;
    let annual_debt_service =
        monthly_payment(f.loan_amount, f.interest_rate, f.amortization_years) * MONTHS;
    CashFlowProjection {
        deal: deal.clone(),
        annual_debt_service,
        horizon: horizon.unwrap_or(DEFAULT_HORIZON),
        year: 0,
        cumulative: Decimal::ZERO,
    }
}
