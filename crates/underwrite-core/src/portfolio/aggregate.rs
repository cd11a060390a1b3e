use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::deal::Deal;
use crate::metrics::deal_metrics;
use crate::scoring::score_from_metrics;
use crate::types::{with_metadata, ComputationOutput, Extended, Money, Rate};
use crate::UnderwriteResult;

/// One deal's line in the portfolio view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealSummary {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub purchase_price: Money,
    pub total_cash_invested: Money,
    pub annual_cash_flow: Money,
    pub cash_on_cash: Rate,
    pub five_year_roi: Rate,
    pub score: Decimal,
    pub dscr: Extended,
    pub loan_amount: Money,
    pub annual_debt_service: Money,
}

/// Portfolio roll-up. Return rates are weighted by cash invested, so a
/// small high-yield deal cannot mask a large mediocre one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    /// Sorted best score first
    pub deals: Vec<DealSummary>,
    pub deal_count: usize,
    pub total_value: Money,
    pub total_cash_invested: Money,
    pub total_annual_cash_flow: Money,
    pub total_debt: Money,
    pub total_annual_debt_service: Money,
    pub total_equity: Money,
    /// Total debt / total value; 0 for an empty or unlevered book
    pub portfolio_ltv: Rate,
    pub weighted_cash_on_cash: Rate,
    pub weighted_roi: Rate,
    pub average_score: Decimal,
}

/// Score and aggregate a set of deals. An empty slice yields an empty,
/// all-zero portfolio rather than an error.
pub fn analyze_portfolio(deals: &[Deal]) -> UnderwriteResult<ComputationOutput<PortfolioMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut summaries = Vec::with_capacity(deals.len());
    for deal in deals {
        let mut deal_warnings = Vec::new();
        let metrics = deal_metrics(deal, &mut deal_warnings);
        let score = score_from_metrics(deal, &metrics)?;
        for w in deal_warnings {
            warnings.push(format!("{}: {w}", deal.name));
        }

        summaries.push(DealSummary {
            id: deal.id.clone(),
            name: deal.name.clone(),
            kind: deal.kind_name().to_string(),
            purchase_price: deal.purchase_price(),
            total_cash_invested: metrics.total_cash_invested(),
            annual_cash_flow: metrics.annual_cash_flow(),
            cash_on_cash: metrics.cash_on_cash(),
            five_year_roi: metrics.five_year_roi(),
            score: score.total,
            dscr: metrics.dscr(),
            loan_amount: deal.financing.loan_amount,
            annual_debt_service: metrics.annual_debt_service(),
        });
    }

    summaries.sort_by(|a, b| b.score.cmp(&a.score));

    let total_value: Money = summaries.iter().map(|s| s.purchase_price).sum();
    let total_cash_invested: Money = summaries.iter().map(|s| s.total_cash_invested).sum();
    let total_annual_cash_flow: Money = summaries.iter().map(|s| s.annual_cash_flow).sum();
    let total_debt: Money = summaries.iter().map(|s| s.loan_amount).sum();
    let total_annual_debt_service: Money =
        summaries.iter().map(|s| s.annual_debt_service).sum();

    let portfolio_ltv = if total_value.is_zero() {
        Decimal::ZERO
    } else {
        total_debt / total_value
    };

    let (weighted_cash_on_cash, weighted_roi) = if total_cash_invested.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let coc: Decimal = summaries
            .iter()
            .map(|s| s.cash_on_cash * s.total_cash_invested)
            .sum();
        let roi: Decimal = summaries
            .iter()
            .map(|s| s.five_year_roi * s.total_cash_invested)
            .sum();
        (coc / total_cash_invested, roi / total_cash_invested)
    };

    let average_score = if summaries.is_empty() {
        Decimal::ZERO
    } else {
        let sum: Decimal = summaries.iter().map(|s| s.score).sum();
        sum / Decimal::from(summaries.len() as u64)
    };

    let portfolio = PortfolioMetrics {
        deal_count: summaries.len(),
        deals: summaries,
        total_value,
        total_cash_invested,
        total_annual_cash_flow,
        total_debt,
        total_annual_debt_service,
        total_equity: total_value - total_debt,
        portfolio_ltv,
        weighted_cash_on_cash,
        weighted_roi,
        average_score,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio Aggregation",
        &serde_json::json!({ "deal_count": portfolio.deal_count }),
        warnings,
        elapsed,
        portfolio,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{
        AddBacks, BusinessTerms, DealKind, FinancingTerms, LoanType, OperatingExpenses,
        RealEstateTerms,
    };
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn rental(id: &str, rent: Decimal) -> Deal {
        Deal {
            id: id.into(),
            name: format!("Rental {id}"),
            kind: DealKind::RealEstate(RealEstateTerms {
                purchase_price: dec!(250000),
                closing_costs: dec!(5000),
                rehab_costs: Decimal::ZERO,
                monthly_rent: rent,
                other_monthly_income: Decimal::ZERO,
                vacancy_rate: dec!(0.05),
                expenses: OperatingExpenses {
                    other: dec!(600),
                    ..OperatingExpenses::default()
                },
                management_rate: Decimal::ZERO,
                rent_growth: dec!(0.03),
                expense_growth: dec!(0.02),
                appreciation_rate: dec!(0.03),
            }),
            financing: FinancingTerms {
                loan_type: LoanType::Conventional,
                loan_amount: dec!(187500),
                down_payment_rate: dec!(0.25),
                interest_rate: dec!(0.07),
                loan_term_years: 30,
                amortization_years: 30,
            },
            scenarios: Vec::new(),
        }
    }

    fn laundromat() -> Deal {
        Deal {
            id: "b-1".into(),
            name: "Spin City".into(),
            kind: DealKind::Business(BusinessTerms {
                asking_price: dec!(450000),
                closing_costs: dec!(15000),
                annual_revenue: dec!(600000),
                cost_of_goods: dec!(180000),
                operating_expenses: dec!(270000),
                owner_salary: dec!(60000),
                add_backs: AddBacks {
                    depreciation: dec!(20000),
                    amortization: dec!(5000),
                    interest: dec!(8000),
                    taxes: dec!(12000),
                    other: dec!(5000),
                },
                revenue_growth: dec!(0.03),
                expense_growth: dec!(0.02),
            }),
            financing: FinancingTerms {
                loan_type: LoanType::Sba7a,
                loan_amount: dec!(360000),
                down_payment_rate: dec!(0.20),
                interest_rate: dec!(0.105),
                loan_term_years: 10,
                amortization_years: 10,
            },
            scenarios: Vec::new(),
        }
    }

    #[test]
    fn test_empty_portfolio_is_all_zeros() {
        let portfolio = analyze_portfolio(&[]).unwrap().result;
        assert_eq!(portfolio.deal_count, 0);
        assert_eq!(portfolio.total_value, Decimal::ZERO);
        assert_eq!(portfolio.portfolio_ltv, Decimal::ZERO);
        assert_eq!(portfolio.weighted_cash_on_cash, Decimal::ZERO);
        assert_eq!(portfolio.average_score, Decimal::ZERO);
    }

    #[test]
    fn test_totals_are_sums_across_kinds() {
        let deals = vec![rental("r-1", dec!(2400)), laundromat()];
        let portfolio = analyze_portfolio(&deals).unwrap().result;

        assert_eq!(portfolio.deal_count, 2);
        assert_eq!(portfolio.total_value, dec!(700000));
        assert_eq!(portfolio.total_debt, dec!(547500));
        assert_eq!(portfolio.total_equity, dec!(152500));
        assert_eq!(portfolio.portfolio_ltv, dec!(547500) / dec!(700000));
        assert_eq!(
            portfolio.total_annual_cash_flow,
            portfolio.deals.iter().map(|d| d.annual_cash_flow).sum()
        );
    }

    #[test]
    fn test_single_deal_portfolio_mirrors_its_summary() {
        let portfolio = analyze_portfolio(&[laundromat()]).unwrap().result;
        assert_eq!(portfolio.deal_count, 1);
        let only = &portfolio.deals[0];

        assert_eq!(portfolio.total_value, only.purchase_price);
        assert_eq!(portfolio.total_cash_invested, only.total_cash_invested);
        assert_eq!(portfolio.total_annual_cash_flow, only.annual_cash_flow);
        assert_eq!(portfolio.total_debt, only.loan_amount);
        assert_eq!(
            portfolio.total_annual_debt_service,
            only.annual_debt_service
        );
        assert_eq!(
            portfolio.total_equity,
            only.purchase_price - only.loan_amount
        );
        assert_eq!(portfolio.weighted_cash_on_cash, only.cash_on_cash);
        assert_eq!(portfolio.weighted_roi, only.five_year_roi);
        assert_eq!(portfolio.average_score, only.score);
    }

    #[test]
    fn test_deals_sorted_by_score_descending() {
        // Same building, very different rents.
        let deals = vec![rental("weak", dec!(1500)), rental("strong", dec!(3200))];
        let portfolio = analyze_portfolio(&deals).unwrap().result;

        assert_eq!(portfolio.deals[0].id, "strong");
        assert!(portfolio.deals[0].score >= portfolio.deals[1].score);
    }

    #[test]
    fn test_weighting_by_cash_invested() {
        let deals = vec![rental("r-1", dec!(2400)), laundromat()];
        let portfolio = analyze_portfolio(&deals).unwrap().result;

        let expected: Decimal = portfolio
            .deals
            .iter()
            .map(|d| d.cash_on_cash * d.total_cash_invested)
            .sum::<Decimal>()
            / portfolio.total_cash_invested;
        assert_eq!(portfolio.weighted_cash_on_cash, expected);
    }

    #[test]
    fn test_average_score_is_unweighted() {
        let deals = vec![rental("a", dec!(2400)), rental("b", dec!(2400))];
        let portfolio = analyze_portfolio(&deals).unwrap().result;
        assert_eq!(portfolio.average_score, portfolio.deals[0].score);
    }
}
