use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::valuation::{fair_value, ValuationRange};
use crate::amortization::{max_supportable_loan, max_supportable_price};
use crate::deal::{Deal, DealKind, MarketAssumptions};
use crate::metrics::{deal_metrics, DealMetrics};
use crate::scoring::score_from_metrics;
use crate::stress::{apply_recession, RecessionOverrides};
use crate::types::{with_metadata, ComputationOutput, Extended, Money, Rate};
use crate::UnderwriteResult;

/// Price deltas walked by the ladder, as fractions of the asking price.
const LADDER_DELTAS: [Decimal; 7] = [
    dec!(-0.20),
    dec!(-0.15),
    dec!(-0.10),
    dec!(-0.05),
    dec!(0),
    dec!(0.05),
    dec!(0.10),
];

/// Where the asking price sits against fair value and against what the
/// income can actually finance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceGap {
    pub asking_price: Money,
    pub fair_value_midpoint: Money,
    /// Highest price the income finances at the target DSCR; unbounded
    /// for an all-cash structure
    pub max_supportable_price: Extended,
    /// Positive when the seller is asking above fair value
    pub gap_to_fair: Money,
    pub gap_to_fair_pct: Rate,
    pub suggested_offer_low: Money,
    pub suggested_offer_high: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointCategory {
    Risk,
    Valuation,
    Market,
    Financial,
}

/// One argument to bring to the table, ranked by impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationPoint {
    pub category: PointCategory,
    pub impact: Impact,
    pub point: String,
}

/// Base case against the recession case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressComparison {
    pub base_score: Decimal,
    pub stressed_score: Decimal,
    pub score_drop: Decimal,
    pub base_cash_flow: Money,
    pub stressed_cash_flow: Money,
    pub cash_flow_drop: Money,
}

/// One rung of the what-if price ladder. Loan size is rescaled to hold
/// the down-payment percentage constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLadderRung {
    pub price: Money,
    pub delta_rate: Rate,
    pub annual_cash_flow: Money,
    pub dscr: Extended,
    pub cash_on_cash: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationAnalysis {
    pub valuation: ValuationRange,
    pub price_gap: PriceGap,
    pub stress: StressComparison,
    pub price_ladder: Vec<PriceLadderRung>,
    pub talking_points: Vec<NegotiationPoint>,
}

/// Full negotiation prep for one deal: fair-value band, price gap and
/// offer range, recession comparison, price ladder, and ranked talking
/// points.
pub fn analyze_negotiation(
    deal: &Deal,
    assumptions: &MarketAssumptions,
    overrides: &RecessionOverrides,
) -> UnderwriteResult<ComputationOutput<NegotiationAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let metrics = deal_metrics(deal, &mut warnings);
    let valuation = fair_value(deal, &metrics, assumptions);
    let price_gap = price_gap(deal, &metrics, &valuation, assumptions);
    let stress = stress_comparison(deal, &metrics, overrides)?;
    let price_ladder = build_price_ladder(deal);
    let talking_points = talking_points(deal, &metrics, &price_gap, &stress, assumptions);

    let analysis = NegotiationAnalysis {
        valuation,
        price_gap,
        stress,
        price_ladder,
        talking_points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Negotiation Analysis",
        &serde_json::json!({
            "deal_kind": deal.kind_name(),
            "target_dscr": assumptions.target_dscr,
            "ladder_deltas": LADDER_DELTAS,
        }),
        warnings,
        elapsed,
        analysis,
    ))
}

fn price_gap(
    deal: &Deal,
    metrics: &DealMetrics,
    valuation: &ValuationRange,
    assumptions: &MarketAssumptions,
) -> PriceGap {
    let asking_price = deal.purchase_price();

    let max_price = if deal.financing.loan_amount <= Decimal::ZERO {
        // A cash buyer is not DSCR-constrained.
        Extended::Infinite
    } else {
        let max_loan = max_supportable_loan(
            metrics.coverage_income(),
            assumptions.target_dscr,
            deal.financing.interest_rate,
            deal.financing.amortization_years,
        );
        max_supportable_price(max_loan, deal.financing.down_payment_rate)
    };

    let gap_to_fair = asking_price - valuation.midpoint;
    let gap_to_fair_pct = if valuation.midpoint.is_zero() {
        Decimal::ZERO
    } else {
        gap_to_fair / valuation.midpoint
    };

    PriceGap {
        asking_price,
        fair_value_midpoint: valuation.midpoint,
        max_supportable_price: max_price,
        gap_to_fair,
        gap_to_fair_pct,
        suggested_offer_low: valuation.low,
        suggested_offer_high: (valuation.low + valuation.midpoint) / dec!(2),
    }
}

fn stress_comparison(
    deal: &Deal,
    base_metrics: &DealMetrics,
    overrides: &RecessionOverrides,
) -> UnderwriteResult<StressComparison> {
    let base_score = score_from_metrics(deal, base_metrics)?;

    let stressed_deal = apply_recession(deal, overrides);
    let mut stressed_warnings = Vec::new();
    let stressed_metrics = deal_metrics(&stressed_deal, &mut stressed_warnings);
    let stressed_score = score_from_metrics(&stressed_deal, &stressed_metrics)?;

    Ok(StressComparison {
        base_score: base_score.total,
        stressed_score: stressed_score.total,
        score_drop: base_score.total - stressed_score.total,
        base_cash_flow: base_metrics.annual_cash_flow(),
        stressed_cash_flow: stressed_metrics.annual_cash_flow(),
        cash_flow_drop: base_metrics.annual_cash_flow() - stressed_metrics.annual_cash_flow(),
    })
}

fn build_price_ladder(deal: &Deal) -> Vec<PriceLadderRung> {
    let asking_price = deal.purchase_price();
    let financed = deal.financing.loan_amount > Decimal::ZERO;

    LADDER_DELTAS
        .iter()
        .map(|delta| {
            let price = asking_price * (Decimal::ONE + delta);
            let mut repriced = deal.clone();
            reprice(&mut repriced, price);
            if financed {
                repriced.financing.loan_amount =
                    price * (Decimal::ONE - deal.financing.down_payment_rate);
            }

            let mut rung_warnings = Vec::new();
            let metrics = deal_metrics(&repriced, &mut rung_warnings);

            PriceLadderRung {
                price,
                delta_rate: *delta,
                annual_cash_flow: metrics.annual_cash_flow(),
                dscr: metrics.dscr(),
                cash_on_cash: metrics.cash_on_cash(),
            }
        })
        .collect()
}

/// Move a deal to a new price. Hybrid allocations scale proportionally
/// so the property/business split survives the reprice.
fn reprice(deal: &mut Deal, price: Money) {
    let old_price = deal.purchase_price();
    match &mut deal.kind {
        DealKind::RealEstate(t) => t.purchase_price = price,
        DealKind::Business(t) => t.asking_price = price,
        DealKind::Hybrid(t) => {
            if old_price > Decimal::ZERO {
                let ratio = price / old_price;
                t.property_value *= ratio;
                t.business_value *= ratio;
            }
            t.purchase_price = price;
        }
    }
}

fn talking_points(
    deal: &Deal,
    metrics: &DealMetrics,
    gap: &PriceGap,
    stress: &StressComparison,
    assumptions: &MarketAssumptions,
) -> Vec<NegotiationPoint> {
    let mut points = Vec::new();

    if gap.fair_value_midpoint > Decimal::ZERO && gap.gap_to_fair > Decimal::ZERO {
        let impact = if gap.gap_to_fair_pct > dec!(0.10) {
            Impact::High
        } else {
            Impact::Medium
        };
        points.push(NegotiationPoint {
            category: PointCategory::Valuation,
            impact,
            point: format!(
                "Asking price is {} ({:.1}%) above the fair-value midpoint of {}",
                gap.gap_to_fair,
                gap.gap_to_fair_pct * dec!(100),
                gap.fair_value_midpoint
            ),
        });
    } else if gap.fair_value_midpoint > Decimal::ZERO && gap.gap_to_fair < Decimal::ZERO {
        points.push(NegotiationPoint {
            category: PointCategory::Valuation,
            impact: Impact::Low,
            point: format!(
                "Asking price is already below the fair-value midpoint of {} — limited room to push",
                gap.fair_value_midpoint
            ),
        });
    }

    if metrics.dscr().is_below(assumptions.target_dscr) {
        let point = match gap.max_supportable_price {
            Extended::Finite(max) => format!(
                "Income covers debt at only {} against a {} target — the numbers support a price near {}",
                metrics.dscr(),
                assumptions.target_dscr,
                max.round()
            ),
            Extended::Infinite => format!(
                "Income covers debt at only {} against a {} target",
                metrics.dscr(),
                assumptions.target_dscr
            ),
        };
        points.push(NegotiationPoint {
            category: PointCategory::Financial,
            impact: Impact::High,
            point,
        });
    }

    if metrics.annual_cash_flow() < Decimal::ZERO {
        points.push(NegotiationPoint {
            category: PointCategory::Financial,
            impact: Impact::High,
            point: format!(
                "The deal loses {} per year at the asking price",
                -metrics.annual_cash_flow()
            ),
        });
    }

    if stress.stressed_cash_flow < Decimal::ZERO && stress.base_cash_flow >= Decimal::ZERO {
        points.push(NegotiationPoint {
            category: PointCategory::Risk,
            impact: Impact::High,
            point: format!(
                "A recession case turns cash flow negative ({} per year) — price in the downside",
                stress.stressed_cash_flow
            ),
        });
    } else if stress.score_drop >= dec!(15) {
        points.push(NegotiationPoint {
            category: PointCategory::Risk,
            impact: Impact::Medium,
            point: format!(
                "The deal score falls {} points under recession assumptions",
                stress.score_drop
            ),
        });
    }

    let vacancy = match &deal.kind {
        DealKind::RealEstate(t) => Some(t.vacancy_rate),
        DealKind::Hybrid(t) => Some(t.vacancy_rate),
        DealKind::Business(_) => None,
    };
    if let Some(v) = vacancy {
        if v < dec!(0.03) {
            points.push(NegotiationPoint {
                category: PointCategory::Market,
                impact: Impact::Medium,
                point: format!(
                    "Underwriting assumes {:.1}% vacancy — challenge the seller's occupancy history",
                    v * dec!(100)
                ),
            });
        }
    }

    if let DealMetrics::Business(m) = metrics {
        if m.sde_margin < dec!(0.15) && m.sde > Decimal::ZERO {
            points.push(NegotiationPoint {
                category: PointCategory::Market,
                impact: Impact::Medium,
                point: format!(
                    "SDE margin of {:.1}% leaves little cushion — ask for seller financing or an earnout",
                    m.sde_margin * dec!(100)
                ),
            });
        }
    }

    points.sort_by_key(|p| p.impact);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{
        AddBacks, BusinessTerms, FinancingTerms, LoanType, OperatingExpenses, RealEstateTerms,
    };
    use pretty_assertions::assert_eq;

    fn overpriced_rental() -> Deal {
        Deal {
            id: "r-1".into(),
            name: "Overpriced Duplex".into(),
            kind: DealKind::RealEstate(RealEstateTerms {
                purchase_price: dec!(400000),
                closing_costs: dec!(8000),
                rehab_costs: Decimal::ZERO,
                monthly_rent: dec!(2400),
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
                loan_amount: dec!(300000),
                down_payment_rate: dec!(0.25),
                interest_rate: dec!(0.07),
                loan_term_years: 30,
                amortization_years: 30,
            },
            scenarios: Vec::new(),
        }
    }

    fn analysis_for(deal: &Deal) -> NegotiationAnalysis {
        analyze_negotiation(
            deal,
            &MarketAssumptions::default(),
            &RecessionOverrides::default(),
        )
        .unwrap()
        .result
    }

    #[test]
    fn test_price_gap_for_overpriced_deal() {
        let analysis = analysis_for(&overpriced_rental());
        let gap = &analysis.price_gap;

        assert_eq!(gap.asking_price, dec!(400000));
        assert!(gap.gap_to_fair > Decimal::ZERO);
        assert!(gap.suggested_offer_low <= gap.suggested_offer_high);
        assert!(gap.suggested_offer_high < gap.asking_price);
    }

    #[test]
    fn test_max_supportable_price_reflects_target_dscr() {
        let analysis = analysis_for(&overpriced_rental());
        // NOI ≈ 20,160; at 1.25x, 7%/30yr the max loan is far below 300k.
        let max = analysis.price_gap.max_supportable_price.finite().unwrap();
        assert!(max < dec!(400000), "max {max}");
        assert!(max > dec!(100000), "max {max}");
    }

    #[test]
    fn test_cash_deal_is_unconstrained() {
        let mut deal = overpriced_rental();
        deal.financing.loan_amount = Decimal::ZERO;
        deal.financing.loan_type = LoanType::Cash;
        let analysis = analysis_for(&deal);
        assert_eq!(
            analysis.price_gap.max_supportable_price,
            Extended::Infinite
        );
    }

    #[test]
    fn test_ladder_shape_and_monotonic_cash_flow() {
        let deal = overpriced_rental();
        let analysis = analysis_for(&deal);
        let ladder = &analysis.price_ladder;

        assert_eq!(ladder.len(), 7);
        assert_eq!(ladder[0].price, dec!(320000.00));
        assert_eq!(ladder[4].price, dec!(400000));
        assert_eq!(ladder[4].delta_rate, Decimal::ZERO);

        // A cheaper price (smaller loan) always cash-flows better.
        for pair in ladder.windows(2) {
            assert!(pair[0].annual_cash_flow > pair[1].annual_cash_flow);
        }
    }

    #[test]
    fn test_talking_points_ranked_high_first() {
        let analysis = analysis_for(&overpriced_rental());
        let points = &analysis.talking_points;
        assert!(!points.is_empty());
        for pair in points.windows(2) {
            assert!(pair[0].impact <= pair[1].impact);
        }
        // The weak coverage on an overpriced, leveraged deal must surface.
        assert!(points
            .iter()
            .any(|p| p.category == PointCategory::Financial && p.impact == Impact::High));
    }

    #[test]
    fn test_stress_comparison_degrades() {
        let analysis = analysis_for(&overpriced_rental());
        assert!(analysis.stress.stressed_score <= analysis.stress.base_score);
        assert!(analysis.stress.stressed_cash_flow < analysis.stress.base_cash_flow);
    }

    #[test]
    fn test_business_earnout_point() {
        let deal = Deal {
            id: "b-1".into(),
            name: "Thin Margin Cafe".into(),
            kind: DealKind::Business(BusinessTerms {
                asking_price: dec!(300000),
                closing_costs: dec!(10000),
                annual_revenue: dec!(700000),
                cost_of_goods: dec!(280000),
                operating_expenses: dec!(350000),
                owner_salary: dec!(10000),
                add_backs: AddBacks::default(),
                revenue_growth: dec!(0.02),
                expense_growth: dec!(0.02),
            }),
            financing: FinancingTerms {
                loan_type: LoanType::Sba7a,
                loan_amount: dec!(240000),
                down_payment_rate: dec!(0.20),
                interest_rate: dec!(0.105),
                loan_term_years: 10,
                amortization_years: 10,
            },
            scenarios: Vec::new(),
        };
        let analysis = analysis_for(&deal);
        // SDE = 700k - 280k - 350k + 10k = 80k → 11.4% margin
        assert!(analysis
            .talking_points
            .iter()
            .any(|p| p.point.contains("earnout") || p.point.contains("seller financing")));
    }
}
