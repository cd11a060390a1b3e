mod business;
mod hybrid;
mod projection;
mod real_estate;

pub use business::{business_metrics, BusinessMetrics};
pub use hybrid::{hybrid_metrics, HybridMetrics};
pub use projection::{cash_flow_projection, CashFlowProjection, YearCashFlow};
pub use real_estate::{real_estate_metrics, RealEstateMetrics};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::deal::{Deal, DealKind};
use crate::error::UnderwriteError;
use crate::types::{with_metadata, ComputationOutput, Extended, Money, Rate};
use crate::UnderwriteResult;

/// Default hold period for ROI/IRR projections.
pub(crate) const HOLD_YEARS: u32 = 5;
/// Flat selling-cost haircut applied to property exits.
pub(crate) const SELLING_COST_RATE: Decimal = dec!(0.06);

/// One metrics record per deal kind. Derived, immutable, recomputed on
/// every call — inputs may have been overridden for a scenario or a
/// sensitivity step, so nothing is cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DealMetrics {
    RealEstate(RealEstateMetrics),
    Business(BusinessMetrics),
    Hybrid(HybridMetrics),
}

impl DealMetrics {
    pub fn annual_cash_flow(&self) -> Money {
        match self {
            DealMetrics::RealEstate(m) => m.annual_cash_flow,
            DealMetrics::Business(m) => m.annual_cash_flow,
            DealMetrics::Hybrid(m) => m.annual_cash_flow,
        }
    }

    pub fn annual_debt_service(&self) -> Money {
        match self {
            DealMetrics::RealEstate(m) => m.annual_debt_service,
            DealMetrics::Business(m) => m.annual_debt_service,
            DealMetrics::Hybrid(m) => m.annual_debt_service,
        }
    }

    pub fn total_cash_invested(&self) -> Money {
        match self {
            DealMetrics::RealEstate(m) => m.total_cash_invested,
            DealMetrics::Business(m) => m.total_cash_invested,
            DealMetrics::Hybrid(m) => m.total_cash_invested,
        }
    }

    pub fn cash_on_cash(&self) -> Rate {
        match self {
            DealMetrics::RealEstate(m) => m.cash_on_cash,
            DealMetrics::Business(m) => m.cash_on_cash,
            DealMetrics::Hybrid(m) => m.cash_on_cash,
        }
    }

    pub fn dscr(&self) -> Extended {
        match self {
            DealMetrics::RealEstate(m) => m.dscr,
            DealMetrics::Business(m) => m.dscr,
            DealMetrics::Hybrid(m) => m.dscr,
        }
    }

    pub fn five_year_roi(&self) -> Rate {
        match self {
            DealMetrics::RealEstate(m) => m.five_year_roi,
            DealMetrics::Business(m) => m.five_year_roi,
            DealMetrics::Hybrid(m) => m.five_year_roi,
        }
    }

    /// Income the lender counts against debt service: NOI, SDE, or the
    /// hybrid combined NOI.
    pub fn coverage_income(&self) -> Money {
        match self {
            DealMetrics::RealEstate(m) => m.noi,
            DealMetrics::Business(m) => m.sde,
            DealMetrics::Hybrid(m) => m.combined_noi,
        }
    }

    /// Named metric lookup for sensitivity tables. Names outside the
    /// kind's output set return None.
    pub fn metric(&self, name: &str) -> Option<Extended> {
        let finite = Extended::Finite;
        match self {
            DealMetrics::RealEstate(m) => match name {
                "cap_rate" => Some(finite(m.cap_rate)),
                "cash_on_cash" => Some(finite(m.cash_on_cash)),
                "dscr" => Some(m.dscr),
                "noi" => Some(finite(m.noi)),
                "annual_cash_flow" => Some(finite(m.annual_cash_flow)),
                "irr" => Some(finite(m.irr)),
                _ => None,
            },
            DealMetrics::Business(m) => match name {
                "sde_multiple" => Some(finite(m.sde_multiple)),
                "five_year_roi" => Some(finite(m.five_year_roi)),
                "annual_cash_flow" => Some(finite(m.annual_cash_flow)),
                "sde" => Some(finite(m.sde)),
                "break_even_revenue" => Some(m.break_even_revenue),
                "revenue_multiple" => Some(finite(m.revenue_multiple)),
                _ => None,
            },
            DealMetrics::Hybrid(m) => match name {
                "property_cap_rate" => Some(finite(m.property_cap_rate)),
                "cash_on_cash" => Some(finite(m.cash_on_cash)),
                "dscr" => Some(m.dscr),
                "combined_noi" => Some(finite(m.combined_noi)),
                "annual_cash_flow" => Some(finite(m.annual_cash_flow)),
                "irr" => Some(finite(m.irr)),
                "sde_multiple" => Some(finite(m.sde_multiple)),
                "sde" => Some(finite(m.business_sde)),
                "five_year_roi" => Some(finite(m.five_year_roi)),
                _ => None,
            },
        }
    }
}

/// The fixed output-metric set for a deal kind's sensitivity table.
pub fn output_metrics_for(kind: &DealKind) -> &'static [&'static str] {
    match kind {
        DealKind::RealEstate(_) => &[
            "cap_rate",
            "cash_on_cash",
            "dscr",
            "noi",
            "annual_cash_flow",
            "irr",
        ],
        DealKind::Business(_) => &[
            "sde_multiple",
            "five_year_roi",
            "annual_cash_flow",
            "sde",
            "break_even_revenue",
            "revenue_multiple",
        ],
        DealKind::Hybrid(_) => &[
            "property_cap_rate",
            "cash_on_cash",
            "dscr",
            "combined_noi",
            "annual_cash_flow",
            "irr",
            "sde_multiple",
            "sde",
            "five_year_roi",
        ],
    }
}

/// Compute the metrics record for a deal, dispatching on its kind.
/// Degenerate numerics (zero price, zero loan, zero revenue) produce
/// defined results; only structurally invalid input errors.
pub fn compute_metrics(deal: &Deal) -> UnderwriteResult<ComputationOutput<DealMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_deal(deal)?;
    let metrics = deal_metrics(deal, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Acquisition Deal Metrics",
        &serde_json::json!({
            "deal_kind": deal.kind_name(),
            "hold_period_years": HOLD_YEARS,
            "selling_cost_rate": SELLING_COST_RATE,
        }),
        warnings,
        elapsed,
        metrics,
    ))
}

/// Envelope-free variant for callers composing further analysis
/// (scoring, sensitivity, portfolio). Identical math to `compute_metrics`.
pub fn deal_metrics(deal: &Deal, warnings: &mut Vec<String>) -> DealMetrics {
    match &deal.kind {
        DealKind::RealEstate(t) => {
            DealMetrics::RealEstate(real_estate_metrics(t, &deal.financing, warnings))
        }
        DealKind::Business(t) => {
            DealMetrics::Business(business_metrics(t, &deal.financing, warnings))
        }
        DealKind::Hybrid(t) => DealMetrics::Hybrid(hybrid_metrics(t, &deal.financing, warnings)),
    }
}

fn validate_deal(deal: &Deal) -> UnderwriteResult<()> {
    if deal.purchase_price() < Decimal::ZERO {
        return Err(UnderwriteError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Price cannot be negative".into(),
        });
    }

    let vacancy = match &deal.kind {
        DealKind::RealEstate(t) => Some(t.vacancy_rate),
        DealKind::Hybrid(t) => Some(t.vacancy_rate),
        DealKind::Business(_) => None,
    };
    if let Some(v) = vacancy {
        if v < Decimal::ZERO || v > Decimal::ONE {
            return Err(UnderwriteError::InvalidInput {
                field: "vacancy_rate".into(),
                reason: "Vacancy rate must be between 0 and 1".into(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{FinancingTerms, LoanType, OperatingExpenses, RealEstateTerms};
    use pretty_assertions::assert_eq;

    fn rental_deal() -> Deal {
        Deal {
            id: "d-1".into(),
            name: "Maple Duplex".into(),
            kind: DealKind::RealEstate(RealEstateTerms {
                purchase_price: dec!(250000),
                closing_costs: dec!(5000),
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
                loan_amount: dec!(187500),
                down_payment_rate: dec!(0.25),
                interest_rate: dec!(0.07),
                loan_term_years: 30,
                amortization_years: 30,
            },
            scenarios: Vec::new(),
        }
    }

    #[test]
    fn test_dispatch_matches_direct_calculator() {
        let deal = rental_deal();
        let enveloped = compute_metrics(&deal).unwrap();
        let DealMetrics::RealEstate(via_dispatch) = &enveloped.result else {
            panic!("wrong kind");
        };

        let mut warnings = Vec::new();
        let DealKind::RealEstate(terms) = &deal.kind else {
            unreachable!()
        };
        let direct = real_estate_metrics(terms, &deal.financing, &mut warnings);
        assert_eq!(via_dispatch.noi, direct.noi);
        assert_eq!(via_dispatch.dscr, direct.dscr);
    }

    #[test]
    fn test_metric_lookup_covers_output_set() {
        let deal = rental_deal();
        let mut warnings = Vec::new();
        let metrics = deal_metrics(&deal, &mut warnings);

        for name in output_metrics_for(&deal.kind) {
            assert!(metrics.metric(name).is_some(), "missing metric {name}");
        }
        assert!(metrics.metric("sde").is_none());
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let mut deal = rental_deal();
        if let DealKind::RealEstate(t) = &mut deal.kind {
            t.purchase_price = dec!(-1);
        }
        assert!(matches!(
            compute_metrics(&deal),
            Err(UnderwriteError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_vacancy_out_of_range_is_invalid() {
        let mut deal = rental_deal();
        if let DealKind::RealEstate(t) = &mut deal.kind {
            t.vacancy_rate = dec!(1.2);
        }
        assert!(compute_metrics(&deal).is_err());
    }
}
