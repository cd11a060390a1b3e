use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::deal::{Deal, DealKind, MarketAssumptions};
use crate::metrics::DealMetrics;
use crate::types::Money;

/// A low/high fair-value band with its midpoint and the method that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRange {
    pub low: Money,
    pub high: Money,
    pub midpoint: Money,
    pub method: String,
    pub details: String,
}

impl ValuationRange {
    fn new(low: Money, high: Money, method: &str, details: String) -> Self {
        let low = low.max(Decimal::ZERO);
        let high = high.max(low);
        ValuationRange {
            low,
            high,
            midpoint: (low + high) / dec!(2),
            method: method.to_string(),
            details,
        }
    }
}

/// Fair-value band for a deal from its stabilized income and the market
/// assumptions. Larger assets trade at tighter yields and richer
/// multiples, so the bands shift with size.
pub fn fair_value(
    deal: &Deal,
    metrics: &DealMetrics,
    assumptions: &MarketAssumptions,
) -> ValuationRange {
    match (&deal.kind, metrics) {
        (DealKind::RealEstate(_), DealMetrics::RealEstate(m)) => {
            let (cap_low, cap_high) = tiered_cap_band(deal.purchase_price(), assumptions);
            income_capitalization(m.noi, cap_low, cap_high)
        }
        (DealKind::Business(t), DealMetrics::Business(m)) => {
            let (mult_low, mult_high) = tiered_multiple_band(t.annual_revenue, assumptions);
            sde_multiple_band(m.sde, mult_low, mult_high)
        }
        (DealKind::Hybrid(_), DealMetrics::Hybrid(m)) => {
            let (cap_low, cap_high) = tiered_cap_band(deal.purchase_price(), assumptions);
            let property = income_capitalization(m.property_noi, cap_low, cap_high);
            // Real-estate-backed businesses command a modest premium.
            let mult_low = assumptions.sde_multiple_low + dec!(0.5);
            let mult_high = assumptions.sde_multiple_high + dec!(0.5);
            let business = sde_multiple_band(m.business_sde, mult_low, mult_high);

            ValuationRange::new(
                property.low + business.low,
                property.high + business.high,
                "dual-capitalization",
                format!(
                    "Property {} to {} plus business {} to {}",
                    property.low, property.high, business.low, business.high
                ),
            )
        }
        // compute_metrics dispatches on the same kind, so a mismatch
        // cannot arise from the public entry points.
        _ => ValuationRange::new(
            Decimal::ZERO,
            Decimal::ZERO,
            "unmatched",
            "Metrics do not match the deal kind".into(),
        ),
    }
}

/// NOI capitalized across the cap band. The high cap bounds the low
/// value.
fn income_capitalization(noi: Money, cap_low: Decimal, cap_high: Decimal) -> ValuationRange {
    if noi <= Decimal::ZERO || cap_low <= Decimal::ZERO || cap_high <= Decimal::ZERO {
        return ValuationRange::new(
            Decimal::ZERO,
            Decimal::ZERO,
            "income-capitalization",
            "Non-positive NOI supports no income value".into(),
        );
    }
    ValuationRange::new(
        noi / cap_high,
        noi / cap_low,
        "income-capitalization",
        format!(
            "NOI of {noi} capitalized at {:.2}% to {:.2}%",
            cap_low * dec!(100),
            cap_high * dec!(100)
        ),
    )
}

fn sde_multiple_band(sde: Money, mult_low: Decimal, mult_high: Decimal) -> ValuationRange {
    if sde <= Decimal::ZERO {
        return ValuationRange::new(
            Decimal::ZERO,
            Decimal::ZERO,
            "sde-multiple",
            "Non-positive SDE supports no earnings value".into(),
        );
    }
    ValuationRange::new(
        sde * mult_low,
        sde * mult_high,
        "sde-multiple",
        format!("SDE of {sde} at {mult_low}x to {mult_high}x"),
    )
}

/// Institutional-size properties clear at lower cap rates.
fn tiered_cap_band(asking_price: Money, assumptions: &MarketAssumptions) -> (Decimal, Decimal) {
    let adjustment = if asking_price >= dec!(2000000) {
        dec!(0.01)
    } else if asking_price >= dec!(500000) {
        dec!(0.005)
    } else {
        Decimal::ZERO
    };
    (
        (assumptions.cap_rate_low - adjustment).max(dec!(0.01)),
        (assumptions.cap_rate_high - adjustment).max(dec!(0.02)),
    )
}

/// Larger businesses command richer multiples.
fn tiered_multiple_band(annual_revenue: Money, assumptions: &MarketAssumptions) -> (Decimal, Decimal) {
    let adjustment = if annual_revenue >= dec!(5000000) {
        dec!(1.0)
    } else if annual_revenue >= dec!(1000000) {
        dec!(0.5)
    } else {
        Decimal::ZERO
    };
    (
        assumptions.sde_multiple_low + adjustment,
        assumptions.sde_multiple_high + adjustment,
    )
}
