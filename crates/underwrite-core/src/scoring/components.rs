use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::metrics::{BusinessMetrics, HybridMetrics, RealEstateMetrics};
use crate::types::Rate;

/// One weighted line of the score. `raw_score` is 0-100 before the
/// weight is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub name: String,
    pub raw_score: Decimal,
    pub weight: Rate,
    pub weighted_contribution: Decimal,
}

fn component(name: &str, raw_score: Decimal, weight: Decimal) -> ScoreComponent {
    ScoreComponent {
        name: name.to_string(),
        raw_score,
        weight,
        weighted_contribution: raw_score * weight,
    }
}

/// Linear 0-100 interpolation between a `bad` and a `good` bound,
/// clamped at both ends. With `bad > good` the scale inverts, so
/// lower-is-better metrics use the same helper.
pub(crate) fn interpolate(value: Decimal, bad: Decimal, good: Decimal) -> Decimal {
    if bad == good {
        return dec!(50);
    }
    let score = (value - bad) / (good - bad) * dec!(100);
    score.clamp(Decimal::ZERO, dec!(100))
}

pub(crate) fn real_estate_components(
    m: &RealEstateMetrics,
    vacancy_rate: Rate,
) -> Vec<ScoreComponent> {
    vec![
        component(
            "Cap Rate",
            interpolate(m.cap_rate, dec!(0.04), dec!(0.10)),
            dec!(0.20),
        ),
        component(
            "Cash-on-Cash Return",
            interpolate(m.cash_on_cash, dec!(0.02), dec!(0.12)),
            dec!(0.20),
        ),
        component(
            "Debt Coverage",
            interpolate(m.dscr.unwrap_or(dec!(1.75)), dec!(1.0), dec!(1.75)),
            dec!(0.20),
        ),
        component(
            "Five-Year ROI",
            interpolate(m.five_year_roi, Decimal::ZERO, dec!(1.0)),
            dec!(0.15),
        ),
        component(
            "Expense Ratio",
            interpolate(m.operating_expense_ratio, dec!(0.65), dec!(0.35)),
            dec!(0.10),
        ),
        component(
            "Vacancy Buffer",
            interpolate(vacancy_rate, dec!(0.15), dec!(0.05)),
            dec!(0.15),
        ),
    ]
}

pub(crate) fn business_components(m: &BusinessMetrics, annual_revenue: Decimal) -> Vec<ScoreComponent> {
    // A business with no positive SDE has no multiple worth scoring.
    let multiple_score = if m.sde <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        interpolate(m.sde_multiple, dec!(4.5), dec!(2.0))
    };

    let cushion = match m.break_even_revenue.finite() {
        Some(be) if annual_revenue > Decimal::ZERO => (annual_revenue - be) / annual_revenue,
        _ => Decimal::ZERO,
    };

    vec![
        component("SDE Multiple", multiple_score, dec!(0.25)),
        component(
            "Cash-on-Cash Return",
            interpolate(m.cash_on_cash, dec!(0.05), dec!(0.30)),
            dec!(0.20),
        ),
        component(
            "Debt Coverage",
            interpolate(m.dscr.unwrap_or(dec!(2.0)), dec!(1.0), dec!(2.0)),
            dec!(0.20),
        ),
        component(
            "SDE Margin",
            interpolate(m.sde_margin, dec!(0.05), dec!(0.30)),
            dec!(0.20),
        ),
        component(
            "Break-Even Cushion",
            interpolate(cushion, Decimal::ZERO, dec!(0.30)),
            dec!(0.15),
        ),
    ]
}

pub(crate) fn hybrid_components(m: &HybridMetrics, purchase_price: Decimal) -> Vec<ScoreComponent> {
    let multiple_score = if m.business_sde <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        interpolate(m.sde_multiple, dec!(4.5), dec!(2.0))
    };

    let gap_share = if purchase_price <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        m.allocation_gap / purchase_price
    };

    vec![
        component(
            "Property Cap Rate",
            interpolate(m.property_cap_rate, dec!(0.04), dec!(0.10)),
            dec!(0.15),
        ),
        component(
            "Combined Debt Coverage",
            interpolate(m.dscr.unwrap_or(dec!(1.75)), dec!(1.0), dec!(1.75)),
            dec!(0.20),
        ),
        component(
            "Cash-on-Cash Return",
            interpolate(m.cash_on_cash, dec!(0.02), dec!(0.12)),
            dec!(0.15),
        ),
        component("SDE Multiple", multiple_score, dec!(0.10)),
        component(
            "SDE Margin",
            interpolate(m.sde_margin, dec!(0.05), dec!(0.30)),
            dec!(0.10),
        ),
        component(
            "Five-Year ROI",
            interpolate(m.five_year_roi, Decimal::ZERO, dec!(1.0)),
            dec!(0.15),
        ),
        component(
            "Allocation Discipline",
            interpolate(gap_share, dec!(0.15), Decimal::ZERO),
            dec!(0.15),
        ),
    ]
}
