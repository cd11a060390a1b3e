use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::deal::{Deal, DealKind};
use crate::metrics::DealMetrics;

/// Collect risk flags for a scored deal. Each flag costs a fixed
/// penalty in the total, independent of the weighted components.
pub(crate) fn risk_flags(deal: &Deal, metrics: &DealMetrics) -> Vec<String> {
    let mut flags = Vec::new();

    if metrics.dscr().is_below(dec!(1.25)) {
        flags.push(format!(
            "DSCR of {} is below the 1.25x lending floor",
            metrics.dscr()
        ));
    }
    if metrics.annual_cash_flow() < Decimal::ZERO {
        flags.push(format!(
            "Negative annual cash flow of {}",
            metrics.annual_cash_flow()
        ));
    }

    let vacancy = match &deal.kind {
        DealKind::RealEstate(t) => Some(t.vacancy_rate),
        DealKind::Hybrid(t) => Some(t.vacancy_rate),
        DealKind::Business(_) => None,
    };
    if let Some(v) = vacancy {
        if v < dec!(0.03) {
            flags.push(format!(
                "Vacancy assumption of {:.1}% is below 3% — likely optimistic",
                v * dec!(100)
            ));
        }
    }

    match metrics {
        DealMetrics::RealEstate(m) => {
            if m.operating_expense_ratio > dec!(0.60) {
                flags.push(format!(
                    "Operating expenses consume {:.1}% of effective gross income",
                    m.operating_expense_ratio * dec!(100)
                ));
            }
        }
        DealMetrics::Business(m) => {
            if m.sde_margin < dec!(0.15) {
                flags.push(format!(
                    "SDE margin of {:.1}% is thin — little room for error",
                    m.sde_margin * dec!(100)
                ));
            }
        }
        DealMetrics::Hybrid(m) => {
            if m.sde_margin < dec!(0.15) {
                flags.push(format!(
                    "SDE margin of {:.1}% is thin — little room for error",
                    m.sde_margin * dec!(100)
                ));
            }
            if let DealKind::Hybrid(t) = &deal.kind {
                if t.purchase_price > Decimal::ZERO
                    && m.allocation_gap > t.purchase_price * dec!(0.05)
                {
                    flags.push(format!(
                        "Property/business allocation is off by {} (more than 5% of price)",
                        m.allocation_gap
                    ));
                }
            }
        }
    }

    flags
}
