mod components;
mod flags;

pub use components::ScoreComponent;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::deal::{Deal, DealKind};
use crate::error::UnderwriteError;
use crate::metrics::{deal_metrics, DealMetrics};
use crate::types::{with_metadata, ComputationOutput};
use crate::UnderwriteResult;

/// Fixed penalty per risk flag.
const FLAG_PENALTY: Decimal = dec!(5);
/// Flags can never cost more than this in total.
const MAX_PENALTY: Decimal = dec!(25);

/// A 0-100 composite judgment of a deal: weighted metric components
/// less a capped risk-flag penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentScore {
    /// Rounded, clamped 0-100
    pub total: Decimal,
    /// Weighted sum before the penalty
    pub raw_total: Decimal,
    pub penalty: Decimal,
    pub label: String,
    /// Terminal color hint for the label
    pub color: String,
    pub components: Vec<ScoreComponent>,
    pub risk_flags: Vec<String>,
    pub summary: String,
}

fn label_for(total: Decimal) -> (&'static str, &'static str) {
    if total >= dec!(80) {
        ("Strong Buy", "green")
    } else if total >= dec!(65) {
        ("Good Deal", "green")
    } else if total >= dec!(50) {
        ("Fair", "yellow")
    } else if total >= dec!(35) {
        ("Below Average", "yellow")
    } else {
        ("Weak", "red")
    }
}

/// Score a deal end to end: compute its metrics, weight them, apply
/// risk-flag penalties.
pub fn score_deal(deal: &Deal) -> UnderwriteResult<ComputationOutput<InvestmentScore>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let metrics = deal_metrics(deal, &mut warnings);
    let score = score_from_metrics(deal, &metrics)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weighted Investment Score",
        &serde_json::json!({
            "deal_kind": deal.kind_name(),
            "flag_penalty": FLAG_PENALTY,
            "max_penalty": MAX_PENALTY,
        }),
        warnings,
        elapsed,
        score,
    ))
}

/// Score from metrics already in hand, so callers comparing base and
/// stressed cases do not recompute. The metrics must match the deal's
/// kind.
pub fn score_from_metrics(deal: &Deal, metrics: &DealMetrics) -> UnderwriteResult<InvestmentScore> {
    let components = match (&deal.kind, metrics) {
        (DealKind::RealEstate(t), DealMetrics::RealEstate(m)) => {
            components::real_estate_components(m, t.vacancy_rate)
        }
        (DealKind::Business(t), DealMetrics::Business(m)) => {
            components::business_components(m, t.annual_revenue)
        }
        (DealKind::Hybrid(t), DealMetrics::Hybrid(m)) => {
            components::hybrid_components(m, t.purchase_price)
        }
        _ => {
            return Err(UnderwriteError::InvalidInput {
                field: "metrics".into(),
                reason: format!("Metrics do not match a {} deal", deal.kind_name()),
            })
        }
    };

    let raw_total: Decimal = components.iter().map(|c| c.weighted_contribution).sum();
    let risk_flags = flags::risk_flags(deal, metrics);
    let penalty = (FLAG_PENALTY * Decimal::from(risk_flags.len() as u32)).min(MAX_PENALTY);
    let total = (raw_total - penalty).clamp(Decimal::ZERO, dec!(100)).round();
    let (label, color) = label_for(total);

    let strongest = components.iter().max_by_key(|c| c.raw_score);
    let weakest = components.iter().min_by_key(|c| c.raw_score);
    let summary = match (strongest, weakest) {
        (Some(best), Some(worst)) => format!(
            "{label}: scored {total}/100 with {} risk flag{}; strongest on {}, weakest on {}",
            risk_flags.len(),
            if risk_flags.len() == 1 { "" } else { "s" },
            best.name,
            worst.name,
        ),
        _ => format!(
            "{label}: scored {total}/100 with {} risk flag{}",
            risk_flags.len(),
            if risk_flags.len() == 1 { "" } else { "s" },
        ),
    };

    Ok(InvestmentScore {
        total,
        raw_total,
        penalty,
        label: label.to_string(),
        color: color.to_string(),
        components,
        risk_flags,
        summary,
    })
}
