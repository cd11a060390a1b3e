use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::deal::{get_field, is_growth_field, is_rate_field, set_field, Deal};
use crate::error::UnderwriteError;
use crate::metrics::{deal_metrics, output_metrics_for};
use crate::types::{with_metadata, ComputationOutput, Extended};
use crate::UnderwriteResult;

/// Step size for rate-like inputs: one percentage point.
const RATE_STEP: Decimal = dec!(0.01);
/// Currency inputs step by this share of their base value.
const CURRENCY_STEP_SHARE: Decimal = dec!(0.075);
/// Fallback absolute step when the base currency value is zero.
const CURRENCY_STEP_FLOOR: Decimal = dec!(1000);

const MAX_STEPS: u32 = 50;

/// One row of a sweep: the perturbed input and the metric set it yields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub input_value: Decimal,
    pub metrics: BTreeMap<String, Extended>,
    pub is_base_case: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityTable {
    /// Dot-addressed input that was swept
    pub variable: String,
    /// Metric names in column order, fixed per deal kind
    pub output_metrics: Vec<String>,
    /// Ordered lowest input to highest; always 2*steps + 1 rows
    pub rows: Vec<SensitivityRow>,
}

/// Sweep one input `steps` increments either side of its current value
/// and recompute the deal's full metric set at each point. The deal
/// itself is never mutated.
pub fn run_sensitivity(
    deal: &Deal,
    variable: &str,
    steps: u32,
) -> UnderwriteResult<ComputationOutput<SensitivityTable>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if steps == 0 || steps > MAX_STEPS {
        return Err(UnderwriteError::InvalidInput {
            field: "steps".into(),
            reason: format!("Steps must be between 1 and {MAX_STEPS}"),
        });
    }

    let base_value = get_field(deal, variable)?;
    let step = step_size(variable, base_value);

    let metric_names = output_metrics_for(&deal.kind);
    let mut rows = Vec::with_capacity((2 * steps + 1) as usize);

    for i in -(steps as i64)..=(steps as i64) {
        let mut input_value = base_value + step * Decimal::from(i);
        // Negative rents, prices, or rates are meaningless; growth and
        // appreciation assumptions may legitimately go negative.
        if !is_growth_field(variable) {
            input_value = input_value.max(Decimal::ZERO);
        }

        let mut perturbed = deal.clone();
        set_field(&mut perturbed, variable, input_value)?;

        // Per-row warnings are expected churn at the extremes; only the
        // base case's warnings surface.
        let mut row_warnings = Vec::new();
        let metrics = deal_metrics(&perturbed, &mut row_warnings);
        if i == 0 {
            warnings.append(&mut row_warnings);
        }

        let mut metric_values = BTreeMap::new();
        for name in metric_names {
            if let Some(value) = metrics.metric(name) {
                metric_values.insert((*name).to_string(), value);
            }
        }

        rows.push(SensitivityRow {
            input_value,
            metrics: metric_values,
            is_base_case: i == 0,
        });
    }

    let table = SensitivityTable {
        variable: variable.to_string(),
        output_metrics: metric_names.iter().map(|n| (*n).to_string()).collect(),
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single-Variable Sensitivity Sweep",
        &serde_json::json!({
            "variable": variable,
            "base_value": base_value,
            "step": step,
            "steps_each_side": steps,
        }),
        warnings,
        elapsed,
        table,
    ))
}

fn step_size(variable: &str, base_value: Decimal) -> Decimal {
    if is_rate_field(variable) {
        RATE_STEP
    } else if base_value.is_zero() {
        CURRENCY_STEP_FLOOR
    } else {
        base_value.abs() * CURRENCY_STEP_SHARE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{DealKind, FinancingTerms, LoanType, OperatingExpenses, RealEstateTerms};
    use pretty_assertions::assert_eq;

    fn rental() -> Deal {
        Deal {
            id: "r-1".into(),
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
    fn test_row_count_and_base_case_position() {
        let table = run_sensitivity(&rental(), "monthly_rent", 3).unwrap().result;
        assert_eq!(table.rows.len(), 7);
        assert!(table.rows[3].is_base_case);
        assert_eq!(table.rows.iter().filter(|r| r.is_base_case).count(), 1);
        assert_eq!(table.rows[3].input_value, dec!(2400));
    }

    #[test]
    fn test_currency_step_is_proportional() {
        let table = run_sensitivity(&rental(), "monthly_rent", 1).unwrap().result;
        // 7.5% of 2,400 = 180
        assert_eq!(table.rows[0].input_value, dec!(2220.0));
        assert_eq!(table.rows[2].input_value, dec!(2580.0));
    }

    #[test]
    fn test_rate_step_is_one_point() {
        let table = run_sensitivity(&rental(), "financing.interest_rate", 2)
            .unwrap()
            .result;
        let inputs: Vec<Decimal> = table.rows.iter().map(|r| r.input_value).collect();
        assert_eq!(
            inputs,
            vec![dec!(0.05), dec!(0.06), dec!(0.07), dec!(0.08), dec!(0.09)]
        );
    }

    #[test]
    fn test_vacancy_sweep_clamps_at_zero() {
        let mut deal = rental();
        if let DealKind::RealEstate(t) = &mut deal.kind {
            t.vacancy_rate = dec!(0.01);
        }
        let table = run_sensitivity(&deal, "vacancy_rate", 3).unwrap().result;
        assert_eq!(table.rows[0].input_value, Decimal::ZERO);
        assert_eq!(table.rows[1].input_value, Decimal::ZERO);
    }

    #[test]
    fn test_growth_fields_may_go_negative() {
        let table = run_sensitivity(&rental(), "rent_growth", 5).unwrap().result;
        assert_eq!(table.rows[0].input_value, dec!(-0.02));
    }

    #[test]
    fn test_metrics_move_with_rent() {
        let table = run_sensitivity(&rental(), "monthly_rent", 2).unwrap().result;
        let noi = |i: usize| table.rows[i].metrics["noi"].finite().unwrap();
        assert!(noi(0) < noi(2));
        assert!(noi(2) < noi(4));
        // Column order matches the kind's output set.
        assert_eq!(table.output_metrics[0], "cap_rate");
        assert_eq!(table.rows[0].metrics.len(), table.output_metrics.len());
    }

    #[test]
    fn test_base_row_matches_direct_calculator() {
        let deal = rental();
        let table = run_sensitivity(&deal, "monthly_rent", 3).unwrap().result;
        let base = table.rows.iter().find(|r| r.is_base_case).unwrap();

        let mut warnings = Vec::new();
        let direct = deal_metrics(&deal, &mut warnings);
        for name in &table.output_metrics {
            assert_eq!(
                base.metrics[name],
                direct.metric(name).unwrap(),
                "base row diverges from direct calculator on {name}"
            );
        }
    }

    #[test]
    fn test_unknown_variable_errors() {
        assert!(matches!(
            run_sensitivity(&rental(), "nonexistent_field", 3),
            Err(UnderwriteError::UnknownField(_))
        ));
    }

    #[test]
    fn test_step_bounds_enforced() {
        assert!(run_sensitivity(&rental(), "monthly_rent", 0).is_err());
        assert!(run_sensitivity(&rental(), "monthly_rent", 51).is_err());
    }

    #[test]
    fn test_sweep_does_not_mutate_deal() {
        let deal = rental();
        let _ = run_sensitivity(&deal, "monthly_rent", 3).unwrap();
        let DealKind::RealEstate(t) = &deal.kind else {
            panic!()
        };
        assert_eq!(t.monthly_rent, dec!(2400));
    }
}
