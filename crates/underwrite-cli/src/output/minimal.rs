use serde_json::Value;

/// Print just the headline number from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first scalar field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Score total, then coverage, then the per-kind income lines.
    let priority_keys = [
        "total",
        "dscr",
        "noi",
        "sde",
        "combined_noi",
        "fair_value_midpoint",
        "average_score",
        "total_annual_cash_flow",
        "monthly_payment",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                println!("{}", format_minimal(val));
                return;
            }
        }

        // Negotiation buries its headline inside the price gap.
        if let Some(val) = map
            .get("price_gap")
            .and_then(|g| g.get("fair_value_midpoint"))
        {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_array() && !v.is_object()) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Unbounded ratios serialize as null.
        Value::Null => "∞".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
