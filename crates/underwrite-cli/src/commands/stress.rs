use clap::Args;
use serde_json::Value;
use std::time::Instant;

use underwrite_core::metrics::deal_metrics;
use underwrite_core::stress::{apply_recession, RecessionOverrides};
use underwrite_core::with_metadata;

use crate::input;

/// Arguments for the stress command
#[derive(Args)]
pub struct StressArgs {
    /// Path to the deal JSON file (or pipe JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Apply a named scenario before stressing
    #[arg(long)]
    pub scenario: Option<String>,

    /// Path to a JSON file of recession overrides (defaults otherwise)
    #[arg(long)]
    pub overrides: Option<String>,
}

pub fn run(args: StressArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(args.input.as_deref(), args.scenario.as_deref())?;

    let overrides: RecessionOverrides = match args.overrides.as_deref() {
        Some(path) => input::file::read_json(path)?,
        None => RecessionOverrides::default(),
    };

    let start = Instant::now();
    let mut warnings = Vec::new();

    let base = deal_metrics(&deal, &mut warnings);
    let stressed_deal = apply_recession(&deal, &overrides);
    let mut stressed_warnings = Vec::new();
    let stressed = deal_metrics(&stressed_deal, &mut stressed_warnings);
    for w in stressed_warnings {
        warnings.push(format!("recession case: {w}"));
    }

    let result = serde_json::json!({
        "base": base,
        "stressed": stressed,
        "overrides": overrides,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "Recession Stress Test",
        &serde_json::json!({ "deal_kind": deal.kind_name() }),
        warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
