use clap::Args;
use serde_json::Value;
use std::time::Instant;

use underwrite_core::amortization::{annual_rollup, build_schedule, loan_summary};
use underwrite_core::with_metadata;

use crate::input;

/// Arguments for the amortize command
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to the deal JSON file (or pipe JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Roll the monthly schedule up into annual rows
    #[arg(long)]
    pub annual: bool,

    /// Print only the loan summary, no schedule
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(args.input.as_deref(), None)?;
    let start = Instant::now();

    let financing = &deal.financing;
    let summary = loan_summary(financing);

    let mut warnings = Vec::new();
    if summary.periods == 0 {
        warnings.push("No loan to amortize — schedule is empty".to_string());
    }

    let result = if args.summary_only {
        serde_json::json!({ "summary": summary })
    } else if args.annual {
        let annual = annual_rollup(&build_schedule(financing));
        serde_json::json!({ "summary": summary, "annual": annual })
    } else {
        let schedule = build_schedule(financing);
        serde_json::json!({ "summary": summary, "schedule": schedule })
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "Loan Amortization",
        &serde_json::json!({
            "loan_type": financing.loan_type,
            "interest_rate": financing.interest_rate,
            "amortization_years": financing.amortization_years,
        }),
        warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
