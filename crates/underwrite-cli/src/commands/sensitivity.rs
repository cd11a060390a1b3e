use clap::Args;
use serde_json::Value;

use underwrite_core::sensitivity;

use crate::input;

/// Arguments for the sensitivity command
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to the deal JSON file (or pipe JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Dot-addressed input to sweep (e.g. monthly_rent,
    /// financing.interest_rate, vacancy_rate)
    #[arg(long)]
    pub variable: String,

    /// Increments swept on each side of the base value
    #[arg(long, default_value = "3")]
    pub steps: u32,

    /// Apply a named scenario before sweeping
    #[arg(long)]
    pub scenario: Option<String>,
}

pub fn run(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(args.input.as_deref(), args.scenario.as_deref())?;
    let output = sensitivity::run_sensitivity(&deal, &args.variable, args.steps)?;
    Ok(serde_json::to_value(output)?)
}
