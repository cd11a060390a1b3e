use clap::Args;
use serde_json::Value;

use underwrite_core::scoring;

use crate::input;

/// Arguments for the score command
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to the deal JSON file (or pipe JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Apply a named scenario from the deal's scenarios list
    #[arg(long)]
    pub scenario: Option<String>,
}

pub fn run(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(args.input.as_deref(), args.scenario.as_deref())?;
    let output = scoring::score_deal(&deal)?;
    Ok(serde_json::to_value(output)?)
}
