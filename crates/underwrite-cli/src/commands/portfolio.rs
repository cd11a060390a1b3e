use clap::Args;
use serde_json::Value;

use underwrite_core::portfolio;

use crate::input;

/// Arguments for the portfolio command
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to a JSON array of deals (or pipe the array on stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deals = input::load_deals(args.input.as_deref())?;
    let output = portfolio::analyze_portfolio(&deals)?;
    Ok(serde_json::to_value(output)?)
}
