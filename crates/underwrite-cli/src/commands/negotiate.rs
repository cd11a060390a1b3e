use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use underwrite_core::deal::MarketAssumptions;
use underwrite_core::negotiation;
use underwrite_core::stress::RecessionOverrides;

use crate::input;

/// Arguments for the negotiate command
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NegotiateArgs {
    /// Path to the deal JSON file (or pipe JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Apply a named scenario from the deal's scenarios list
    #[arg(long)]
    pub scenario: Option<String>,

    /// Low end of the market cap-rate band
    #[arg(long)]
    pub cap_rate_low: Option<Decimal>,

    /// High end of the market cap-rate band
    #[arg(long)]
    pub cap_rate_high: Option<Decimal>,

    /// Low end of the SDE multiple band
    #[arg(long)]
    pub sde_multiple_low: Option<Decimal>,

    /// High end of the SDE multiple band
    #[arg(long)]
    pub sde_multiple_high: Option<Decimal>,

    /// DSCR the lender underwrites to
    #[arg(long)]
    pub target_dscr: Option<Decimal>,

    /// Path to a JSON file of recession overrides for the stress side
    #[arg(long)]
    pub overrides: Option<String>,
}

pub fn run(args: NegotiateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(args.input.as_deref(), args.scenario.as_deref())?;

    let mut assumptions = MarketAssumptions::default();
    if let Some(v) = args.cap_rate_low {
        assumptions.cap_rate_low = v;
    }
    if let Some(v) = args.cap_rate_high {
        assumptions.cap_rate_high = v;
    }
    if let Some(v) = args.sde_multiple_low {
        assumptions.sde_multiple_low = v;
    }
    if let Some(v) = args.sde_multiple_high {
        assumptions.sde_multiple_high = v;
    }
    if let Some(v) = args.target_dscr {
        assumptions.target_dscr = v;
    }

    let overrides: RecessionOverrides = match args.overrides.as_deref() {
        Some(path) => input::file::read_json(path)?,
        None => RecessionOverrides::default(),
    };

    let output = negotiation::analyze_negotiation(&deal, &assumptions, &overrides)?;
    Ok(serde_json::to_value(output)?)
}
