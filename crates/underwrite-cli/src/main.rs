mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortize::AmortizeArgs;
use commands::analyze::AnalyzeArgs;
use commands::negotiate::NegotiateArgs;
use commands::portfolio::PortfolioArgs;
use commands::score::ScoreArgs;
use commands::sensitivity::SensitivityArgs;
use commands::stress::StressArgs;

/// Acquisition underwriting for rentals, small businesses, and hybrids
#[derive(Parser)]
#[command(
    name = "uw",
    version,
    about = "Acquisition underwriting for rentals, small businesses, and hybrids",
    long_about = "Underwrite acquisition deals with decimal precision: per-kind metrics \
                  (NOI, SDE, cap rate, DSCR, IRR), amortization schedules, weighted \
                  scoring, recession stress tests, sensitivity sweeps, negotiation \
                  prep, and portfolio roll-ups. Deals are JSON, given via --input or \
                  piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full metrics record for one deal
    Analyze(AnalyzeArgs),
    /// Score a deal 0-100 with weighted components and risk flags
    Score(ScoreArgs),
    /// Print the loan amortization schedule
    Amortize(AmortizeArgs),
    /// Sweep one input and tabulate the metric response
    Sensitivity(SensitivityArgs),
    /// Fair value, price gap, stress comparison, and talking points
    Negotiate(NegotiateArgs),
    /// Re-run the metrics under recession assumptions
    Stress(StressArgs),
    /// Aggregate a set of deals into a portfolio view
    Portfolio(PortfolioArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Score(args) => commands::score::run(args),
        Commands::Amortize(args) => commands::amortize::run(args),
        Commands::Sensitivity(args) => commands::sensitivity::run(args),
        Commands::Negotiate(args) => commands::negotiate::run(args),
        Commands::Stress(args) => commands::stress::run(args),
        Commands::Portfolio(args) => commands::portfolio::run(args),
        Commands::Version => {
            println!("uw {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
