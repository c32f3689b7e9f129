mod commands;
mod input;
mod log;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::facts::BaseFromFactsArgs;
use commands::forecast::ForecastArgs;

/// Linked three-statement financial forecasts
#[derive(Parser)]
#[command(
    name = "fincast",
    version,
    about = "Linked three-statement financial forecasts",
    long_about = "Projects the income statement, balance sheet and cash flow statement \
                  forward from a reported base year with decimal precision. Cash is the \
                  balancing item, so every projected balance sheet closes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Round money lines in the output to this many decimal places
    #[arg(long, global = true)]
    decimals: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a forecast from a base year and an assumption set
    Forecast(ForecastArgs),
    /// Map an SEC companyfacts document to a base-year record
    BaseFromFacts(BaseFromFactsArgs),
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

    log::init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Forecast(args) => commands::forecast::run_forecast(args, cli.decimals),
        Commands::BaseFromFacts(args) => commands::facts::run_base_from_facts(args),
        Commands::Version => {
            println!("fincast {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
