use clap::Args;
use serde_json::Value;

use fincast_core::facts::{self, CompanyFacts};
use fincast_core::three_statement::{self, ForecastInput};

use crate::input;

/// Arguments for a three-statement forecast
#[derive(Args)]
pub struct ForecastArgs {
    /// Path to JSON or YAML input holding `base` and `assumptions`
    #[arg(long, conflicts_with_all = ["facts", "assumptions"])]
    pub input: Option<String>,

    /// Path to an SEC companyfacts JSON document to take the base year from
    #[arg(long, requires = "assumptions")]
    pub facts: Option<String>,

    /// Path to JSON or YAML assumptions, used with --facts
    #[arg(long, requires = "facts")]
    pub assumptions: Option<String>,
}

pub fn run_forecast(
    args: ForecastArgs,
    decimals: Option<u32>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let fc_input: ForecastInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let (Some(facts_path), Some(assumptions_path)) = (&args.facts, &args.assumptions) {
        let company_facts: CompanyFacts = input::file::read_json(facts_path)?;
        ForecastInput {
            base: facts::base_from_company_facts(&company_facts)?,
            assumptions: input::file::read_input(assumptions_path)?,
        }
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err(
            "--input <file>, --facts with --assumptions, or stdin required for forecast".into(),
        );
    };

    let mut result = three_statement::build_forecast(&fc_input)?;
    if let Some(dp) = decimals {
        result.result = result.result.rounded(dp);
    }
    Ok(serde_json::to_value(result)?)
}
