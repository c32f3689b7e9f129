use clap::Args;
use serde_json::{json, Value};

use fincast_core::facts::{self, CompanyFacts};

use crate::input;

/// Arguments for mapping company facts to a base year
#[derive(Args)]
pub struct BaseFromFactsArgs {
    /// Path to an SEC companyfacts JSON document
    #[arg(long)]
    pub facts: Option<String>,
}

pub fn run_base_from_facts(args: BaseFromFactsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let company_facts: CompanyFacts = if let Some(ref path) = args.facts {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--facts <companyfacts.json> or stdin required for base-from-facts".into());
    };

    let base = facts::base_from_company_facts(&company_facts)?;
    let implied_ratios = base.implied_ratios();
    Ok(json!({
        "result": {
            "base": base,
            "implied_ratios": implied_ratios,
        }
    }))
}
