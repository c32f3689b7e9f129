use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::numeric::MONEY_LIMIT;
use crate::types::{Money, Multiple, Rate};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Longest horizon the engine accepts, in annual periods.
pub const MAX_HORIZON: u32 = 100;

/// Ceiling on a Debt/EBIT leverage target.
pub const MAX_EBIT_LEVERAGE: Multiple = dec!(20);

// ---------------------------------------------------------------------------
// Driver types
// ---------------------------------------------------------------------------

/// How cost of goods sold is driven. Either form resolves to a COGS ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostOfSales {
    /// COGS as % of revenue
    CogsRatio(Rate),
    /// Gross margin; COGS ratio = 1 - margin
    GrossMargin(Rate),
}

impl CostOfSales {
    pub fn cogs_ratio(&self) -> Rate {
        match *self {
            CostOfSales::CogsRatio(r) => r,
            CostOfSales::GrossMargin(m) => Decimal::ONE - m,
        }
    }
}

/// Balance that the depreciation rate is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationBasis {
    /// Prior period's ending net fixed assets
    #[default]
    PriorNetFixedAssets,
    /// Current period revenue
    Revenue,
}

/// Working capital ratios applied line by line to revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkingCapitalRatios {
    pub receivables_ratio: Rate,
    pub inventory_ratio: Rate,
    pub payables_ratio: Rate,
}

/// How ending net working capital is driven.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingCapitalDriver {
    /// Net working capital as % of revenue (may be negative)
    NetRatio(Rate),
    /// Receivables + inventory - payables, each as % of revenue
    Components(WorkingCapitalRatios),
}

/// What a leverage target is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageBasis {
    /// Debt = ratio x current period EBIT
    Ebit,
    /// Debt = ratio x prior period total assets
    PriorTotalAssets,
}

/// Financing policy for the single blended debt balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DebtPolicy {
    /// Debt held at the prior balance
    Flat,
    /// Same issuance (positive) or repayment (negative) every period
    FixedDelta { annual_change: Money },
    /// Explicit issuance/repayment per period, first entry for period 1
    Schedule { changes: Vec<Money> },
    /// Debt reset each period to a target multiple
    TargetLeverage { ratio: Multiple, basis: LeverageBasis },
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// Unvalidated scalar drivers, one per assumption, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionInput {
    /// Number of annual periods to project
    pub horizon: u32,
    /// Revenue growth per period
    pub revenue_growth: Rate,
    pub cost_of_sales: CostOfSales,
    /// Operating expenses (excluding D&A) as % of revenue
    pub opex_ratio: Rate,
    pub depreciation_rate: Rate,
    #[serde(default)]
    pub depreciation_basis: DepreciationBasis,
    /// Capex as % of revenue
    pub capex_ratio: Rate,
    pub working_capital: WorkingCapitalDriver,
    /// Flat effective tax rate
    pub tax_rate: Rate,
    /// Interest rate on prior period ending debt
    pub interest_rate: Rate,
    /// Dividends as % of positive net income
    pub dividend_payout: Rate,
    pub debt_policy: DebtPolicy,
}

// ---------------------------------------------------------------------------
// Validated set
// ---------------------------------------------------------------------------

/// A validated, immutable set of forecast drivers.
///
/// The only way to obtain one is [`AssumptionSet::new`] (serde goes through the
/// same path), so every accessor returns an in-range value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssumptionInput", into = "AssumptionInput")]
pub struct AssumptionSet {
    input: AssumptionInput,
    cogs_ratio: Rate,
}

impl AssumptionSet {
    pub fn new(input: AssumptionInput) -> ForecastResult<Self> {
        validate_input(&input)?;
        let cogs_ratio = input.cost_of_sales.cogs_ratio();
        Ok(AssumptionSet { input, cogs_ratio })
    }

    pub fn horizon(&self) -> u32 {
        self.input.horizon
    }

    pub fn revenue_growth(&self) -> Rate {
        self.input.revenue_growth
    }

    pub fn cogs_ratio(&self) -> Rate {
        self.cogs_ratio
    }

    pub fn opex_ratio(&self) -> Rate {
        self.input.opex_ratio
    }

    pub fn depreciation_rate(&self) -> Rate {
        self.input.depreciation_rate
    }

    pub fn depreciation_basis(&self) -> DepreciationBasis {
        self.input.depreciation_basis
    }

    pub fn capex_ratio(&self) -> Rate {
        self.input.capex_ratio
    }

    pub fn working_capital(&self) -> &WorkingCapitalDriver {
        &self.input.working_capital
    }

    pub fn tax_rate(&self) -> Rate {
        self.input.tax_rate
    }

    pub fn interest_rate(&self) -> Rate {
        self.input.interest_rate
    }

    pub fn dividend_payout(&self) -> Rate {
        self.input.dividend_payout
    }

    pub fn debt_policy(&self) -> &DebtPolicy {
        &self.input.debt_policy
    }

    /// The raw drivers this set was built from.
    pub fn input(&self) -> &AssumptionInput {
        &self.input
    }
}

impl TryFrom<AssumptionInput> for AssumptionSet {
    type Error = ForecastError;

    fn try_from(input: AssumptionInput) -> ForecastResult<Self> {
        AssumptionSet::new(input)
    }
}

impl From<AssumptionSet> for AssumptionInput {
    fn from(set: AssumptionSet) -> Self {
        set.input
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &AssumptionInput) -> ForecastResult<()> {
    if input.horizon < 1 || input.horizon > MAX_HORIZON {
        return Err(ForecastError::validation(
            "horizon",
            input.horizon,
            format!("an integer in [1, {MAX_HORIZON}]"),
        ));
    }

    if input.revenue_growth <= dec!(-1) {
        return Err(ForecastError::validation(
            "revenue_growth",
            input.revenue_growth,
            "a rate greater than -1.0",
        ));
    }

    match input.cost_of_sales {
        CostOfSales::CogsRatio(r) => validate_rate("cost_of_sales.cogs_ratio", r)?,
        CostOfSales::GrossMargin(m) => validate_rate("cost_of_sales.gross_margin", m)?,
    }
    validate_rate("opex_ratio", input.opex_ratio)?;
    validate_rate("depreciation_rate", input.depreciation_rate)?;
    validate_rate("capex_ratio", input.capex_ratio)?;
    validate_rate("tax_rate", input.tax_rate)?;
    validate_rate("interest_rate", input.interest_rate)?;
    validate_rate("dividend_payout", input.dividend_payout)?;

    match input.working_capital {
        WorkingCapitalDriver::NetRatio(r) => {
            validate_range("working_capital.net_ratio", r, dec!(-1), Decimal::ONE)?
        }
        WorkingCapitalDriver::Components(ratios) => {
            validate_rate(
                "working_capital.components.receivables_ratio",
                ratios.receivables_ratio,
            )?;
            validate_rate(
                "working_capital.components.inventory_ratio",
                ratios.inventory_ratio,
            )?;
            validate_rate(
                "working_capital.components.payables_ratio",
                ratios.payables_ratio,
            )?;
        }
    }

    validate_debt_policy(&input.debt_policy, input.horizon)?;

    // COGS and opex together cannot consume more than all of revenue
    let total_cost = input.cost_of_sales.cogs_ratio() + input.opex_ratio;
    if total_cost > Decimal::ONE {
        return Err(ForecastError::validation(
            "opex_ratio",
            input.opex_ratio,
            format!("COGS ratio + opex ratio <= 1 (got {total_cost})"),
        ));
    }

    Ok(())
}

fn validate_debt_policy(policy: &DebtPolicy, horizon: u32) -> ForecastResult<()> {
    match policy {
        DebtPolicy::Flat => Ok(()),
        DebtPolicy::FixedDelta { annual_change } => validate_range(
            "debt_policy.annual_change",
            *annual_change,
            -MONEY_LIMIT,
            MONEY_LIMIT,
        ),
        DebtPolicy::Schedule { changes } => {
            if changes.len() < horizon as usize {
                return Err(ForecastError::validation(
                    "debt_policy.changes",
                    format!("{} entries", changes.len()),
                    format!("at least one entry per period ({horizon})"),
                ));
            }
            changes.iter().try_for_each(|c| {
                validate_range("debt_policy.changes", *c, -MONEY_LIMIT, MONEY_LIMIT)
            })
        }
        DebtPolicy::TargetLeverage { ratio, basis } => match basis {
            LeverageBasis::Ebit => validate_range(
                "debt_policy.ratio",
                *ratio,
                Decimal::ZERO,
                MAX_EBIT_LEVERAGE,
            ),
            LeverageBasis::PriorTotalAssets => validate_rate("debt_policy.ratio", *ratio),
        },
    }
}

/// Reject a rate outside [0, 1].
pub(crate) fn validate_rate(field: &str, value: Rate) -> ForecastResult<()> {
    validate_range(field, value, Decimal::ZERO, Decimal::ONE)
}

pub(crate) fn validate_range(
    field: &str,
    value: Decimal,
    min: Decimal,
    max: Decimal,
) -> ForecastResult<()> {
    if value < min || value > max {
        return Err(ForecastError::validation(
            field,
            value,
            format!("a value in [{min}, {max}]"),
        ));
    }
    Ok(())
}
