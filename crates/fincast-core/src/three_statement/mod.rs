pub mod assumptions;
pub mod base;
pub mod engine;
pub mod period;
pub mod plug;
pub mod projector;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::numeric::{compute_cagr, round_money, safe_divide};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ForecastResult;

pub use assumptions::{AssumptionInput, AssumptionSet};
pub use base::BaseFinancials;
pub use engine::{EngineState, ForecastEngine};
pub use period::{Period, PriorState};

const LEVERAGE_WARNING: Multiple = dec!(6);
const COVERAGE_WARNING: Multiple = dec!(2);

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Everything one forecast run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    pub base: BaseFinancials,
    pub assumptions: AssumptionSet,
}

/// Projected periods plus aggregate metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub periods: Vec<Period>,
    pub summary: ForecastSummary,
}

/// Aggregate metrics across the forecast horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub total_periods: u32,
    pub revenue_cagr: Rate,
    pub avg_ebit_margin: Rate,
    pub avg_net_margin: Rate,
    pub ending_cash: Money,
    pub ending_debt: Money,
    /// Ending debt / ending EBITDA; zero when EBITDA is not positive
    pub ending_leverage: Multiple,
    pub cumulative_free_cash_flow: Money,
}

impl ForecastOutput {
    /// Round money lines to `dp` places and ratios to `dp + 4`, for presentation.
    /// Both are capped at the 28 places a decimal can hold.
    ///
    /// Rounded periods are not guaranteed to balance exactly.
    pub fn rounded(&self, dp: u32) -> ForecastOutput {
        let money = |v: Money| round_money(v, dp);
        let ratio = |v: Rate| round_money(v, dp.saturating_add(4));
        let s = &self.summary;
        ForecastOutput {
            periods: self.periods.iter().map(|p| p.rounded(dp)).collect(),
            summary: ForecastSummary {
                total_periods: s.total_periods,
                revenue_cagr: ratio(s.revenue_cagr),
                avg_ebit_margin: ratio(s.avg_ebit_margin),
                avg_net_margin: ratio(s.avg_net_margin),
                ending_cash: money(s.ending_cash),
                ending_debt: money(s.ending_debt),
                ending_leverage: ratio(s.ending_leverage),
                cumulative_free_cash_flow: money(s.cumulative_free_cash_flow),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project a linked three-statement forecast with cash as the balancing item.
pub fn build_forecast(
    input: &ForecastInput,
) -> ForecastResult<ComputationOutput<ForecastOutput>> {
    let start = Instant::now();

    let periods = ForecastEngine::run(&input.base, &input.assumptions)?;
    let warnings = collect_warnings(&input.base, &input.assumptions, &periods);
    let summary = build_summary(&input.base, &periods);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Linked Three-Statement Forecast with Cash Balance Plug",
        &input.assumptions,
        warnings,
        elapsed,
        ForecastOutput { periods, summary },
    ))
}

// ---------------------------------------------------------------------------
// Summary and warnings
// ---------------------------------------------------------------------------

pub fn build_summary(base: &BaseFinancials, periods: &[Period]) -> ForecastSummary {
    let Some(last) = periods.last() else {
        return ForecastSummary::default();
    };
    let n = periods.len() as u32;
    let n_dec = Decimal::from(n);

    // Margins on a vanishing revenue can saturate, so the sums must too
    let ebit_margin_sum = periods
        .iter()
        .map(|p| safe_divide(p.income_statement.ebit, p.income_statement.revenue))
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let net_margin_sum = periods
        .iter()
        .map(|p| safe_divide(p.income_statement.net_income, p.income_statement.revenue))
        .fold(Decimal::ZERO, Decimal::saturating_add);

    let ending_ebitda = last.income_statement.ebitda;
    let ending_leverage = if ending_ebitda > Decimal::ZERO {
        safe_divide(last.balance_sheet.debt, ending_ebitda)
    } else {
        Decimal::ZERO
    };

    ForecastSummary {
        total_periods: n,
        revenue_cagr: compute_cagr(base.revenue, last.income_statement.revenue, n),
        avg_ebit_margin: ebit_margin_sum / n_dec,
        avg_net_margin: net_margin_sum / n_dec,
        ending_cash: last.balance_sheet.cash,
        ending_debt: last.balance_sheet.debt,
        ending_leverage,
        cumulative_free_cash_flow: periods.iter().map(|p| p.cash_flow.free_cash_flow).sum(),
    }
}

/// Analyst-facing warnings. These never stop a forecast.
pub fn collect_warnings(
    base: &BaseFinancials,
    assumptions: &AssumptionSet,
    periods: &[Period],
) -> Vec<String> {
    let mut warnings = Vec::new();

    let reconciling = base.balance_difference();
    if !reconciling.is_zero() {
        warnings.push(format!(
            "Base year {}: assets differ from liabilities + equity by {reconciling}; \
             carried flat in other liabilities",
            base.fiscal_year
        ));
    }

    let mut prior = base.opening_state();
    for period in periods {
        let year = period.fiscal_year;
        let is = &period.income_statement;
        let bs = &period.balance_sheet;

        if is.ebitda > Decimal::ZERO {
            let leverage = safe_divide(bs.debt, is.ebitda);
            if leverage > LEVERAGE_WARNING {
                warnings.push(format!(
                    "Year {year}: leverage ratio {leverage:.1}x exceeds 6.0x threshold"
                ));
            }
        }
        if is.interest_expense > Decimal::ZERO {
            let coverage = safe_divide(is.ebit, is.interest_expense);
            if coverage < COVERAGE_WARNING {
                warnings.push(format!(
                    "Year {year}: interest coverage ratio {coverage:.2}x below 2.0x minimum"
                ));
            }
        }
        if period.cash_flow.free_cash_flow < Decimal::ZERO {
            warnings.push(format!(
                "Year {year}: negative free cash flow ({})",
                period.cash_flow.free_cash_flow
            ));
        }
        if bs.cash < Decimal::ZERO {
            warnings.push(format!(
                "Year {year}: negative ending cash ({}); financing does not cover the shortfall",
                bs.cash
            ));
        }
        if projector::scheduled_debt(&prior, assumptions, is.ebit) < Decimal::ZERO {
            warnings.push(format!(
                "Year {year}: debt policy repays more than the outstanding balance; debt floored at zero"
            ));
        }

        prior = PriorState::from(period);
    }

    warnings
}
