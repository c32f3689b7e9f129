use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ForecastError;
use crate::numeric::MONEY_LIMIT;
use crate::types::Money;
use crate::ForecastResult;

use super::assumptions::{
    AssumptionSet, DebtPolicy, DepreciationBasis, LeverageBasis, WorkingCapitalDriver,
};
use super::period::{CashFlowStatement, IncomeStatement, Period, PriorState, WorkingCapitalDetail};
use super::plug::{close_balance_sheet, ClosingFlows};

/// Project the period that follows `prior`.
///
/// Lines are computed in dependency order. D&A and interest read only the
/// prior period's balances, so nothing in a period depends on itself.
pub fn project_period(prior: &PriorState, assumptions: &AssumptionSet) -> ForecastResult<Period> {
    let index = prior.index + 1;

    // ---------------------------------------------------------------
    // Income statement
    // ---------------------------------------------------------------
    let growth = assumptions.revenue_growth();
    // Every other line is bounded by a multiple of revenue, prior balances and
    // validated debt changes, so capping revenue keeps the period in range
    let revenue = prior
        .revenue
        .checked_mul(Decimal::ONE + growth)
        .filter(|r| r.abs() <= MONEY_LIMIT)
        .ok_or_else(|| {
            ForecastError::validation(
                "revenue_growth",
                growth,
                format!("a revenue path that stays within {MONEY_LIMIT} (period {index})"),
            )
        })?;
    let cogs = revenue * assumptions.cogs_ratio();
    let gross_profit = revenue - cogs;
    let operating_expenses = revenue * assumptions.opex_ratio();
    let depreciation_amortization = match assumptions.depreciation_basis() {
        DepreciationBasis::PriorNetFixedAssets => {
            assumptions.depreciation_rate() * prior.net_fixed_assets
        }
        DepreciationBasis::Revenue => assumptions.depreciation_rate() * revenue,
    };
    let ebitda = gross_profit - operating_expenses;
    let ebit = ebitda - depreciation_amortization;

    let interest_expense = assumptions.interest_rate() * prior.debt;
    let pretax_income = ebit - interest_expense;
    // No tax benefit on losses
    let tax = pretax_income.max(Decimal::ZERO) * assumptions.tax_rate();
    let net_income = pretax_income - tax;

    // ---------------------------------------------------------------
    // Working capital and fixed assets
    // ---------------------------------------------------------------
    let (net_working_capital, working_capital) =
        project_working_capital(revenue, assumptions.working_capital());
    let change_in_working_capital = net_working_capital - prior.net_working_capital;

    let capex = revenue * assumptions.capex_ratio();
    let net_fixed_assets = prior.net_fixed_assets + capex - depreciation_amortization;

    // ---------------------------------------------------------------
    // Distributions and financing
    // ---------------------------------------------------------------
    let dividends = if net_income > Decimal::ZERO {
        net_income * assumptions.dividend_payout()
    } else {
        Decimal::ZERO
    };

    let debt = scheduled_debt(prior, assumptions, ebit).max(Decimal::ZERO);
    let net_debt_issuance = debt - prior.debt;

    // ---------------------------------------------------------------
    // Cash flow statement
    // ---------------------------------------------------------------
    let cash_from_operations = net_income + depreciation_amortization - change_in_working_capital;
    let cash_from_investing = -capex;
    let cash_from_financing = net_debt_issuance - dividends;
    let net_change_in_cash = cash_from_operations + cash_from_investing + cash_from_financing;

    let balance_sheet = close_balance_sheet(
        prior,
        index,
        ClosingFlows {
            net_change_in_cash,
            net_working_capital,
            working_capital,
            net_fixed_assets,
            debt,
            net_income,
            dividends,
        },
    )?;

    debug!(
        period = index,
        revenue = %revenue,
        net_income = %net_income,
        cash = %balance_sheet.cash,
        debt = %debt,
        "projected period"
    );

    Ok(Period {
        index,
        fiscal_year: prior.fiscal_year + 1,
        income_statement: IncomeStatement {
            revenue,
            cogs,
            gross_profit,
            operating_expenses,
            ebitda,
            depreciation_amortization,
            ebit,
            interest_expense,
            pretax_income,
            tax,
            net_income,
        },
        cash_flow: CashFlowStatement {
            net_income,
            depreciation_amortization,
            change_in_working_capital,
            cash_from_operations,
            capex,
            cash_from_investing,
            net_debt_issuance,
            dividends,
            cash_from_financing,
            net_change_in_cash,
            free_cash_flow: cash_from_operations - capex,
        },
        balance_sheet,
    })
}

/// Ending debt the financing policy asks for, before the zero floor.
///
/// `ebit` is the current period's EBIT, which does not depend on debt.
pub fn scheduled_debt(prior: &PriorState, assumptions: &AssumptionSet, ebit: Money) -> Money {
    match assumptions.debt_policy() {
        DebtPolicy::Flat => prior.debt,
        DebtPolicy::FixedDelta { annual_change } => prior.debt + *annual_change,
        DebtPolicy::Schedule { changes } => {
            let change = changes
                .get(prior.index as usize)
                .copied()
                .unwrap_or(Decimal::ZERO);
            prior.debt + change
        }
        DebtPolicy::TargetLeverage { ratio, basis } => match basis {
            LeverageBasis::Ebit => *ratio * ebit.max(Decimal::ZERO),
            LeverageBasis::PriorTotalAssets => *ratio * prior.total_assets,
        },
    }
}

fn project_working_capital(
    revenue: Money,
    driver: &WorkingCapitalDriver,
) -> (Money, Option<WorkingCapitalDetail>) {
    match driver {
        WorkingCapitalDriver::NetRatio(ratio) => (revenue * *ratio, None),
        WorkingCapitalDriver::Components(ratios) => {
            let detail = WorkingCapitalDetail {
                receivables: revenue * ratios.receivables_ratio,
                inventory: revenue * ratios.inventory_ratio,
                payables: revenue * ratios.payables_ratio,
            };
            (
                detail.receivables + detail.inventory - detail.payables,
                Some(detail),
            )
        }
    }
}
