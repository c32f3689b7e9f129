use serde::{Deserialize, Serialize};

use crate::numeric::round_money;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Income statement for a single projected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
    pub operating_expenses: Money,
    pub ebitda: Money,
    pub depreciation_amortization: Money,
    pub ebit: Money,
    pub interest_expense: Money,
    pub pretax_income: Money,
    pub tax: Money,
    pub net_income: Money,
}

/// Cash flow statement for a single projected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub net_income: Money,
    pub depreciation_amortization: Money,
    /// Increase in net working capital (a use of cash when positive)
    pub change_in_working_capital: Money,
    pub cash_from_operations: Money,
    pub capex: Money,
    pub cash_from_investing: Money,
    pub net_debt_issuance: Money,
    pub dividends: Money,
    pub cash_from_financing: Money,
    pub net_change_in_cash: Money,
    pub free_cash_flow: Money,
}

/// Working capital lines, present when the components driver is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingCapitalDetail {
    pub receivables: Money,
    pub inventory: Money,
    pub payables: Money,
}

/// Balance sheet at the end of a single projected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub cash: Money,
    pub net_working_capital: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_capital: Option<WorkingCapitalDetail>,
    pub net_fixed_assets: Money,
    pub other_assets: Money,
    pub total_assets: Money,
    pub debt: Money,
    pub other_liabilities: Money,
    pub total_liabilities: Money,
    pub retained_earnings: Money,
    pub total_equity: Money,
    pub total_liabilities_and_equity: Money,
}

/// One forecast year. Produced once by the projector and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    /// 1-based position in the horizon
    pub index: u32,
    pub fiscal_year: i32,
    pub income_statement: IncomeStatement,
    pub cash_flow: CashFlowStatement,
    pub balance_sheet: BalanceSheet,
}

impl Period {
    /// Copy with every money line rounded to `dp` places, for display.
    pub fn rounded(&self, dp: u32) -> Period {
        let r = |v: Money| round_money(v, dp);
        let is = &self.income_statement;
        let cf = &self.cash_flow;
        let bs = &self.balance_sheet;

        Period {
            index: self.index,
            fiscal_year: self.fiscal_year,
            income_statement: IncomeStatement {
                revenue: r(is.revenue),
                cogs: r(is.cogs),
                gross_profit: r(is.gross_profit),
                operating_expenses: r(is.operating_expenses),
                ebitda: r(is.ebitda),
                depreciation_amortization: r(is.depreciation_amortization),
                ebit: r(is.ebit),
                interest_expense: r(is.interest_expense),
                pretax_income: r(is.pretax_income),
                tax: r(is.tax),
                net_income: r(is.net_income),
            },
            cash_flow: CashFlowStatement {
                net_income: r(cf.net_income),
                depreciation_amortization: r(cf.depreciation_amortization),
                change_in_working_capital: r(cf.change_in_working_capital),
                cash_from_operations: r(cf.cash_from_operations),
                capex: r(cf.capex),
                cash_from_investing: r(cf.cash_from_investing),
                net_debt_issuance: r(cf.net_debt_issuance),
                dividends: r(cf.dividends),
                cash_from_financing: r(cf.cash_from_financing),
                net_change_in_cash: r(cf.net_change_in_cash),
                free_cash_flow: r(cf.free_cash_flow),
            },
            balance_sheet: BalanceSheet {
                cash: r(bs.cash),
                net_working_capital: r(bs.net_working_capital),
                working_capital: bs.working_capital.as_ref().map(|wc| WorkingCapitalDetail {
                    receivables: r(wc.receivables),
                    inventory: r(wc.inventory),
                    payables: r(wc.payables),
                }),
                net_fixed_assets: r(bs.net_fixed_assets),
                other_assets: r(bs.other_assets),
                total_assets: r(bs.total_assets),
                debt: r(bs.debt),
                other_liabilities: r(bs.other_liabilities),
                total_liabilities: r(bs.total_liabilities),
                retained_earnings: r(bs.retained_earnings),
                total_equity: r(bs.total_equity),
                total_liabilities_and_equity: r(bs.total_liabilities_and_equity),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Carry-forward state
// ---------------------------------------------------------------------------

/// Ending balances the projector reads when producing the next period.
///
/// Built either from the base year or from the immediately prior [`Period`];
/// nothing older is ever visible to the projector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorState {
    /// 0 for the base year
    pub index: u32,
    pub fiscal_year: i32,
    pub revenue: Money,
    pub net_fixed_assets: Money,
    pub net_working_capital: Money,
    pub debt: Money,
    pub cash: Money,
    pub total_equity: Money,
    pub retained_earnings: Money,
    pub other_assets: Money,
    pub other_liabilities: Money,
    pub total_assets: Money,
}

impl From<&Period> for PriorState {
    fn from(period: &Period) -> Self {
        let bs = &period.balance_sheet;
        PriorState {
            index: period.index,
            fiscal_year: period.fiscal_year,
            revenue: period.income_statement.revenue,
            net_fixed_assets: bs.net_fixed_assets,
            net_working_capital: bs.net_working_capital,
            debt: bs.debt,
            cash: bs.cash,
            total_equity: bs.total_equity,
            retained_earnings: bs.retained_earnings,
            other_assets: bs.other_assets,
            other_liabilities: bs.other_liabilities,
            total_assets: bs.total_assets,
        }
    }
}
