use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::numeric::{safe_divide, ABSOLUTE_TOLERANCE, MONEY_LIMIT};
use crate::types::{Money, Rate};
use crate::ForecastResult;

use super::period::PriorState;

/// Largest base-year imbalance accepted, as a fraction of total assets.
pub const BASE_BALANCE_TOLERANCE: Rate = dec!(0.01);

/// Reported working capital, either as one net figure or by line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseWorkingCapital {
    Net(Money),
    Components {
        receivables: Money,
        inventory: Money,
        payables: Money,
    },
}

impl BaseWorkingCapital {
    pub fn net(&self) -> Money {
        match *self {
            BaseWorkingCapital::Net(n) => n,
            BaseWorkingCapital::Components {
                receivables,
                inventory,
                payables,
            } => receivables + inventory - payables,
        }
    }
}

/// Normalized snapshot of the most recent reported fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFinancials {
    pub fiscal_year: i32,
    pub revenue: Money,
    pub cogs: Money,
    /// Operating expenses excluding D&A
    pub operating_expenses: Money,
    pub depreciation_amortization: Money,
    pub capex: Money,
    pub working_capital: BaseWorkingCapital,
    pub net_fixed_assets: Money,
    pub total_debt: Money,
    pub cash: Money,
    pub total_equity: Money,
    pub retained_earnings: Money,
    /// Assets outside the modeled lines, held flat
    #[serde(default)]
    pub other_assets: Money,
    /// Liabilities outside debt and working capital, held flat
    #[serde(default)]
    pub other_liabilities: Money,
}

/// Base-year ratios, useful as a starting point for assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedRatios {
    pub cogs_ratio: Rate,
    pub opex_ratio: Rate,
    pub capex_ratio: Rate,
    pub net_working_capital_ratio: Rate,
    pub depreciation_to_revenue: Rate,
    pub depreciation_to_net_fixed_assets: Rate,
}

impl BaseFinancials {
    pub fn net_working_capital(&self) -> Money {
        self.working_capital.net()
    }

    pub fn total_assets(&self) -> Money {
        self.cash + self.net_working_capital() + self.net_fixed_assets + self.other_assets
    }

    pub fn total_liabilities_and_equity(&self) -> Money {
        self.total_debt + self.other_liabilities + self.total_equity
    }

    /// Assets minus liabilities and equity as reported.
    pub fn balance_difference(&self) -> Money {
        self.total_assets() - self.total_liabilities_and_equity()
    }

    /// Ratios implied by the base year. Zero revenue or fixed assets yield zero.
    pub fn implied_ratios(&self) -> ImpliedRatios {
        ImpliedRatios {
            cogs_ratio: safe_divide(self.cogs, self.revenue),
            opex_ratio: safe_divide(self.operating_expenses, self.revenue),
            capex_ratio: safe_divide(self.capex, self.revenue),
            net_working_capital_ratio: safe_divide(self.net_working_capital(), self.revenue),
            depreciation_to_revenue: safe_divide(self.depreciation_amortization, self.revenue),
            depreciation_to_net_fixed_assets: safe_divide(
                self.depreciation_amortization,
                self.net_fixed_assets,
            ),
        }
    }

    pub fn validate(&self) -> ForecastResult<()> {
        validate_magnitude("base.total_equity", self.total_equity)?;
        validate_magnitude("base.retained_earnings", self.retained_earnings)?;
        if let BaseWorkingCapital::Net(net) = self.working_capital {
            validate_magnitude("base.working_capital.net", net)?;
        }
        validate_non_negative("base.revenue", self.revenue)?;
        validate_non_negative("base.cogs", self.cogs)?;
        validate_non_negative("base.operating_expenses", self.operating_expenses)?;
        validate_non_negative(
            "base.depreciation_amortization",
            self.depreciation_amortization,
        )?;
        validate_non_negative("base.capex", self.capex)?;
        validate_non_negative("base.net_fixed_assets", self.net_fixed_assets)?;
        validate_non_negative("base.total_debt", self.total_debt)?;
        validate_non_negative("base.cash", self.cash)?;
        validate_non_negative("base.other_assets", self.other_assets)?;
        validate_non_negative("base.other_liabilities", self.other_liabilities)?;

        if let BaseWorkingCapital::Components {
            receivables,
            inventory,
            payables,
        } = self.working_capital
        {
            validate_non_negative("base.working_capital.receivables", receivables)?;
            validate_non_negative("base.working_capital.inventory", inventory)?;
            validate_non_negative("base.working_capital.payables", payables)?;
        }

        let total_assets = self.total_assets();
        let allowed = (total_assets.abs() * BASE_BALANCE_TOLERANCE).max(ABSOLUTE_TOLERANCE);
        let difference = self.balance_difference();
        if difference.abs() > allowed {
            return Err(ForecastError::validation(
                "base.balance_sheet",
                format!(
                    "assets {total_assets} vs liabilities + equity {}",
                    self.total_liabilities_and_equity()
                ),
                format!("a difference within {BASE_BALANCE_TOLERANCE} of total assets"),
            ));
        }

        Ok(())
    }

    /// Opening balances for period 1.
    ///
    /// Any residual base-year imbalance (already checked to be within
    /// [`BASE_BALANCE_TOLERANCE`]) is carried flat inside other liabilities so
    /// the first projected period closes exactly.
    pub fn opening_state(&self) -> PriorState {
        PriorState {
            index: 0,
            fiscal_year: self.fiscal_year,
            revenue: self.revenue,
            net_fixed_assets: self.net_fixed_assets,
            net_working_capital: self.net_working_capital(),
            debt: self.total_debt,
            cash: self.cash,
            total_equity: self.total_equity,
            retained_earnings: self.retained_earnings,
            other_assets: self.other_assets,
            other_liabilities: self.other_liabilities + self.balance_difference(),
            total_assets: self.total_assets(),
        }
    }
}

fn validate_non_negative(field: &str, value: Money) -> ForecastResult<()> {
    if value < Decimal::ZERO {
        return Err(ForecastError::validation(
            field,
            value,
            "a non-negative amount",
        ));
    }
    validate_magnitude(field, value)
}

fn validate_magnitude(field: &str, value: Money) -> ForecastResult<()> {
    if value.abs() > MONEY_LIMIT {
        return Err(ForecastError::validation(
            field,
            value,
            format!("an amount no larger than {MONEY_LIMIT} in magnitude"),
        ));
    }
    Ok(())
}
