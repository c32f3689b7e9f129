use tracing::error;

use crate::error::ForecastError;
use crate::numeric::within_tolerance;
use crate::types::Money;
use crate::ForecastResult;

use super::period::{BalanceSheet, PriorState, WorkingCapitalDetail};

/// Period results the balance sheet is rolled forward from.
#[derive(Debug, Clone)]
pub struct ClosingFlows {
    pub net_change_in_cash: Money,
    pub net_working_capital: Money,
    pub working_capital: Option<WorkingCapitalDetail>,
    pub net_fixed_assets: Money,
    pub debt: Money,
    pub net_income: Money,
    pub dividends: Money,
}

/// Roll the balance sheet forward with cash as the residual, then verify it.
///
/// Cash is never assumed: it is prior cash plus the period's net cash flow.
/// The identity check that follows guards the projector's formulas; a
/// mismatch is returned as [`ForecastError::Balance`].
pub fn close_balance_sheet(
    prior: &PriorState,
    period: u32,
    flows: ClosingFlows,
) -> ForecastResult<BalanceSheet> {
    let cash = prior.cash + flows.net_change_in_cash;
    let total_assets =
        cash + flows.net_working_capital + flows.net_fixed_assets + prior.other_assets;

    let retained_earnings = prior.retained_earnings + flows.net_income - flows.dividends;
    let total_equity = prior.total_equity + flows.net_income - flows.dividends;
    let total_liabilities = flows.debt + prior.other_liabilities;
    let total_liabilities_and_equity = total_liabilities + total_equity;

    let sheet = BalanceSheet {
        cash,
        net_working_capital: flows.net_working_capital,
        working_capital: flows.working_capital,
        net_fixed_assets: flows.net_fixed_assets,
        other_assets: prior.other_assets,
        total_assets,
        debt: flows.debt,
        other_liabilities: prior.other_liabilities,
        total_liabilities,
        retained_earnings,
        total_equity,
        total_liabilities_and_equity,
    };

    check_balance(period, &sheet)?;
    Ok(sheet)
}

/// Assert total assets equal total liabilities plus equity within tolerance.
pub fn check_balance(period: u32, sheet: &BalanceSheet) -> ForecastResult<()> {
    if within_tolerance(sheet.total_assets, sheet.total_liabilities_and_equity) {
        return Ok(());
    }

    error!(
        period,
        total_assets = %sheet.total_assets,
        total_liabilities_and_equity = %sheet.total_liabilities_and_equity,
        "balance sheet identity failed after cash plug"
    );
    Err(ForecastError::Balance {
        period,
        total_assets: sheet.total_assets,
        total_liabilities_and_equity: sheet.total_liabilities_and_equity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn opening() -> PriorState {
        PriorState {
            index: 0,
            fiscal_year: 2024,
            revenue: dec!(1000),
            net_fixed_assets: dec!(400),
            net_working_capital: dec!(50),
            debt: dec!(200),
            cash: dec!(100),
            total_equity: dec!(350),
            retained_earnings: dec!(250),
            other_assets: Decimal::ZERO,
            other_liabilities: Decimal::ZERO,
            total_assets: dec!(550),
        }
    }

    fn consistent_flows() -> ClosingFlows {
        ClosingFlows {
            net_change_in_cash: dec!(74.01),
            net_working_capital: dec!(55),
            working_capital: None,
            net_fixed_assets: dec!(415),
            debt: dec!(200),
            net_income: dec!(134.3),
            dividends: dec!(40.29),
        }
    }

    #[test]
    fn test_cash_is_prior_plus_net_change() {
        let sheet = close_balance_sheet(&opening(), 1, consistent_flows()).unwrap();
        assert_eq!(sheet.cash, dec!(174.01));
        assert_eq!(sheet.total_assets, dec!(644.01));
        assert_eq!(sheet.total_liabilities_and_equity, dec!(644.01));
    }

    #[test]
    fn test_retained_earnings_roll_forward() {
        let sheet = close_balance_sheet(&opening(), 1, consistent_flows()).unwrap();
        assert_eq!(sheet.retained_earnings, dec!(250) + dec!(134.3) - dec!(40.29));
        assert_eq!(sheet.total_equity, dec!(444.01));
    }

    #[test]
    fn test_double_counted_flow_is_fatal() {
        let mut flows = consistent_flows();
        // Capex charged to cash twice
        flows.net_change_in_cash -= dec!(55);

        match close_balance_sheet(&opening(), 2, flows) {
            Err(ForecastError::Balance {
                period,
                total_assets,
                total_liabilities_and_equity,
            }) => {
                assert_eq!(period, 2);
                assert_eq!(total_assets, dec!(589.01));
                assert_eq!(total_liabilities_and_equity, dec!(644.01));
            }
            other => panic!("Expected Balance error, got {other:?}"),
        }
    }

    #[test]
    fn test_check_balance_tolerates_rounding_noise() {
        let mut sheet = close_balance_sheet(&opening(), 1, consistent_flows()).unwrap();
        sheet.total_assets += dec!(0.0000001);
        assert!(check_balance(1, &sheet).is_ok());
    }
}
