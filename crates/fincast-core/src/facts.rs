//! Mapping of SEC XBRL "companyfacts" documents into [`BaseFinancials`].
//!
//! Fetching the document is the caller's concern; this module only reads an
//! already-downloaded payload and fails with [`ForecastError::Retrieval`] when
//! a required fact is absent, so the engine never sees a partial record.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ForecastError;
use crate::three_statement::base::{BaseFinancials, BaseWorkingCapital};
use crate::types::Money;
use crate::ForecastResult;

const TAXONOMY: &str = "us-gaap";
const UNIT: &str = "USD";
const ANNUAL_PERIOD: &str = "FY";

const REVENUE_TAGS: &[&str] = &[
    "Revenues",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
    "SalesRevenueNet",
];

// ---------------------------------------------------------------------------
// Document shape
// ---------------------------------------------------------------------------

/// The subset of a companyfacts document the mapper reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFacts {
    #[serde(rename = "entityName", default)]
    pub entity_name: Option<String>,
    /// taxonomy -> tag -> concept
    pub facts: HashMap<String, HashMap<String, Concept>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    #[serde(default)]
    pub units: HashMap<String, Vec<FactEntry>>,
}

/// One reported value of a concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactEntry {
    pub end: NaiveDate,
    pub val: Decimal,
    #[serde(default)]
    pub fy: Option<i32>,
    #[serde(default)]
    pub fp: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub filed: Option<NaiveDate>,
}

/// The most recent annual value of a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualFact {
    pub fiscal_year: i32,
    pub value: Money,
    pub end: NaiveDate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn parse_company_facts(json: &str) -> ForecastResult<CompanyFacts> {
    Ok(serde_json::from_str(json)?)
}

/// Latest full-year USD value for a us-gaap tag, ordered by period end then
/// filing date.
pub fn latest_annual(facts: &CompanyFacts, tag: &str) -> Option<AnnualFact> {
    let entries = facts.facts.get(TAXONOMY)?.get(tag)?.units.get(UNIT)?;

    entries
        .iter()
        .filter(|e| e.fp.as_deref() == Some(ANNUAL_PERIOD))
        .max_by_key(|e| (e.end, e.filed))
        .map(|e| AnnualFact {
            fiscal_year: e.fy.unwrap_or_else(|| e.end.year()),
            value: e.val,
            end: e.end,
        })
}

/// Build a base-year record from the latest annual facts.
pub fn base_from_company_facts(facts: &CompanyFacts) -> ForecastResult<BaseFinancials> {
    let revenue_fact = REVENUE_TAGS
        .iter()
        .find_map(|tag| latest_annual(facts, tag))
        .ok_or_else(|| {
            ForecastError::Retrieval(format!(
                "no annual {UNIT} revenue fact (tried {})",
                REVENUE_TAGS.join(", ")
            ))
        })?;

    let cash = required(facts, "CashAndCashEquivalentsAtCarryingValue")?;
    let assets = required(facts, "Assets")?;

    let cogs = optional(facts, "CostOfRevenue");
    let sga = optional(facts, "SellingGeneralAndAdministrativeExpense");
    let da = optional(facts, "DepreciationDepletionAndAmortization");
    let capex = optional(facts, "PaymentsToAcquirePropertyPlantAndEquipment");
    let receivables = optional(facts, "AccountsReceivableNetCurrent");
    let inventory = optional(facts, "InventoryNet");
    let ppe = optional(facts, "PropertyPlantAndEquipmentNet");
    let payables = optional(facts, "AccountsPayableCurrent");
    let accrued = optional(facts, "AccruedLiabilitiesCurrent");
    let debt = optional(facts, "LongTermDebtNoncurrent");
    let retained_earnings = optional(facts, "RetainedEarningsAccumulatedDeficit");

    let reported_liabilities = latest_annual(facts, "Liabilities").map(|f| f.value);
    let reported_equity = latest_annual(facts, "StockholdersEquity").map(|f| f.value);
    let (liabilities, equity) = match (reported_liabilities, reported_equity) {
        (Some(l), Some(e)) => (l, e),
        (Some(l), None) => (l, assets - l),
        (None, Some(e)) => (assets - e, e),
        // Unreported liabilities count as zero
        (None, None) => (Decimal::ZERO, assets),
    };

    let other_assets = (assets - (cash + receivables + inventory + ppe)).max(Decimal::ZERO);
    let other_liabilities =
        (liabilities - (payables + accrued + debt)).max(Decimal::ZERO);

    debug!(
        entity = facts.entity_name.as_deref().unwrap_or("unknown"),
        fiscal_year = revenue_fact.fiscal_year,
        revenue = %revenue_fact.value,
        assets = %assets,
        "mapped company facts"
    );

    Ok(BaseFinancials {
        fiscal_year: revenue_fact.fiscal_year,
        revenue: revenue_fact.value,
        cogs,
        operating_expenses: sga,
        depreciation_amortization: da,
        capex,
        working_capital: BaseWorkingCapital::Components {
            receivables,
            inventory,
            payables: payables + accrued,
        },
        net_fixed_assets: ppe,
        total_debt: debt,
        cash,
        total_equity: equity,
        retained_earnings,
        other_assets,
        other_liabilities,
    })
}

fn required(facts: &CompanyFacts, tag: &str) -> ForecastResult<Money> {
    latest_annual(facts, tag)
        .map(|f| f.value)
        .ok_or_else(|| ForecastError::Retrieval(format!("no annual {UNIT} fact for {tag}")))
}

fn optional(facts: &CompanyFacts, tag: &str) -> Money {
    latest_annual(facts, tag)
        .map(|f| f.value)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn annual(val: i64, fy: i32, end: &str, filed: &str) -> serde_json::Value {
        json!({ "val": val, "fy": fy, "fp": "FY", "form": "10-K", "end": end, "filed": filed })
    }

    fn concept(entries: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "label": "x", "units": { "USD": entries } })
    }

    fn sample_document() -> serde_json::Value {
        json!({
            "cik": 320193,
            "entityName": "Example Corp",
            "facts": {
                "us-gaap": {
                    "Revenues": concept(vec![
                        annual(900, 2022, "2022-12-31", "2023-02-10"),
                        annual(990, 2023, "2023-12-31", "2024-02-09"),
                        annual(1000, 2023, "2023-12-31", "2024-05-01"),
                        json!({ "val": 800, "fy": 2024, "fp": "Q3", "form": "10-Q",
                                "end": "2024-09-30", "filed": "2024-11-01" }),
                    ]),
                    "CostOfRevenue": concept(vec![annual(600, 2023, "2023-12-31", "2024-02-09")]),
                    "SellingGeneralAndAdministrativeExpense":
                        concept(vec![annual(200, 2023, "2023-12-31", "2024-02-09")]),
                    "DepreciationDepletionAndAmortization":
                        concept(vec![annual(40, 2023, "2023-12-31", "2024-02-09")]),
                    "CashAndCashEquivalentsAtCarryingValue":
                        concept(vec![annual(100, 2023, "2023-12-31", "2024-02-09")]),
                    "AccountsReceivableNetCurrent":
                        concept(vec![annual(80, 2023, "2023-12-31", "2024-02-09")]),
                    "InventoryNet": concept(vec![annual(30, 2023, "2023-12-31", "2024-02-09")]),
                    "PropertyPlantAndEquipmentNet":
                        concept(vec![annual(400, 2023, "2023-12-31", "2024-02-09")]),
                    "Assets": concept(vec![annual(700, 2023, "2023-12-31", "2024-02-09")]),
                    "AccountsPayableCurrent":
                        concept(vec![annual(40, 2023, "2023-12-31", "2024-02-09")]),
                    "AccruedLiabilitiesCurrent":
                        concept(vec![annual(20, 2023, "2023-12-31", "2024-02-09")]),
                    "LongTermDebtNoncurrent":
                        concept(vec![annual(200, 2023, "2023-12-31", "2024-02-09")]),
                    "Liabilities": concept(vec![annual(350, 2023, "2023-12-31", "2024-02-09")]),
                    "StockholdersEquity":
                        concept(vec![annual(350, 2023, "2023-12-31", "2024-02-09")]),
                }
            }
        })
    }

    fn facts_from(value: serde_json::Value) -> CompanyFacts {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_latest_annual_prefers_latest_filing() {
        let facts = facts_from(sample_document());
        let revenue = latest_annual(&facts, "Revenues").unwrap();
        assert_eq!(revenue.fiscal_year, 2023);
        assert_eq!(revenue.value, dec!(1000));
    }

    #[test]
    fn test_latest_annual_missing_tag() {
        let facts = facts_from(sample_document());
        assert!(latest_annual(&facts, "Goodwill").is_none());
    }

    #[test]
    fn test_fiscal_year_falls_back_to_end_date() {
        let facts = facts_from(json!({
            "facts": { "us-gaap": { "Revenues": concept(vec![
                json!({ "val": 5, "fp": "FY", "end": "2021-06-30" }),
            ]) } }
        }));
        assert_eq!(latest_annual(&facts, "Revenues").unwrap().fiscal_year, 2021);
    }

    #[test]
    fn test_base_from_company_facts() {
        let facts = facts_from(sample_document());
        let base = base_from_company_facts(&facts).unwrap();

        assert_eq!(base.fiscal_year, 2023);
        assert_eq!(base.revenue, dec!(1000));
        assert_eq!(base.cogs, dec!(600));
        assert_eq!(base.operating_expenses, dec!(200));
        assert_eq!(base.capex, Decimal::ZERO);
        assert_eq!(
            base.working_capital,
            BaseWorkingCapital::Components {
                receivables: dec!(80),
                inventory: dec!(30),
                payables: dec!(60),
            }
        );
        assert_eq!(base.other_assets, dec!(90));
        assert_eq!(base.other_liabilities, dec!(90));
        assert_eq!(base.total_equity, dec!(350));
        assert_eq!(base.balance_difference(), Decimal::ZERO);
        assert!(base.validate().is_ok());
    }

    #[test]
    fn test_equity_derived_when_not_reported() {
        let mut doc = sample_document();
        doc["facts"]["us-gaap"]
            .as_object_mut()
            .unwrap()
            .remove("StockholdersEquity");
        let base = base_from_company_facts(&facts_from(doc)).unwrap();
        assert_eq!(base.total_equity, dec!(350));
    }

    #[test]
    fn test_liabilities_and_equity_both_missing() {
        let mut doc = sample_document();
        let gaap = doc["facts"]["us-gaap"].as_object_mut().unwrap();
        gaap.remove("StockholdersEquity");
        gaap.remove("Liabilities");
        let base = base_from_company_facts(&facts_from(doc)).unwrap();

        assert_eq!(base.total_equity, dec!(700));
        assert_eq!(base.other_liabilities, Decimal::ZERO);
        assert_eq!(base.total_debt, dec!(200));
    }

    #[test]
    fn test_revenue_fallback_tag() {
        let mut doc = sample_document();
        let gaap = doc["facts"]["us-gaap"].as_object_mut().unwrap();
        gaap.remove("Revenues");
        gaap.insert(
            "RevenueFromContractWithCustomerExcludingAssessedTax".into(),
            concept(vec![annual(1200, 2023, "2023-12-31", "2024-02-09")]),
        );
        let base = base_from_company_facts(&facts_from(doc)).unwrap();
        assert_eq!(base.revenue, dec!(1200));
    }

    #[test]
    fn test_missing_revenue_is_retrieval_error() {
        let mut doc = sample_document();
        doc["facts"]["us-gaap"]
            .as_object_mut()
            .unwrap()
            .remove("Revenues");
        match base_from_company_facts(&facts_from(doc)) {
            Err(ForecastError::Retrieval(msg)) => assert!(msg.contains("revenue")),
            other => panic!("Expected Retrieval error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_cash_is_retrieval_error() {
        let mut doc = sample_document();
        doc["facts"]["us-gaap"]
            .as_object_mut()
            .unwrap()
            .remove("CashAndCashEquivalentsAtCarryingValue");
        assert!(matches!(
            base_from_company_facts(&facts_from(doc)),
            Err(ForecastError::Retrieval(_))
        ));
    }

    #[test]
    fn test_parse_company_facts_rejects_malformed_json() {
        assert!(matches!(
            parse_company_facts("{ not json"),
            Err(ForecastError::Serialization(_))
        ));
    }
}
