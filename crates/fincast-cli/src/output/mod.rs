pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Statement key in a serialized period, its display title, and line items in
/// presentation order.
pub const STATEMENTS: [(&str, &str, &[&str]); 3] = [
    (
        "income_statement",
        "Income Statement",
        &[
            "revenue",
            "cogs",
            "gross_profit",
            "operating_expenses",
            "ebitda",
            "depreciation_amortization",
            "ebit",
            "interest_expense",
            "pretax_income",
            "tax",
            "net_income",
        ],
    ),
    (
        "cash_flow",
        "Cash Flow Statement",
        &[
            "net_income",
            "depreciation_amortization",
            "change_in_working_capital",
            "cash_from_operations",
            "capex",
            "cash_from_investing",
            "net_debt_issuance",
            "dividends",
            "cash_from_financing",
            "net_change_in_cash",
            "free_cash_flow",
        ],
    ),
    (
        "balance_sheet",
        "Balance Sheet",
        &[
            "cash",
            "net_working_capital",
            "net_fixed_assets",
            "other_assets",
            "total_assets",
            "debt",
            "other_liabilities",
            "total_liabilities",
            "retained_earnings",
            "total_equity",
            "total_liabilities_and_equity",
        ],
    ),
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result.periods` array of a forecast envelope, if present.
pub fn forecast_periods(value: &Value) -> Option<&[Value]> {
    value
        .get("result")
        .and_then(|r| r.get("periods"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
