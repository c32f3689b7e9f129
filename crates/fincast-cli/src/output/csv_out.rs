use serde_json::Value;
use std::io;

use super::{forecast_periods, format_value, STATEMENTS};

/// Write output as CSV to stdout: one row per period for a forecast,
/// field/value rows otherwise.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(periods) = forecast_periods(value) {
        let _ = wtr.write_record(period_headers());
        for period in periods {
            let _ = wtr.write_record(period_row(period));
        }
    } else {
        let result = value.get("result").unwrap_or(value);
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in flatten(result, "") {
            let _ = wtr.write_record([key, val]);
        }
    }

    if let Err(e) = wtr.flush() {
        tracing::error!(error = %e, "failed to flush csv output");
    }
}

fn period_headers() -> Vec<String> {
    let mut headers = vec!["period".to_string(), "fiscal_year".to_string()];
    for (key, _, lines) in STATEMENTS {
        headers.extend(lines.iter().map(|line| format!("{key}.{line}")));
    }
    headers
}

fn period_row(period: &Value) -> Vec<String> {
    let mut row = vec![
        period.get("index").map(format_value).unwrap_or_default(),
        period.get("fiscal_year").map(format_value).unwrap_or_default(),
    ];
    for (key, _, lines) in STATEMENTS {
        row.extend(lines.iter().map(|line| {
            period
                .get(key)
                .and_then(|s| s.get(*line))
                .map(format_value)
                .unwrap_or_default()
        }));
    }
    row
}

/// Flatten nested objects into dotted keys.
fn flatten(value: &Value, prefix: &str) -> Vec<(String, String)> {
    match value {
        Value::Object(map) => map
            .iter()
            .flat_map(|(key, val)| {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(val, &name)
            })
            .collect(),
        _ => vec![(prefix.to_string(), format_value(value))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_period_row_lines_up_with_headers() {
        let period = json!({
            "index": 1,
            "fiscal_year": 2025,
            "income_statement": { "revenue": "1100", "net_income": "79" },
            "cash_flow": { "free_cash_flow": "62.5" },
            "balance_sheet": { "cash": "182.3" }
        });
        let headers = period_headers();
        let row = period_row(&period);
        assert_eq!(headers.len(), row.len());

        let cell = |name: &str| {
            let i = headers.iter().position(|h| h == name).unwrap();
            row[i].clone()
        };
        assert_eq!(cell("period"), "1");
        assert_eq!(cell("fiscal_year"), "2025");
        assert_eq!(cell("income_statement.revenue"), "1100");
        assert_eq!(cell("cash_flow.free_cash_flow"), "62.5");
        assert_eq!(cell("balance_sheet.cash"), "182.3");
        assert_eq!(cell("balance_sheet.debt"), "");
    }

    #[test]
    fn test_flatten_nested_result() {
        let value = json!({ "base": { "revenue": "1000" }, "implied_ratios": { "cogs_ratio": "0.6" } });
        let flat = flatten(&value, "");
        assert_eq!(
            flat,
            vec![
                ("base.revenue".to_string(), "1000".to_string()),
                ("implied_ratios.cogs_ratio".to_string(), "0.6".to_string()),
            ]
        );
    }
}
