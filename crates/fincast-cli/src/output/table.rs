use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{forecast_periods, format_value, STATEMENTS};

/// Format output as tables: one per statement with fiscal years as columns
/// for a forecast, a field/value table otherwise.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(periods) = forecast_periods(value) {
                print_statements(periods);
                if let Some(summary) = value.get("result").and_then(|r| r.get("summary")) {
                    println!("Summary");
                    print_flat_object(summary);
                }
            } else if let Some(result) = map.get("result") {
                print_result_objects(result);
            } else {
                print_flat_object(value);
            }
            print_envelope_notes(map);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_statements(periods: &[Value]) {
    let years: Vec<String> = periods
        .iter()
        .map(|p| p.get("fiscal_year").map(format_value).unwrap_or_default())
        .collect();

    for (key, title, lines) in STATEMENTS {
        let mut builder = Builder::default();
        let mut header = vec![title.to_string()];
        header.extend(years.iter().cloned());
        builder.push_record(header);

        for line in lines {
            let mut row = vec![line.to_string()];
            row.extend(periods.iter().map(|p| {
                p.get(key)
                    .and_then(|s| s.get(*line))
                    .map(format_value)
                    .unwrap_or_default()
            }));
            builder.push_record(row);
        }

        println!("{}\n", Table::from(builder));
    }
}

/// Nested result objects (base year, implied ratios) each get their own table.
fn print_result_objects(result: &Value) {
    let Value::Object(res_map) = result else {
        println!("{}", format_value(result));
        return;
    };
    if res_map.values().all(Value::is_object) {
        for (name, section) in res_map {
            println!("{name}");
            print_flat_object(section);
        }
    } else {
        print_flat_object(result);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
