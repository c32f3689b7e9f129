use serde_json::Value;

use super::format_value;

/// Print just the key answer: ending cash for a forecast, revenue for a base year.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let candidates = [
        result_obj.get("summary").and_then(|s| s.get("ending_cash")),
        result_obj.get("base").and_then(|b| b.get("revenue")),
    ];
    if let Some(val) = candidates.into_iter().flatten().find(|v| !v.is_null()) {
        println!("{}", format_value(val));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val));
            return;
        }
    }

    println!("{}", format_value(result_obj));
}
