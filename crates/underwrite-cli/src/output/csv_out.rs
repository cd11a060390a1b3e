use serde_json::Value;
use std::io;

/// Write output as CSV to stdout. Tabular results (sensitivity rows,
/// portfolio deals, amortization schedules) become row-per-record CSV;
/// everything else falls back to field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = map.get("result").unwrap_or(value);
            match result {
                Value::Array(arr) => write_array_csv(&mut wtr, arr),
                Value::Object(res_map) => {
                    // A result dominated by one array of records (rows,
                    // deals, schedule) exports that array.
                    if let Some(arr) = dominant_array(res_map) {
                        write_array_csv(&mut wtr, arr);
                    } else {
                        let _ = wtr.write_record(["field", "value"]);
                        for (key, val) in res_map {
                            if !val.is_array() && !val.is_object() {
                                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                            }
                        }
                    }
                }
                _ => {
                    let _ = wtr.write_record([&format_csv_value(result)]);
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn dominant_array(map: &serde_json::Map<String, Value>) -> Option<&Vec<Value>> {
    for key in ["rows", "deals", "schedule", "annual"] {
        if let Some(Value::Array(arr)) = map.get(key) {
            if arr.first().map(Value::is_object).unwrap_or(false) {
                return Some(arr);
            }
        }
    }
    None
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
