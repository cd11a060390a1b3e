use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables. The result envelope's scalar fields become
/// a two-column table; nested arrays of objects (score components,
/// sensitivity rows, the price ladder, portfolio lines) each get their
/// own table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_warnings(map);
                if let Some(Value::String(meth)) = map.get("methodology") {
                    println!("\nMethodology: {}", meth);
                }
            } else {
                print_object_table(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    match result {
        Value::Object(map) => {
            // Scalars first, then each nested table under its own header.
            let mut scalars = serde_json::Map::new();
            let mut nested: Vec<(&str, &Vec<Value>)> = Vec::new();
            for (key, val) in map {
                match val {
                    Value::Array(arr) if arr.first().map(Value::is_object).unwrap_or(false) => {
                        nested.push((key.as_str(), arr));
                    }
                    Value::Object(_) => {
                        // Sub-objects (valuation, price_gap, stress) flatten
                        // into dotted scalar rows.
                        if let Value::Object(inner) = val {
                            for (ik, iv) in inner {
                                if !iv.is_object() && !iv.is_array() {
                                    scalars.insert(format!("{key}.{ik}"), iv.clone());
                                }
                            }
                        }
                    }
                    _ => {
                        scalars.insert(key.clone(), val.clone());
                    }
                }
            }

            if !scalars.is_empty() {
                print_object_table(&scalars);
            }
            for (name, arr) in nested {
                println!("\n{name}:");
                print_array_table(arr);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", result),
    }
}

fn print_object_table(map: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn print_warnings(envelope: &serde_json::Map<String, Value>) {
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
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Extended metrics serialize their unbounded case as null.
        Value::Null => "∞".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
