//! Properties and methods available on strings and arrays.

use super::value::Value;
use crate::core::{Result, TemplateError};

/// Look up `name` on a string or array; anything unknown is `undefined`.
pub(crate) fn property(target: &Value, name: &str) -> Value {
    match target {
        Value::String(s) => string_property(s, name),
        Value::Array(items) => array_property(items, name),
        _ => Value::Undefined,
    }
}

fn text_arg(args: &[Value], index: usize) -> String {
    args.get(index).map(Value::to_text).unwrap_or_default()
}

/// Resolve a possibly negative `slice` bound against `len`.
fn slice_bound(arg: Option<&Value>, len: usize, default: usize) -> usize {
    match arg {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = value.to_number();
            if n.is_nan() {
                0
            } else if n < 0.0 {
                len.saturating_sub((-n) as usize)
            } else {
                (n as usize).min(len)
            }
        }
    }
}

fn string_property(s: &str, name: &str) -> Value {
    let s = s.to_string();
    match name {
        "length" => Value::Number(s.chars().count() as f64),
        "toUpperCase" => Value::function(name, move |_| Ok(Value::from(s.to_uppercase()))),
        "toLowerCase" => Value::function(name, move |_| Ok(Value::from(s.to_lowercase()))),
        "trim" => Value::function(name, move |_| Ok(Value::from(s.trim()))),
        "startsWith" => {
            Value::function(name, move |args| Ok(Value::Bool(s.starts_with(&text_arg(&args, 0)))))
        }
        "endsWith" => {
            Value::function(name, move |args| Ok(Value::Bool(s.ends_with(&text_arg(&args, 0)))))
        }
        "includes" => {
            Value::function(name, move |args| Ok(Value::Bool(s.contains(&text_arg(&args, 0)))))
        }
        "split" => Value::function(name, move |args| {
            let parts = match args.first() {
                None | Some(Value::Undefined) => vec![Value::from(s.as_str())],
                Some(separator) => {
                    let separator = separator.to_text();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::from(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::from).collect()
                    }
                }
            };
            Ok(Value::Array(parts))
        }),
        // Replaces the first occurrence only.
        "replace" => Value::function(name, move |args| {
            Ok(Value::from(s.replacen(&text_arg(&args, 0), &text_arg(&args, 1), 1)))
        }),
        "slice" => Value::function(name, move |args| {
            let chars: Vec<char> = s.chars().collect();
            let start = slice_bound(args.first(), chars.len(), 0);
            let end = slice_bound(args.get(1), chars.len(), chars.len());
            Ok(Value::from(chars.get(start..end.max(start)).unwrap_or_default().iter().collect::<String>()))
        }),
        _ => Value::Undefined,
    }
}

fn callback(args: &[Value], method: &str) -> Result<Value> {
    match args.first() {
        Some(f @ Value::Function(_)) => Ok(f.clone()),
        Some(other) => Err(TemplateError::expression(format!(
            "{} is not a function (in {method})",
            other.type_name()
        ))),
        None => Err(TemplateError::expression(format!("undefined is not a function (in {method})"))),
    }
}

fn array_property(items: &[Value], name: &str) -> Value {
    let items = items.to_vec();
    match name {
        "length" => Value::Number(items.len() as f64),
        "join" => Value::function(name, move |args| {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(separator) => separator.to_text(),
            };
            Ok(Value::from(items.iter().map(Value::to_text).collect::<Vec<_>>().join(&separator)))
        }),
        "includes" => Value::function(name, move |args| {
            let needle = args.into_iter().next().unwrap_or_default();
            Ok(Value::Bool(items.contains(&needle)))
        }),
        "map" => Value::function(name, move |args| {
            let f = callback(&args, "map")?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| f.call(vec![item.clone(), Value::Number(i as f64)]))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }),
        "filter" => Value::function(name, move |args| {
            let f = callback(&args, "filter")?;
            let mut kept = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if f.call(vec![item.clone(), Value::Number(i as f64)])?.is_truthy() {
                    kept.push(item.clone());
                }
            }
            Ok(Value::Array(kept))
        }),
        "slice" => Value::function(name, move |args| {
            let start = slice_bound(args.first(), items.len(), 0);
            let end = slice_bound(args.get(1), items.len(), items.len());
            Ok(Value::Array(items.get(start..end.max(start)).unwrap_or_default().to_vec()))
        }),
        _ => Value::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(target: Value, method: &str, args: Vec<Value>) -> Value {
        property(&target, method).call(args).unwrap()
    }

    fn strings(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn test_string_methods() {
        let s = Value::from("  Hello World  ");
        assert_eq!(call(s.clone(), "trim", vec![]), Value::from("Hello World"));
        assert_eq!(property(&Value::from("héllo"), "length"), Value::from(5i64));
        assert_eq!(call(Value::from("abc"), "toUpperCase", vec![]), Value::from("ABC"));
        assert_eq!(call(Value::from("a-b-c"), "split", vec![Value::from("-")]), strings(&["a", "b", "c"]));
        assert_eq!(
            call(Value::from("a-b-c"), "replace", vec![Value::from("-"), Value::from("+")]),
            Value::from("a+b-c")
        );
        assert_eq!(call(Value::from("abcdef"), "slice", vec![Value::from(-3i64)]), Value::from("def"));
        assert_eq!(
            call(Value::from("abcdef"), "startsWith", vec![Value::from("abc")]),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_array_methods() {
        let list = strings(&["a", "b", "c"]);
        assert_eq!(call(list.clone(), "join", vec![]), Value::from("a,b,c"));
        assert_eq!(call(list.clone(), "join", vec![Value::from(" | ")]), Value::from("a | b | c"));
        assert_eq!(call(list.clone(), "includes", vec![Value::from("b")]), Value::Bool(true));
        assert_eq!(call(list.clone(), "slice", vec![Value::from(1i64), Value::from(2i64)]), strings(&["b"]));
        assert_eq!(property(&list, "length"), Value::from(3i64));
    }

    #[test]
    fn test_map_and_filter_take_callbacks() {
        let upper = Value::function("upper", |args| {
            Ok(Value::from(args[0].to_text().to_uppercase()))
        });
        let not_b = Value::function("not_b", |args| Ok(Value::Bool(args[0].to_text() != "b")));
        let list = strings(&["a", "b"]);
        assert_eq!(call(list.clone(), "map", vec![upper]), strings(&["A", "B"]));
        assert_eq!(call(list.clone(), "filter", vec![not_b]), strings(&["a"]));
        assert!(property(&list, "map").call(vec![Value::from(1i64)]).is_err());
    }

    #[test]
    fn test_unknown_property_is_undefined() {
        assert_eq!(property(&Value::from("x"), "nope"), Value::Undefined);
        assert_eq!(property(&Value::from(1i64), "length"), Value::Undefined);
    }
}
