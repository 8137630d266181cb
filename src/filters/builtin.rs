//! The built-in filter set.

use futures::future::join_all;

use super::FilterRegistry;
use super::format::{self, DEFAULT_LOCALE, FALLBACK_LOCALE};
use crate::core::{Result, TemplateError};
use crate::expression::{Map, Value};
use crate::templating::escape::{escape_html, url_encode_component};

pub(super) fn register_all(registry: &mut FilterRegistry) {
    registry
        .register("safe", safe)
        .register("json", json)
        .register("date", date)
        .register("time", time)
        .register("currency", currency)
        .register("numberFormat", number_format)
        .register("limit", limit)
        .register("reverse", reverse)
        .register("sort", sort)
        .register("last", last)
        .register("htmlentities", htmlentities)
        .register("urlencode", urlencode)
        .register("async", unwrap_async)
        .register("each", each)
        .register("pipe", pipe);
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Locale tag argument; anything but text selects the default.
fn locale_arg(args: &[Value], index: usize) -> Option<&str> {
    args.get(index).and_then(Value::as_str)
}

fn options_arg(args: &[Value], index: usize) -> Option<&Map> {
    args.get(index).and_then(Value::as_object)
}

/// Elements of an iterable input: arrays as-is, strings by character.
fn elements(input: Value) -> Result<Vec<Value>> {
    match input {
        Value::Array(items) => Ok(items),
        Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
        nullish @ (Value::Undefined | Value::Null) => Err(TemplateError::expression(format!(
            "{} is not iterable",
            nullish.type_name()
        ))),
        _ => Ok(Vec::new()),
    }
}

fn count_arg(value: &Value, default: f64) -> usize {
    let n = if value.is_undefined() { default } else { value.to_number() };
    if n.is_nan() || n <= 0.0 { 0 } else { n as usize }
}

/// Marks the value as safe so the placeholder's output is not escaped.
fn safe(input: Value, _args: Vec<Value>) -> Result<Value> {
    Ok(Value::safe(input))
}

fn json(input: Value, args: Vec<Value>) -> Result<Value> {
    let Some(json) = input.to_json() else {
        return Ok(Value::Undefined);
    };
    let text = if arg(&args, 0).is_truthy() {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    text.map(Value::from).map_err(|e| TemplateError::expression(e.to_string()))
}

fn date(input: Value, args: Vec<Value>) -> Result<Value> {
    let when = format::parse_date(&input)?;
    let locale = format::locale(locale_arg(&args, 0), DEFAULT_LOCALE);
    format::format_date(&when, locale, options_arg(&args, 1)).map(Value::from)
}

fn time(input: Value, args: Vec<Value>) -> Result<Value> {
    let when = format::parse_date(&input)?;
    let locale = format::locale(locale_arg(&args, 0), DEFAULT_LOCALE);
    format::format_time(&when, locale, options_arg(&args, 1)).map(Value::from)
}

fn currency(input: Value, args: Vec<Value>) -> Result<Value> {
    let locale = format::locale(locale_arg(&args, 0), DEFAULT_LOCALE);
    let code = args.get(1).and_then(Value::as_str).unwrap_or("eur");
    format::format_currency(input.to_number(), locale, code).map(Value::from)
}

fn number_format(input: Value, args: Vec<Value>) -> Result<Value> {
    let locale = format::locale(locale_arg(&args, 0), FALLBACK_LOCALE);
    let options = options_arg(&args, 1);
    let digits = |key: &str| {
        options
            .and_then(|o| o.get(key))
            .filter(|v| !v.is_nullish())
            .map(|v| count_arg(v, 0.0).min(20))
    };
    let min = digits("minimumFractionDigits").unwrap_or(0);
    let max = digits("maximumFractionDigits").unwrap_or(min.max(3));
    Ok(Value::from(format::format_decimal(input.to_number(), locale, min, max)))
}

/// The first `n` elements.
fn limit(input: Value, args: Vec<Value>) -> Result<Value> {
    let n = count_arg(&arg(&args, 0), f64::NAN);
    Ok(Value::Array(elements(input)?.into_iter().take(n).collect()))
}

fn reverse(input: Value, _args: Vec<Value>) -> Result<Value> {
    let mut items = elements(input)?;
    items.reverse();
    Ok(Value::Array(items))
}

/// Sorted by text form; `undefined` elements go last.
fn sort(input: Value, _args: Vec<Value>) -> Result<Value> {
    let mut items = elements(input)?;
    items.sort_by(|a, b| {
        a.is_undefined()
            .cmp(&b.is_undefined())
            .then_with(|| a.to_text().cmp(&b.to_text()))
    });
    Ok(Value::Array(items))
}

/// The last `n` elements (default 1), most recent first.
fn last(input: Value, args: Vec<Value>) -> Result<Value> {
    let n = count_arg(&arg(&args, 0), 1.0);
    Ok(Value::Array(elements(input)?.into_iter().rev().take(n).collect()))
}

fn htmlentities(input: Value, _args: Vec<Value>) -> Result<Value> {
    Ok(Value::safe(escape_html(&input.to_text())))
}

fn urlencode(input: Value, _args: Vec<Value>) -> Result<Value> {
    Ok(Value::from(url_encode_component(&input.to_text())))
}

fn call_if_function(value: Value) -> Result<Value> {
    match value {
        Value::Function(f) => f.call(Vec::new()),
        other => Ok(other),
    }
}

/// Await a pending input, then invoke the outcome if it is a function.
fn unwrap_async(input: Value, _args: Vec<Value>) -> Result<Value> {
    match input {
        Value::Pending(pending) => Ok(Value::pending(async move {
            call_if_function(pending.resolve().await?)
        })),
        other => call_if_function(other),
    }
}

/// Map each element through the callback and concatenate the results.
fn each(input: Value, args: Vec<Value>) -> Result<Value> {
    if !input.is_truthy() {
        return Ok(Value::from(""));
    }
    let items = match input {
        Value::Array(items) => items,
        single => vec![single],
    };
    let callback = arg(&args, 0);
    let mapped = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| callback.call(vec![item, Value::Number(index as f64)]))
        .collect::<Result<Vec<_>>>()?;

    if !mapped.iter().any(|v| matches!(v, Value::Pending(_))) {
        return Ok(Value::from(mapped.iter().map(Value::to_text).collect::<String>()));
    }
    Ok(Value::pending(async move {
        let settled = join_all(mapped.into_iter().map(|v| async move {
            match v {
                Value::Pending(pending) => pending.resolve().await,
                other => Ok(other),
            }
        }))
        .await;
        let mut out = String::new();
        for value in settled {
            out.push_str(&value?.to_text());
        }
        Ok(Value::from(out))
    }))
}

fn pipe(input: Value, args: Vec<Value>) -> Result<Value> {
    arg(&args, 0).call(vec![input])
}
