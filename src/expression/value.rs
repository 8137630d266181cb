//! Runtime values of the expression language.
//!
//! [`Value`] mirrors the JSON data model callers pass in, extended with the
//! things an expression can produce at runtime: callable functions, pending
//! (asynchronous) results and text tagged as already safe for output.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::core::{Result, TemplateError};

/// Object storage used by [`Value::Object`] and for document data.
pub type Map = BTreeMap<String, Value>;

type NativeFn = dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync;

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Function(Function),
    Pending(Pending),
    /// Output that must not be HTML-escaped when it ends up in a placeholder.
    Safe(Box<Value>),
}

/// A callable value.
///
/// Helpers, caller-supplied callbacks, bound methods and arrow functions all
/// share this representation. Asynchronous functions return [`Value::Pending`].
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, call: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        (self.call)(args)
    }
}

/// A value that is not available yet.
///
/// The underlying future is shared, so a pending value can be cloned and
/// awaited from several places; all of them observe the same outcome.
#[derive(Clone)]
pub struct Pending(Shared<BoxFuture<'static, Result<Value>>>);

impl Pending {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Self(future.boxed().shared())
    }

    pub async fn resolve(self) -> Result<Value> {
        self.0.await
    }
}

impl Value {
    /// Wrap a native closure as a function value.
    pub fn function<F>(name: &str, call: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Function(Function::new(name, call))
    }

    /// Wrap a future as a pending value.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::Pending(Pending::new(future))
    }

    /// Tag text as safe so the rendering engine will not escape it.
    pub fn safe(inner: impl Into<Value>) -> Self {
        match inner.into() {
            already @ Value::Safe(_) => already,
            other => Value::Safe(Box::new(other)),
        }
    }

    /// Build an object from key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Safe(inner) => inner.as_str(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Split off the safe tag, returning the inner value and whether it was set.
    pub fn unwrap_safe(self) -> (Value, bool) {
        match self {
            Value::Safe(inner) => (inner.unwrap_safe().0, true),
            other => (other, false),
        }
    }

    /// Name of the value's type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Pending(_) => "pending value",
            Value::Safe(inner) => inner.type_name(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Safe(inner) => inner.is_truthy(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Pending(_) => true,
        }
    }

    /// Numeric view of the value, `NaN` when there is none.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Null => 0.0,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Safe(inner) => inner.to_number(),
            _ => f64::NAN,
        }
    }

    /// Text form of the value as it is written into documents.
    ///
    /// `undefined` and `null` produce empty text.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items.iter().map(Value::to_text).collect::<Vec<_>>().join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(f) => format!("[function {}]", f.name()),
            Value::Pending(_) => "[pending]".to_string(),
            Value::Safe(inner) => inner.to_text(),
        }
    }

    /// JSON form of the value; `None` for values JSON cannot represent.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Undefined | Value::Function(_) | Value::Pending(_) => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Number(n) => Some(number_to_json(*n)),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Array(items) => Some(serde_json::Value::Array(
                items.iter().map(|item| item.to_json().unwrap_or(serde_json::Value::Null)).collect(),
            )),
            Value::Object(map) => Some(serde_json::Value::Object(
                map.iter().filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json))).collect(),
            )),
            Value::Safe(inner) => inner.to_json(),
        }
    }

    /// Invoke the value as a function.
    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        match self {
            Value::Function(f) => f.call(args),
            other => Err(TemplateError::expression(format!(
                "{} is not a function",
                other.type_name()
            ))),
        }
    }
}

/// Format a number the way it is displayed in documents.
///
/// Integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Object(map) => f.debug_map().entries(map).finish(),
            Value::Function(func) => write!(f, "[function {}]", func.name()),
            Value::Pending(_) => write!(f, "[pending]"),
            Value::Safe(inner) => write!(f, "safe({inner:?})"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Safe(a), Value::Safe(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.call, &b.call),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_display_drops_fraction() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Undefined.to_text(), "");
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::from(vec![Value::from(1i64), Value::from("a")]).to_text(), "1,a");
        assert_eq!(Value::object([("a", Value::Null)]).to_text(), "[object Object]");
        assert_eq!(Value::safe("<b>").to_text(), "<b>");
    }

    #[test]
    fn test_json_round_trip_keeps_integers() {
        let value = Value::from(json!({"n": 3, "f": 1.5, "list": [true, null]}));
        assert_eq!(value.to_json(), Some(json!({"n": 3, "f": 1.5, "list": [true, null]})));
    }

    #[test]
    fn test_json_skips_functions_in_objects() {
        let value = Value::object([
            ("keep", Value::from("x")),
            ("drop", Value::function("f", |_| Ok(Value::Undefined))),
        ]);
        assert_eq!(value.to_json(), Some(json!({"keep": "x"})));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
        assert!(!Value::safe(Value::Null).is_truthy());
    }

    #[test]
    fn test_safe_does_not_nest() {
        let (inner, was_safe) = Value::safe(Value::safe("x")).unwrap_safe();
        assert!(was_safe);
        assert_eq!(inner, Value::from("x"));
    }

    #[tokio::test]
    async fn test_pending_is_shared() {
        let pending = Pending::new(async { Ok(Value::from(42i64)) });
        let other = pending.clone();
        assert_eq!(pending.resolve().await, Ok(Value::from(42i64)));
        assert_eq!(other.resolve().await, Ok(Value::from(42i64)));
    }

    #[test]
    fn test_calling_a_non_function_fails() {
        let err = Value::from(1i64).call(vec![]).unwrap_err();
        assert_eq!(err.to_string(), "number is not a function");
    }
}
