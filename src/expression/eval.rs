//! Tree-walking interpreter for [`Expr`].
//!
//! Evaluation is synchronous. Asynchronous work (includes, fetch helpers,
//! caller callbacks) surfaces as [`Value::Pending`] and is awaited by the
//! rendering engine, never inside the interpreter.

use std::cell::Cell;
use std::sync::Arc;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::methods;
use super::value::{Map, Value, format_number};
use crate::constants::MAX_EVALUATION_DEPTH;
use crate::core::{Result, TemplateError};

/// Variables visible to an expression.
///
/// Scopes form a chain: arrow functions evaluate their body in a child scope
/// holding their parameters, and document data sits in front of the helper
/// scope so that caller data shadows helpers. Nothing outside the chain is
/// reachable from an expression.
#[derive(Clone, Default)]
pub struct Scope {
    vars: Arc<Map>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new(vars: Map) -> Self {
        Self {
            vars: Arc::new(vars),
            parent: None,
        }
    }

    /// A scope whose own variables shadow everything in `parent`.
    pub fn child(parent: &Scope, vars: Map) -> Self {
        Self {
            vars: Arc::new(vars),
            parent: Some(Arc::new(parent.clone())),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        match self.vars.get(name) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.lookup(name)),
        }
    }
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts one level of evaluation on this thread while alive.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<Self> {
        let depth = DEPTH.with(|d| {
            let next = d.get() + 1;
            d.set(next);
            next
        });
        let guard = Self;
        if depth > MAX_EVALUATION_DEPTH {
            return Err(TemplateError::expression("maximum call stack size exceeded"));
        }
        Ok(guard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Evaluate an expression in `scope`.
///
/// Evaluation never suspends, so nesting is tracked per thread. Runaway
/// recursion through arrow functions fails with an expression error.
pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<Value> {
    let _guard = DepthGuard::enter()?;
    evaluate_node(expr, scope)
}

fn evaluate_node(expr: &Expr, scope: &Scope) -> Result<Value> {
    match expr {
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Ident(name) => scope
            .lookup(name)
            .ok_or_else(|| TemplateError::expression(format!("{name} is not defined"))),
        Expr::Array(items) => {
            items.iter().map(|item| evaluate(item, scope)).collect::<Result<Vec<_>>>().map(Value::Array)
        }
        Expr::Object(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), evaluate(value, scope)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Member(object, name) => member(evaluate(object, scope)?, name),
        Expr::Index(object, index) => {
            let target = evaluate(object, scope)?;
            match (evaluate(index, scope)?.unwrap_safe().0, target) {
                (Value::Number(n), Value::Array(items)) => {
                    Ok(array_get(&items, n).cloned().unwrap_or_default())
                }
                (Value::String(key), target) => member(target, &key),
                (Value::Number(n), target) => member(target, &format_number(n)),
                (other, _) => Err(TemplateError::expression(format!(
                    "cannot index with a value of type {}",
                    other.type_name()
                ))),
            }
        }
        Expr::Call(callee, args) => {
            let function = evaluate(callee, scope)?;
            let args = args.iter().map(|arg| evaluate(arg, scope)).collect::<Result<Vec<_>>>()?;
            match function {
                Value::Function(f) => f.call(args),
                other => Err(TemplateError::expression(format!(
                    "{} is not a function",
                    callee_name(callee).unwrap_or(other.type_name())
                ))),
            }
        }
        Expr::Unary(op, operand) => {
            let value = evaluate(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Binary(op, left, right) => binary(*op, left, right, scope),
        Expr::Conditional(condition, consequent, alternate) => {
            if evaluate(condition, scope)?.is_truthy() {
                evaluate(consequent, scope)
            } else {
                evaluate(alternate, scope)
            }
        }
        Expr::Arrow(params, body) => {
            let params = Arc::clone(params);
            let body = Arc::clone(body);
            let captured = scope.clone();
            Ok(Value::function("anonymous", move |args| {
                let mut bound = Map::new();
                let mut args = args.into_iter();
                for param in params.iter() {
                    bound.insert(param.clone(), args.next().unwrap_or_default());
                }
                evaluate(&body, &Scope::child(&captured, bound))
            }))
        }
    }
}

fn callee_name(callee: &Expr) -> Option<&str> {
    match callee {
        Expr::Ident(name) | Expr::Member(_, name) => Some(name),
        _ => None,
    }
}

fn array_get(items: &[Value], index: f64) -> Option<&Value> {
    if index.fract() != 0.0 || index < 0.0 {
        return None;
    }
    items.get(index as usize)
}

/// Read a property of a value.
pub(crate) fn member(target: Value, name: &str) -> Result<Value> {
    match target {
        Value::Undefined | Value::Null => Err(TemplateError::expression(format!(
            "Cannot read properties of {} (reading '{name}')",
            target.type_name()
        ))),
        Value::Safe(inner) => member(*inner, name),
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or_default()),
        other => Ok(methods::property(&other, name)),
    }
}

fn binary(op: BinaryOp, left: &Expr, right: &Expr, scope: &Scope) -> Result<Value> {
    let lhs = evaluate(left, scope)?;
    match op {
        BinaryOp::And => return if lhs.is_truthy() { evaluate(right, scope) } else { Ok(lhs) },
        BinaryOp::Or => return if lhs.is_truthy() { Ok(lhs) } else { evaluate(right, scope) },
        BinaryOp::Nullish => {
            return if lhs.is_nullish() { evaluate(right, scope) } else { Ok(lhs) };
        }
        _ => {}
    }

    let (lhs, _) = lhs.unwrap_safe();
    let (rhs, _) = evaluate(right, scope)?.unwrap_safe();
    let value = match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(_) | Value::Array(_) | Value::Object(_), _)
            | (_, Value::String(_) | Value::Array(_) | Value::Object(_)) => {
                Value::String(format!("{}{}", lhs.to_text(), rhs.to_text()))
            }
            _ => Value::Number(lhs.to_number() + rhs.to_number()),
        },
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::Eq => Value::Bool(loose_eq(&lhs, &rhs)),
        BinaryOp::NotEq => Value::Bool(!loose_eq(&lhs, &rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs == rhs),
        BinaryOp::StrictNotEq => Value::Bool(lhs != rhs),
        BinaryOp::Lt => Value::Bool(compare(&lhs, &rhs).is_some_and(|o| o.is_lt())),
        BinaryOp::LtEq => Value::Bool(compare(&lhs, &rhs).is_some_and(|o| o.is_le())),
        BinaryOp::Gt => Value::Bool(compare(&lhs, &rhs).is_some_and(|o| o.is_gt())),
        BinaryOp::GtEq => Value::Bool(compare(&lhs, &rhs).is_some_and(|o| o.is_ge())),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => unreachable!("short-circuited above"),
    };
    Ok(value)
}

fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (a, b) if a.is_nullish() && b.is_nullish() => true,
        (Value::Number(_) | Value::Bool(_), Value::String(_))
        | (Value::String(_), Value::Number(_) | Value::Bool(_))
        | (Value::Bool(_), Value::Number(_))
        | (Value::Number(_), Value::Bool(_)) => lhs.to_number() == rhs.to_number(),
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}
