//! The placeholder expression language.
//!
//! Expressions are small: literals, identifiers, property and index access,
//! calls, array and object literals, arrow functions and the usual infix
//! operators. There is no statement syntax and no access to anything outside
//! the [`Scope`] an expression is evaluated in.
//!
//! ```
//! use stitch_cli::expression::{Scope, Value, evaluate, parse_expression};
//!
//! let scope = Scope::new([("name".to_string(), Value::from("world"))].into());
//! let expr = parse_expression("'hello ' + name.toUpperCase()").unwrap();
//! assert_eq!(evaluate(&expr, &scope).unwrap(), Value::from("hello WORLD"));
//! ```

pub mod ast;
pub mod eval;
mod lexer;
mod methods;
pub mod parser;
pub mod value;

pub use ast::Expr;
pub use eval::{Scope, evaluate};
pub use parser::{parse_argument_list, parse_expression};
pub use value::{Function, Map, Pending, Value, format_number};
