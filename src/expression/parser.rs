//! Precedence-climbing parser producing [`Expr`] trees.

use std::sync::Arc;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{Token, tokenize};
use crate::constants::MAX_EXPRESSION_DEPTH;
use crate::core::{Result, TemplateError};

/// Parse a complete expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expression()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse a comma-separated list of expressions (filter arguments).
pub fn parse_argument_list(source: &str) -> Result<Vec<Expr>> {
    let mut parser = Parser::new(source)?;
    let mut args = Vec::new();
    while !parser.at_end() {
        args.push(parser.expression()?);
        if !parser.eat(",") {
            break;
        }
    }
    parser.finish()?;
    Ok(args)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn binary_op(punct: &str) -> Option<(BinaryOp, u8)> {
    let op = match punct {
        "??" => (BinaryOp::Nullish, 1),
        "||" => (BinaryOp::Or, 2),
        "&&" => (BinaryOp::And, 3),
        "==" => (BinaryOp::Eq, 4),
        "!=" => (BinaryOp::NotEq, 4),
        "===" => (BinaryOp::StrictEq, 4),
        "!==" => (BinaryOp::StrictNotEq, 4),
        "<" => (BinaryOp::Lt, 5),
        "<=" => (BinaryOp::LtEq, 5),
        ">" => (BinaryOp::Gt, 5),
        ">=" => (BinaryOp::GtEq, 5),
        "+" => (BinaryOp::Add, 6),
        "-" => (BinaryOp::Sub, 6),
        "*" => (BinaryOp::Mul, 7),
        "/" => (BinaryOp::Div, 7),
        "%" => (BinaryOp::Rem, 7),
        _ => return None,
    };
    Some(op)
}

impl Parser {
    fn new(source: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Punct(p)) => Some(p),
            _ => None,
        }
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek_punct() == Some(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<()> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{punct}'")))
        }
    }

    fn unexpected(&self, context: &str) -> TemplateError {
        match self.peek() {
            Some(token) => TemplateError::syntax(format!("{context}, found {}", describe(token))),
            None => TemplateError::syntax(format!("{context}, found end of expression")),
        }
    }

    fn finish(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(TemplateError::syntax(format!("unexpected {}", describe(token)))),
        }
    }

    /// Enter one more level of nesting.
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(TemplateError::syntax("expression nested too deeply"));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr> {
        self.descend()?;
        let expr = match self.arrow()? {
            Some(arrow) => arrow,
            None => self.conditional()?,
        };
        self.depth -= 1;
        Ok(expr)
    }

    /// Parse an arrow function if one starts at the current position.
    fn arrow(&mut self) -> Result<Option<Expr>> {
        let params = match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
            (Some(Token::Ident(name)), Some(Token::Punct("=>"))) => {
                let params = vec![name.clone()];
                self.pos += 2;
                params
            }
            (Some(Token::Punct("(")), _) => {
                let mut cursor = self.pos + 1;
                let mut params = Vec::new();
                loop {
                    match self.tokens.get(cursor) {
                        Some(Token::Ident(name)) => {
                            params.push(name.clone());
                            cursor += 1;
                            match self.tokens.get(cursor) {
                                Some(Token::Punct(",")) => cursor += 1,
                                Some(Token::Punct(")")) => {}
                                _ => return Ok(None),
                            }
                        }
                        Some(Token::Punct(")")) => break,
                        _ => return Ok(None),
                    }
                }
                if self.tokens.get(cursor + 1) != Some(&Token::Punct("=>")) {
                    return Ok(None);
                }
                self.pos = cursor + 2;
                params
            }
            _ => return Ok(None),
        };
        let body = self.expression()?;
        Ok(Some(Expr::Arrow(params.into(), Arc::new(body))))
    }

    fn conditional(&mut self) -> Result<Expr> {
        let condition = self.binary(1)?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let consequent = self.expression()?;
        self.expect(":")?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional(Box::new(condition), Box::new(consequent), Box::new(alternate)))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.unary()?;
        let mut folds = 0;
        while let Some((op, precedence)) = self.peek_punct().and_then(binary_op) {
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            // Each fold deepens the left spine of the tree.
            self.descend()?;
            folds += 1;
            let right = self.binary(precedence + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= folds;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek_punct() {
            Some("!") => UnaryOp::Not,
            Some("-") => UnaryOp::Neg,
            Some("+") => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        self.descend()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        let mut folds = 0;
        loop {
            if self.at_postfix() {
                self.descend()?;
                folds += 1;
            }
            if self.eat(".") {
                match self.peek().cloned() {
                    Some(Token::Ident(name)) => {
                        self.pos += 1;
                        expr = Expr::Member(Box::new(expr), name);
                    }
                    _ => return Err(self.unexpected("expected property name after '.'")),
                }
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat("(") {
                let args = self.list(")")?;
                expr = Expr::Call(Box::new(expr), args);
            } else {
                self.depth -= folds;
                return Ok(expr);
            }
        }
    }

    fn at_postfix(&self) -> bool {
        matches!(self.peek_punct(), Some("." | "[" | "("))
    }

    /// Comma-separated expressions up to `close`; trailing commas are accepted.
    fn list(&mut self, close: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(",") {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().cloned().ok_or_else(|| self.unexpected("expected a value"))?;
        self.pos += 1;
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                _ => Expr::Ident(name),
            }),
            Token::Punct("(") => {
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Punct("[") => Ok(Expr::Array(self.list("]")?)),
            Token::Punct("{") => self.object(),
            other => {
                self.pos -= 1;
                Err(TemplateError::syntax(format!("unexpected {}", describe(&other))))
            }
        }
    }

    fn object(&mut self) -> Result<Expr> {
        let mut entries = Vec::new();
        while !self.eat("}") {
            let key = match self.peek().cloned() {
                Some(Token::Ident(name)) => name,
                Some(Token::Str(s)) => s,
                Some(Token::Number(n)) => super::value::format_number(n),
                _ => return Err(self.unexpected("expected object key")),
            };
            let shorthand = matches!(self.peek(), Some(Token::Ident(_)));
            self.pos += 1;
            let value = if self.eat(":") {
                self.expression()?
            } else if shorthand {
                Expr::Ident(key.clone())
            } else {
                return Err(self.unexpected("expected ':' after object key"));
            };
            entries.push((key, value));
            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", super::value::format_number(*n)),
        Token::Str(s) => format!("string {s:?}"),
        Token::Ident(name) => format!("'{name}'"),
        Token::Punct(p) => format!("'{p}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("a + b * c").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                ident("a"),
                Box::new(Expr::Binary(BinaryOp::Mul, ident("b"), ident("c")))
            )
        );
    }

    #[test]
    fn test_left_associative() {
        let expr = parse_expression("a - b - c").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Sub,
                Box::new(Expr::Binary(BinaryOp::Sub, ident("a"), ident("b"))),
                ident("c")
            )
        );
    }

    #[test]
    fn test_call_with_object_literal() {
        let expr = parse_expression(r#"include("article.html", {text: "muh", title})"#).unwrap();
        let Expr::Call(callee, args) = expr else {
            panic!("expected call");
        };
        assert_eq!(callee, ident("include"));
        assert_eq!(args.len(), 2);
        assert_eq!(
            args[1],
            Expr::Object(vec![
                ("text".to_string(), Expr::Str("muh".to_string())),
                ("title".to_string(), Expr::Ident("title".to_string())),
            ])
        );
    }

    #[test]
    fn test_arrow_functions() {
        assert!(matches!(parse_expression("x => x.title").unwrap(), Expr::Arrow(params, _) if params.len() == 1));
        assert!(matches!(parse_expression("(a, b) => a + b").unwrap(), Expr::Arrow(params, _) if params.len() == 2));
        assert!(matches!(parse_expression("() => 1").unwrap(), Expr::Arrow(params, _) if params.is_empty()));
        // A parenthesised expression is not an arrow.
        assert!(matches!(parse_expression("(a)").unwrap(), Expr::Ident(_)));
    }

    #[test]
    fn test_conditional_and_nullish() {
        let expr = parse_expression("a ?? b ? 'y' : 'n'").unwrap();
        assert!(matches!(expr, Expr::Conditional(cond, _, _) if matches!(*cond, Expr::Binary(BinaryOp::Nullish, _, _))));
    }

    #[test]
    fn test_argument_list() {
        let args = parse_argument_list(r#""Ahoy", meta.authors[1]"#).unwrap();
        assert_eq!(args.len(), 2);
        assert!(parse_argument_list("").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_expression("a b").unwrap_err();
        assert_eq!(err.to_string(), "unexpected 'b'");
    }

    #[test]
    fn test_nesting_is_bounded() {
        let parens = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        let nots = format!("{}1", "!".repeat(500));
        let sums = vec!["1"; 400].join("+");
        let members = format!("a{}", ".b".repeat(300));
        for source in [parens, nots, sums, members] {
            let err = parse_expression(&source).unwrap_err();
            assert_eq!(err.to_string(), "expression nested too deeply");
        }

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse_expression(&shallow).unwrap(), Expr::Number(1.0));
        assert!(parse_expression(&vec!["1"; 30].join("+")).is_ok());
    }

    #[test]
    fn test_missing_close() {
        let err = parse_expression("f(1, 2").unwrap_err();
        assert!(err.to_string().contains("expected ')'"));
    }
}
