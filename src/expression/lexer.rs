//! Tokenizer for placeholder expressions.

use crate::core::{Result, TemplateError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    /// Operators and punctuation, stored as their source text.
    Punct(&'static str),
}

/// Operators ordered longest first so the scanner is greedy.
const PUNCTUATION: &[&str] = &[
    "===", "!==", "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "(", ")", "[", "]", "{", "}",
    ",", ".", ":", "?", "!", "<", ">", "+", "-", "*", "/", "%",
];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit))
        {
            let (number, next) = scan_number(&chars, pos)?;
            tokens.push(Token::Number(number));
            pos = next;
        } else if c == '"' || c == '\'' {
            let (text, next) = scan_string(&chars, pos)?;
            tokens.push(Token::Str(text));
            pos = next;
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '$')
            {
                pos += 1;
            }
            tokens.push(Token::Ident(chars[start..pos].iter().collect()));
        } else {
            let punct = PUNCTUATION
                .iter()
                .find(|p| {
                    p.chars().enumerate().all(|(i, pc)| chars.get(pos + i) == Some(&pc))
                })
                .ok_or_else(|| TemplateError::syntax(format!("unexpected character '{c}'")))?;
            tokens.push(Token::Punct(punct));
            pos += punct.len();
        }
    }

    Ok(tokens)
}

fn scan_number(chars: &[char], start: usize) -> Result<(f64, usize)> {
    let mut pos = start;
    while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
        pos += 1;
    }
    if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
        pos += 1;
        if pos < chars.len() && (chars[pos] == '+' || chars[pos] == '-') {
            pos += 1;
        }
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    let text: String = chars[start..pos].iter().collect();
    text.parse()
        .map(|n| (n, pos))
        .map_err(|_| TemplateError::syntax(format!("invalid number literal '{text}'")))
}

fn scan_string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut pos = start + 1;
    let mut text = String::new();

    while pos < chars.len() {
        let c = chars[pos];
        if c == quote {
            return Ok((text, pos + 1));
        }
        if c == '\\' {
            pos += 1;
            let escaped = chars
                .get(pos)
                .ok_or_else(|| TemplateError::syntax("unterminated string literal"))?;
            match escaped {
                'n' => text.push('\n'),
                't' => text.push('\t'),
                'r' => text.push('\r'),
                '0' => text.push('\0'),
                'u' => {
                    let hex: String = chars.iter().skip(pos + 1).take(4).collect();
                    let code = u32::from_str_radix(&hex, 16)
                        .ok()
                        .filter(|_| hex.len() == 4)
                        .and_then(char::from_u32)
                        .ok_or_else(|| {
                            TemplateError::syntax(format!("invalid unicode escape '\\u{hex}'"))
                        })?;
                    text.push(code);
                    pos += 4;
                }
                other => text.push(*other),
            }
        } else {
            text.push(c);
        }
        pos += 1;
    }

    Err(TemplateError::syntax("unterminated string literal"))
}
