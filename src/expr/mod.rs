//! Cost and default-value expression evaluation
//!
//! Field cost formulas and argument default-value formulas are opaque
//! expression strings carried on the schema. The engine evaluates them through
//! the [`ExpressionEvaluator`] trait so a host application can plug in a richer
//! expression language; the built-in [`SimpleEvaluator`] covers variable
//! substitution and arithmetic, which is all the core contract requires.
//!
//! Cost expressions are evaluated with the variable `childScore` bound to the
//! combined complexity of the field's children, plus one variable per resolved
//! field argument. A leading `#` on variable names is accepted, so legacy
//! `#childScore`-style expressions work unchanged.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{found}'")]
    UnexpectedToken { found: String },

    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("operand is not numeric: {value}")]
    NonNumericOperand { value: String },
}

/// Evaluates an expression against a set of named variable bindings.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        expression: &str,
        bindings: &HashMap<String, Value>,
    ) -> Result<Value, ExprError>;
}

/// Built-in evaluator: numbers, single-quoted strings, variables,
/// `+ - * /`, unary minus and parentheses.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleEvaluator;

impl ExpressionEvaluator for SimpleEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        bindings: &HashMap<String, Value>,
    ) -> Result<Value, ExprError> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            bindings,
        };
        let value = parser.expression()?;
        parser.expect_end()?;
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '\'' {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(ExprError::UnexpectedEnd);
                }
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::UnexpectedToken { found: text })?;
                tokens.push(Token::Number(number));
            }
            '#' | '_' | 'a'..='z' | 'A'..='Z' => {
                // leading '#' marks a variable in the legacy syntax; strip it
                let start = if c == '#' { i + 1 } else { i };
                i = start;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                if i == start {
                    return Err(ExprError::UnexpectedCharacter {
                        found: c,
                        offset: start,
                    });
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(ExprError::UnexpectedCharacter {
                    found: other,
                    offset: i,
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    bindings: &'a HashMap<String, Value>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> Result<(), ExprError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ExprError::UnexpectedToken {
                found: format!("{token:?}"),
            }),
        }
    }

    fn expression(&mut self) -> Result<Value, ExprError> {
        let mut left = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus | Token::Minus => {
                    let minus = matches!(op, Token::Minus);
                    self.pos += 1;
                    let right = self.term()?;
                    let (l, r) = (as_number(&left)?, as_number(&right)?);
                    left = number(if minus { l - r } else { l + r });
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Value, ExprError> {
        let mut left = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star | Token::Slash => {
                    let div = matches!(op, Token::Slash);
                    self.pos += 1;
                    let right = self.factor()?;
                    let (l, r) = (as_number(&left)?, as_number(&right)?);
                    left = number(if div { l / r } else { l * r });
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Value, ExprError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(number(n)),
            Some(Token::Str(s)) => Ok(Value::String(s)),
            Some(Token::Ident(name)) => self
                .bindings
                .get(&name)
                .cloned()
                .ok_or(ExprError::UnknownVariable { name }),
            Some(Token::Minus) => {
                let inner = self.factor()?;
                Ok(number(-as_number(&inner)?))
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(ExprError::UnexpectedToken {
                        found: format!("{token:?}"),
                    }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(token) => Err(ExprError::UnexpectedToken {
                found: format!("{token:?}"),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

fn as_number(value: &Value) -> Result<f64, ExprError> {
    value
        .as_f64()
        .ok_or_else(|| ExprError::NonNumericOperand {
            value: value.to_string(),
        })
}

/// Emit integral results as integers so default values round-trip cleanly.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
