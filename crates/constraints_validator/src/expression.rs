//! A small expression language over [`Value`]s.
//!
//! It backs both the default script evaluator and `${...}` expressions in
//! message templates:
//!
//! ```text
//! expr    := or ('?' expr ':' expr)?
//! or      := and ('||' and)*
//! and     := cmp ('&&' cmp)*
//! cmp     := unary (('==' | '!=' | '<' | '<=' | '>' | '>=') unary)?
//! unary   := '!' unary | '-' unary | primary
//! primary := literal | name ('.' name)* | '(' expr ')'
//! ```
//!
//! Literals are numbers, `'text'` or `"text"`, `true`, `false` and `null`.
//! Member access reads bean properties, text-keyed map entries and the
//! `amount`/`currency` of monetary values.

use constraints_core::Value;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// Malformed expression
    #[error("Syntax error in '{expression}': {reason}")]
    Syntax {
        /// The expression
        expression: String,
        /// What went wrong
        reason: String,
    },

    /// Reference to a variable that is not bound
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// Operation applied to values of the wrong type
    #[error("Type error: {0}")]
    Type(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(Value),
    Name(String),
    Op(&'static str),
    Dot,
    Question,
    Colon,
    Open,
    Close,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, ExpressionError> {
    let syntax = |reason: &str| ExpressionError::Syntax {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        Some('\\') => {
                            if let Some(escaped) = chars.get(i + 1) {
                                text.push(*escaped);
                            }
                            i += 2;
                        }
                        Some(ch) if *ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            text.push(*ch);
                            i += 1;
                        }
                        None => return Err(syntax("unterminated string literal")),
                    }
                }
                tokens.push(Token::Literal(Value::Text(text)));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = if literal.contains('.') {
                    Value::Decimal(Decimal::from_str(&literal).map_err(|_| syntax("invalid number"))?)
                } else {
                    Value::Int(literal.parse().map_err(|_| syntax("invalid number"))?)
                };
                tokens.push(Token::Literal(value));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Literal(Value::Bool(true)),
                    "false" => Token::Literal(Value::Bool(false)),
                    "null" => Token::Literal(Value::Null),
                    "and" => Token::Op("&&"),
                    "or" => Token::Op("||"),
                    "not" => Token::Op("!"),
                    "eq" => Token::Op("=="),
                    "ne" => Token::Op("!="),
                    _ => Token::Name(word),
                });
            }
            _ => {
                let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
                let op = ["==", "!=", "<=", ">=", "&&", "||"]
                    .into_iter()
                    .find(|op| *op == two)
                    .or_else(|| ["<", ">", "!", "-"].into_iter().find(|op| op.starts_with(c)))
                    .ok_or_else(|| syntax(&format!("unexpected character '{}'", c)))?;
                i += op.len();
                tokens.push(Token::Op(op));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Variable(String),
    Member(Box<Expr>, String),
    Not(Box<Expr>),
    Negate(Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> ExpressionError {
        ExpressionError::Syntax {
            expression: self.expression.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.position += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expression(&mut self) -> Result<Expr, ExpressionError> {
        let condition = self.or()?;
        if self.peek() != Some(&Token::Question) {
            return Ok(condition);
        }
        self.position += 1;
        let then = self.expression()?;
        if self.next() != Some(Token::Colon) {
            return Err(self.error("expected ':'"));
        }
        let otherwise = self.expression()?;
        Ok(Expr::Conditional(Box::new(condition), Box::new(then), Box::new(otherwise)))
    }

    fn or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.and()?;
        while let Some(op) = self.eat_op(&["||"]) {
            left = Expr::Binary(op, Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.comparison()?;
        while let Some(op) = self.eat_op(&["&&"]) {
            left = Expr::Binary(op, Box::new(left), Box::new(self.comparison()?));
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.unary()?;
        match self.eat_op(&["==", "!=", "<", "<=", ">", ">="]) {
            Some(op) => Ok(Expr::Binary(op, Box::new(left), Box::new(self.unary()?))),
            None => Ok(left),
        }
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat_op(&["!"]).is_some() {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        if self.eat_op(&["-"]).is_some() {
            return Ok(Expr::Negate(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = match self.next() {
            Some(Token::Literal(value)) => Expr::Literal(value),
            Some(Token::Name(name)) => Expr::Variable(name),
            Some(Token::Open) => {
                let inner = self.expression()?;
                if self.next() != Some(Token::Close) {
                    return Err(self.error("expected ')'"));
                }
                inner
            }
            _ => return Err(self.error("expected a value")),
        };
        while self.peek() == Some(&Token::Dot) {
            self.position += 1;
            match self.next() {
                Some(Token::Name(member)) => expr = Expr::Member(Box::new(expr), member),
                _ => return Err(self.error("expected a member name after '.'")),
            }
        }
        Ok(expr)
    }
}

/// A parsed expression.
///
/// # Example
///
/// ```rust
/// use constraints_validator::Expression;
/// use constraints_core::Value;
/// use std::collections::BTreeMap;
///
/// let expr = Expression::parse("inclusive == true ? 'or equal to ' : ''").unwrap();
/// let vars = BTreeMap::from([("inclusive".to_string(), Value::Bool(true))]);
/// assert_eq!(expr.evaluate(&vars).unwrap(), Value::from("or equal to "));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Expr,
}

impl Expression {
    /// Parses an expression.
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let mut parser = Parser {
            expression,
            tokens: tokenize(expression)?,
            position: 0,
        };
        let root = parser.expression()?;
        if parser.position != parser.tokens.len() {
            return Err(parser.error("unexpected trailing tokens"));
        }
        Ok(Self { root })
    }

    /// Evaluates the expression with the given variable bindings.
    pub fn evaluate(&self, variables: &BTreeMap<String, Value>) -> Result<Value, ExpressionError> {
        eval(&self.root, variables)
    }
}

fn eval(expr: &Expr, variables: &BTreeMap<String, Value>) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => variables
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UnknownVariable(name.clone())),
        Expr::Member(target, member) => member_of(&eval(target, variables)?, member),
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, variables)?)?)),
        Expr::Negate(inner) => match eval(inner, variables)? {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Decimal(d) => Ok(Value::Decimal(-d)),
            other => Err(ExpressionError::Type(format!("cannot negate {}", other.type_name()))),
        },
        Expr::Conditional(condition, then, otherwise) => {
            if truthy(&eval(condition, variables)?)? {
                eval(then, variables)
            } else {
                eval(otherwise, variables)
            }
        }
        Expr::Binary("&&", left, right) => {
            Ok(Value::Bool(truthy(&eval(left, variables)?)? && truthy(&eval(right, variables)?)?))
        }
        Expr::Binary("||", left, right) => {
            Ok(Value::Bool(truthy(&eval(left, variables)?)? || truthy(&eval(right, variables)?)?))
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, variables)?;
            let right = eval(right, variables)?;
            match *op {
                "==" => Ok(Value::Bool(equals(&left, &right))),
                "!=" => Ok(Value::Bool(!equals(&left, &right))),
                _ => {
                    let ordering = compare(&left, &right)?;
                    Ok(Value::Bool(match *op {
                        "<" => ordering == Ordering::Less,
                        "<=" => ordering != Ordering::Greater,
                        ">" => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    }))
                }
            }
        }
    }
}

fn truthy(value: &Value) -> Result<bool, ExpressionError> {
    value
        .as_bool()
        .ok_or_else(|| ExpressionError::Type(format!("expected a boolean, found {}", value.type_name())))
}

fn member_of(target: &Value, member: &str) -> Result<Value, ExpressionError> {
    match target {
        Value::Bean(bean) => Ok(bean.property(member).unwrap_or(Value::Null)),
        Value::Map(entries) => Ok(entries
            .iter()
            .find(|(k, _)| k.as_text() == Some(member))
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)),
        Value::Money(money) if member == "amount" => Ok(Value::Decimal(money.amount)),
        Value::Money(money) if member == "currency" => Ok(Value::Text(money.currency.clone())),
        Value::Null => Err(ExpressionError::Type(format!("cannot read '{}' of null", member))),
        other => Err(ExpressionError::Type(format!(
            "{} has no member '{}'",
            other.type_name(),
            member
        ))),
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left.as_decimal(), right.as_decimal()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, ExpressionError> {
    if let (Some(a), Some(b)) = (left.as_decimal(), right.as_decimal()) {
        return Ok(a.cmp(&b));
    }
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Temporal(a), Value::Temporal(b)) => Ok(a.cmp(b)),
        (Value::Money(a), Value::Money(b)) if a.currency == b.currency => Ok(a.amount.cmp(&b.amount)),
        _ => Err(ExpressionError::Type(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constraints_core::{DynamicBean, Money};
    use pretty_assertions::assert_eq;

    fn eval_str(expression: &str, variables: &BTreeMap<String, Value>) -> Result<Value, ExpressionError> {
        Expression::parse(expression)?.evaluate(variables)
    }

    #[test]
    fn test_comparisons_and_logic() {
        let vars = BTreeMap::from([
            ("a".to_string(), Value::Int(3)),
            ("b".to_string(), Value::Decimal(Decimal::new(35, 1))),
        ]);
        assert_eq!(eval_str("a < b && !(a == b)", &vars).unwrap(), Value::Bool(true));
        assert_eq!(eval_str("a >= 3 || false", &vars).unwrap(), Value::Bool(true));
        assert_eq!(eval_str("a == 3.0", &vars).unwrap(), Value::Bool(true));
        assert_eq!(eval_str("-a < 0", &vars).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_member_access() {
        let bean = DynamicBean::new("Booking")
            .with("start", 1)
            .with("end", 5)
            .with("price", Money::of(10, "EUR"));
        let vars = BTreeMap::from([("_this".to_string(), Value::from(bean))]);
        assert_eq!(eval_str("_this.start < _this.end", &vars).unwrap(), Value::Bool(true));
        assert_eq!(eval_str("_this.price.currency == 'EUR'", &vars).unwrap(), Value::Bool(true));
        assert_eq!(eval_str("_this.missing == null", &vars).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_conditional() {
        let vars = BTreeMap::from([("inclusive".to_string(), Value::Bool(false))]);
        assert_eq!(
            eval_str("inclusive == true ? 'or equal to ' : ''", &vars).unwrap(),
            Value::from("")
        );
    }

    #[test]
    fn test_errors() {
        let vars = BTreeMap::new();
        assert!(matches!(eval_str("x > 1", &vars), Err(ExpressionError::UnknownVariable(_))));
        assert!(matches!(eval_str("1 <", &vars), Err(ExpressionError::Syntax { .. })));
        assert!(matches!(eval_str("'a' < 1", &vars), Err(ExpressionError::Type(_))));
        assert!(matches!(eval_str("'open", &vars), Err(ExpressionError::Syntax { .. })));
        assert!(matches!(eval_str("1 ? 2 : 3", &vars), Err(ExpressionError::Type(_))));
    }
}
