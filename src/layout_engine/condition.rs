//! Occupancy conditions attached to template nodes.
//!
//! A condition is a boolean expression over `len` (also spelled `length` or
//! `n`), the number of windows the node would hold after accepting one more:
//!
//! ```text
//! len <= 3
//! n == 1 || (len > 4 && !(len == 6))
//! ```

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};

use super::LayoutError;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Condition {
    source: String,
    expr: BoolExpr,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Condition, LayoutError> {
        let tokens = tokenize(source).map_err(|message| invalid(source, message))?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or().map_err(|message| invalid(source, message))?;
        if let Some(tok) = parser.peek() {
            return Err(invalid(source, format!("unexpected {tok:?} after expression")));
        }
        Ok(Condition { source: source.to_owned(), expr })
    }

    /// Evaluates the condition for a node that would hold `len` windows.
    pub fn evaluate(&self, len: usize) -> bool { self.expr.eval(len as i64) }

    pub fn source(&self) -> &str { &self.source }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool { self.source == other.source }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.source) }
}

impl TryFrom<String> for Condition {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> { Condition::parse(&value) }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self { value.source }
}

fn invalid(source: &str, message: String) -> LayoutError {
    LayoutError::InvalidCondition {
        expr: source.to_owned(),
        message,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum IntExpr {
    Len,
    Lit(i64),
}

impl IntExpr {
    fn eval(self, len: i64) -> i64 {
        match self {
            IntExpr::Len => len,
            IntExpr::Lit(v) => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
enum BoolExpr {
    Lit(bool),
    Cmp(IntExpr, CmpOp, IntExpr),
    Not(Box<BoolExpr>),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
}

impl BoolExpr {
    fn eval(&self, len: i64) -> bool {
        match self {
            BoolExpr::Lit(b) => *b,
            BoolExpr::Cmp(lhs, op, rhs) => {
                let (l, r) = (lhs.eval(len), rhs.eval(len));
                match op {
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                    CmpOp::Lt => l < r,
                    CmpOp::Le => l <= r,
                    CmpOp::Gt => l > r,
                    CmpOp::Ge => l >= r,
                }
            }
            BoolExpr::Not(inner) => !inner.eval(len),
            BoolExpr::And(a, b) => a.eval(len) && b.eval(len),
            BoolExpr::Or(a, b) => a.eval(len) || b.eval(len),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    LParen,
    RParen,
    Not,
    And,
    Or,
    Cmp(CmpOp),
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '&' | '|' => {
                chars.next();
                if chars.next_if_eq(&ch).is_none() {
                    return Err(format!("expected `{ch}{ch}`"));
                }
                tokens.push(if ch == '&' { Token::And } else { Token::Or });
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Cmp(CmpOp::Ne));
                } else {
                    tokens.push(Token::Not);
                }
            }
            '=' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err("expected `==`".to_owned());
                }
                tokens.push(Token::Cmp(CmpOp::Eq));
            }
            '<' | '>' => {
                chars.next();
                let or_equal = chars.next_if_eq(&'=').is_some();
                tokens.push(Token::Cmp(match (ch, or_equal) {
                    ('<', false) => CmpOp::Lt,
                    ('<', true) => CmpOp::Le,
                    (_, false) => CmpOp::Gt,
                    (_, true) => CmpOp::Ge,
                }));
            }
            '-' | '0'..='9' => tokens.push(Token::Int(lex_int(&mut chars)?)),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(c) = chars.next_if(|c| c.is_ascii_alphanumeric() || *c == '_') {
                    ident.push(c);
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }

    Ok(tokens)
}

fn lex_int(chars: &mut Peekable<Chars<'_>>) -> Result<i64, String> {
    let mut digits = String::new();
    if let Some(sign) = chars.next_if_eq(&'-') {
        digits.push(sign);
    }
    while let Some(d) = chars.next_if(char::is_ascii_digit) {
        digits.push(d);
    }
    digits.parse().map_err(|_| format!("invalid integer `{digits}`"))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> { self.tokens.get(self.pos) }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<BoolExpr, String> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            lhs = BoolExpr::Or(Box::new(lhs), Box::new(self.and()?));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<BoolExpr, String> {
        let mut lhs = self.unary()?;
        while self.eat(&Token::And) {
            lhs = BoolExpr::And(Box::new(lhs), Box::new(self.unary()?));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<BoolExpr, String> {
        if self.eat(&Token::Not) {
            return Ok(BoolExpr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<BoolExpr, String> {
        if self.eat(&Token::LParen) {
            let inner = self.or()?;
            if !self.eat(&Token::RParen) {
                return Err("unclosed `(`".to_owned());
            }
            return Ok(inner);
        }
        let literal = match self.peek() {
            Some(Token::Ident(name)) if name == "true" => Some(true),
            Some(Token::Ident(name)) if name == "false" => Some(false),
            _ => None,
        };
        if let Some(value) = literal {
            self.pos += 1;
            return Ok(BoolExpr::Lit(value));
        }
        let lhs = self.operand()?;
        let Some(Token::Cmp(op)) = self.bump() else {
            return Err("expected a comparison operator".to_owned());
        };
        let rhs = self.operand()?;
        Ok(BoolExpr::Cmp(lhs, op, rhs))
    }

    fn operand(&mut self) -> Result<IntExpr, String> {
        match self.bump() {
            Some(Token::Int(v)) => Ok(IntExpr::Lit(v)),
            Some(Token::Ident(name)) if matches!(name.as_str(), "len" | "length" | "n") => {
                Ok(IntExpr::Len)
            }
            Some(Token::Ident(name)) => Err(format!("unknown variable `{name}`")),
            Some(tok) => Err(format!("expected a number or `len`, found {tok:?}")),
            None => Err("unexpected end of expression".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(s: &str) -> Condition { Condition::parse(s).unwrap() }

    #[test]
    fn comparisons() {
        assert!(cond("len <= 2").evaluate(2));
        assert!(!cond("len <= 2").evaluate(3));
        assert!(cond("n == 1").evaluate(1));
        assert!(cond("length != 4").evaluate(3));
        assert!(cond("3 > len").evaluate(2));
        assert!(cond("len >= -1").evaluate(0));
    }

    #[test]
    fn logical_operators_and_precedence() {
        let c = cond("len == 1 || len > 4 && !(len == 6)");
        assert!(c.evaluate(1));
        assert!(!c.evaluate(3));
        assert!(c.evaluate(5));
        assert!(!c.evaluate(6));
        assert!(cond("true").evaluate(0));
        assert!(!cond("!true || false").evaluate(0));
    }

    #[test]
    fn parse_errors_name_the_expression() {
        for bad in ["len", "len <", "len = 2", "x > 1", "(len > 1", "len > 1 2", "len & 1", "#"] {
            match Condition::parse(bad) {
                Err(LayoutError::InvalidCondition { expr, .. }) => assert_eq!(expr, bad),
                other => panic!("expected InvalidCondition for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn serde_uses_the_source_text() {
        let c: Condition = serde_json::from_str("\"len < 3\"").unwrap();
        assert_eq!(c.source(), "len < 3");
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"len < 3\"");
        assert!(serde_json::from_str::<Condition>("\"len <\"").is_err());
    }
}
