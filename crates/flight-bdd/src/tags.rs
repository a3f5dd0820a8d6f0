//! Boolean tag expressions for scenario selection.
//!
//! ```text
//! expr    := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not" unary | "(" expr ")" | TAG
//! ```
//!
//! Keywords are case-insensitive. Tags may carry a leading `@`.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpr {
    Tag(String),
    Not(Box<TagExpr>),
    And(Box<TagExpr>, Box<TagExpr>),
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return Err(Error::TagExpression("empty tag expression".into()));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(Error::TagExpression(format!(
                "unexpected '{}' in '{}'",
                tok, input
            )));
        }
        Ok(expr)
    }

    /// Evaluate against a scenario's tags.
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        match self {
            TagExpr::Tag(t) => tags.iter().any(|s| s.as_ref() == t),
            TagExpr::Not(e) => !e.matches(tags),
            TagExpr::And(a, b) => a.matches(tags) && b.matches(tags),
            TagExpr::Or(a, b) => a.matches(tags) || b.matches(tags),
        }
    }

    pub fn and(self, other: TagExpr) -> TagExpr {
        TagExpr::And(Box::new(self), Box::new(other))
    }
}

impl FromStr for TagExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TagExpr {
    fn precedence(&self) -> u8 {
        match self {
            TagExpr::Or(..) => 1,
            TagExpr::And(..) => 2,
            TagExpr::Not(_) => 3,
            TagExpr::Tag(_) => 4,
        }
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagExpr::Tag(t) => f.write_str(t),
            TagExpr::Not(e) => write!(f, "not {}", Operand(e, 3)),
            TagExpr::And(a, b) => write!(f, "{} and {}", Operand(a, 2), Operand(b, 2)),
            TagExpr::Or(a, b) => write!(f, "{} or {}", a, b),
        }
    }
}

/// Operand that needs parentheses below the given precedence.
struct Operand<'a>(&'a TagExpr, u8);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.precedence() < self.1 {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Tag(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Not => f.write_str("not"),
            Token::Tag(t) => f.write_str(t),
        }
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let spaced = input.replace('(', " ( ").replace(')', " ) ");
    spaced
        .split_whitespace()
        .map(|word| match word.to_ascii_lowercase().as_str() {
            "(" => Token::Open,
            ")" => Token::Close,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Tag(word.trim_start_matches('@').to_string()),
        })
        .collect()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expr(&mut self) -> Result<TagExpr> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = TagExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<TagExpr> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.unary()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<TagExpr> {
        match self.advance() {
            Some(Token::Not) => Ok(TagExpr::Not(Box::new(self.unary()?))),
            Some(Token::Open) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(Error::TagExpression("missing ')'".into())),
                }
            }
            Some(Token::Tag(t)) if !t.is_empty() => Ok(TagExpr::Tag(t)),
            Some(tok) => Err(Error::TagExpression(format!("expected a tag, got '{}'", tok))),
            None => Err(Error::TagExpression("expression ends early".into())),
        }
    }
}
