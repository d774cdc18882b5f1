//! Profile expressions.
//!
//! An expression is a profile name, a negation (`!name`), an OR-list
//! (`a | b`), an AND-list (`a & b`), or a parenthesised group. `&` and `|`
//! may not be mixed at one level without parentheses. A [`Profiles`] value is
//! a comma separated list of expressions that matches when any of them does.

use crate::error::{ExpressionError, MAX_NESTING_DEPTH};
use std::collections::BTreeSet;
use std::fmt;

/// Parsed profile expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileExpression {
    Profile(String),
    Not(Box<ProfileExpression>),
    And(Vec<ProfileExpression>),
    Or(Vec<ProfileExpression>),
}

impl ProfileExpression {
    /// Parse a single expression; commas are not allowed here.
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        Self::parse_at(text, 0)
    }

    fn parse_at(text: &str, offset: usize) -> Result<Self, ExpressionError> {
        let tokens = tokenize(text, offset)?;
        if tokens.is_empty() {
            return Err(ExpressionError::new(offset, "empty profile expression"));
        }
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            end: offset + text.len(),
            depth: 0,
        };
        let expression = parser.expression()?;
        match parser.peek() {
            None => Ok(expression),
            Some((position, token)) => Err(ExpressionError::new(
                position,
                format!("unexpected {}", token.describe()),
            )),
        }
    }

    /// Whether the expression holds for the given active profiles.
    pub fn matches(&self, active: &BTreeSet<&str>) -> bool {
        match self {
            ProfileExpression::Profile(name) => active.contains(name.as_str()),
            ProfileExpression::Not(inner) => !inner.matches(active),
            ProfileExpression::And(terms) => terms.iter().all(|term| term.matches(active)),
            ProfileExpression::Or(terms) => terms.iter().any(|term| term.matches(active)),
        }
    }
}

impl fmt::Display for ProfileExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(
            f: &mut fmt::Formatter<'_>,
            terms: &[ProfileExpression],
            separator: &str,
        ) -> fmt::Result {
            f.write_str("(")?;
            for (idx, term) in terms.iter().enumerate() {
                if idx > 0 {
                    f.write_str(separator)?;
                }
                write!(f, "{term}")?;
            }
            f.write_str(")")
        }
        match self {
            ProfileExpression::Profile(name) => f.write_str(name),
            ProfileExpression::Not(inner) => write!(f, "!{inner}"),
            ProfileExpression::And(terms) => join(f, terms, " & "),
            ProfileExpression::Or(terms) => join(f, terms, " | "),
        }
    }
}

/// A comma separated list of profile expressions, matched as an OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profiles {
    expressions: Vec<ProfileExpression>,
}

impl Profiles {
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let mut expressions = Vec::new();
        let mut offset = 0;
        for part in text.split(',') {
            expressions.push(ProfileExpression::parse_at(part, offset)?);
            offset += part.len() + 1;
        }
        Ok(Self { expressions })
    }

    pub fn expressions(&self) -> &[ProfileExpression] {
        &self.expressions
    }

    pub fn matches(&self, active: &BTreeSet<&str>) -> bool {
        self.expressions
            .iter()
            .any(|expression| expression.matches(active))
    }
}

/// Parse and evaluate `expression` against `active` in one step.
pub fn evaluate<S: AsRef<str>>(expression: &str, active: &[S]) -> Result<bool, ExpressionError> {
    let active: BTreeSet<&str> = active.iter().map(AsRef::as_ref).collect();
    Ok(Profiles::parse(expression)?.matches(&active))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Name(name) => format!("profile name '{name}'"),
            Token::Not => "'!'".to_string(),
            Token::And => "'&'".to_string(),
            Token::Or => "'|'".to_string(),
            Token::Open => "'('".to_string(),
            Token::Close => "')'".to_string(),
        }
    }
}

fn tokenize(text: &str, offset: usize) -> Result<Vec<(usize, Token)>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        let position = offset + idx;
        let token = match ch {
            c if c.is_whitespace() => continue,
            '!' => Token::Not,
            '&' => Token::And,
            '|' => Token::Or,
            '(' => Token::Open,
            ')' => Token::Close,
            ',' => return Err(ExpressionError::new(position, "unexpected ','")),
            _ => {
                let mut name = String::from(ch);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_whitespace() || "!&|(),".contains(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                Token::Name(name)
            }
        };
        tokens.push((position, token));
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(usize, Token)],
    pos: usize,
    end: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<(usize, &'a Token)> {
        self.tokens
            .get(self.pos)
            .map(|(position, token)| (*position, token))
    }

    fn advance(&mut self) -> Option<(usize, &'a Token)> {
        let next = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some((next.0, &next.1))
    }

    /// Run `parse` one nesting level deeper, refusing past the limit.
    fn nested<T>(
        &mut self,
        position: usize,
        parse: fn(&mut Self) -> Result<T, ExpressionError>,
    ) -> Result<T, ExpressionError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ExpressionError::too_deep(position));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// A run of operands joined by a single kind of operator.
    fn expression(&mut self) -> Result<ProfileExpression, ExpressionError> {
        let first = self.operand()?;
        let mut terms = vec![first];
        let mut operator: Option<Token> = None;
        while let Some((position, token)) = self.peek() {
            let token = match token {
                Token::And | Token::Or => token.clone(),
                _ => break,
            };
            if let Some(existing) = &operator
                && *existing != token
            {
                return Err(ExpressionError::new(
                    position,
                    "'&' and '|' must not be mixed without parentheses",
                ));
            }
            operator = Some(token);
            self.pos += 1;
            terms.push(self.operand()?);
        }
        Ok(match operator {
            None => terms.remove(0),
            Some(Token::And) => ProfileExpression::And(terms),
            Some(_) => ProfileExpression::Or(terms),
        })
    }

    fn operand(&mut self) -> Result<ProfileExpression, ExpressionError> {
        match self.advance() {
            Some((_, Token::Name(name))) => Ok(ProfileExpression::Profile(name.clone())),
            Some((position, Token::Not)) => Ok(ProfileExpression::Not(Box::new(
                self.nested(position, Self::operand)?,
            ))),
            Some((position, Token::Open)) => {
                let inner = self.nested(position, Self::expression)?;
                match self.advance() {
                    Some((_, Token::Close)) => Ok(inner),
                    Some((found, token)) => Err(ExpressionError::new(
                        found,
                        format!("expected ')' but found {}", token.describe()),
                    )),
                    None => Err(ExpressionError::new(position, "unclosed '('")),
                }
            }
            Some((position, token)) => Err(ExpressionError::new(
                position,
                format!("expected profile name but found {}", token.describe()),
            )),
            None => Err(ExpressionError::new(self.end, "expected profile name")),
        }
    }
}
