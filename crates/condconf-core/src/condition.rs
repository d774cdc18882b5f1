//! Conditions for `if` nodes.
//!
//! ```text
//! condition := or
//! or        := and ( "||" and )*
//! and       := unary ( "&&" unary )*
//! unary     := "!" unary | "(" or ")" | atom
//! atom      := "true" | "false"
//!            | ("property" | "p") "(" STRING ")" "." method
//!            | "isDefined" "(" STRING ")" | "isNull" "(" STRING ")"
//! method    := "isEmpty()" | name "(" STRING ")"
//! ```
//!
//! `property("X")` reads an undefined property as the empty string.

use crate::error::{ExpressionError, MAX_NESTING_DEPTH};

/// A test applied to a property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringTest {
    Contains(String),
    Equals(String),
    EqualsIgnoreCase(String),
    StartsWith(String),
    EndsWith(String),
    IsEmpty,
}

impl StringTest {
    fn apply(&self, value: &str) -> bool {
        match self {
            StringTest::Contains(needle) => value.contains(needle.as_str()),
            StringTest::Equals(other) => value == other,
            StringTest::EqualsIgnoreCase(other) => value.to_lowercase() == other.to_lowercase(),
            StringTest::StartsWith(prefix) => value.starts_with(prefix.as_str()),
            StringTest::EndsWith(suffix) => value.ends_with(suffix.as_str()),
            StringTest::IsEmpty => value.is_empty(),
        }
    }
}

/// Parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Literal(bool),
    Property { name: String, test: StringTest },
    IsDefined(String),
    IsNull(String),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(ExpressionError::new(0, "empty condition"));
        }
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            end: text.len(),
            depth: 0,
        };
        let condition = parser.or()?;
        match parser.peek() {
            None => Ok(condition),
            Some((position, token)) => Err(ExpressionError::new(
                position,
                format!("unexpected {}", token.describe()),
            )),
        }
    }

    /// Evaluate with `lookup` returning the value of a property, if defined.
    pub fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Condition::Literal(value) => *value,
            Condition::Property { name, test } => {
                test.apply(lookup(name).as_deref().unwrap_or_default())
            }
            Condition::IsDefined(name) => lookup(name).is_some(),
            Condition::IsNull(name) => lookup(name).is_none(),
            Condition::Not(inner) => !inner.evaluate(lookup),
            Condition::And(left, right) => left.evaluate(lookup) && right.evaluate(lookup),
            Condition::Or(left, right) => left.evaluate(lookup) || right.evaluate(lookup),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Not,
    AndAnd,
    OrOr,
    Open,
    Close,
    Dot,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{name}'"),
            Token::Str(value) => format!("string \"{value}\""),
            Token::Not => "'!'".to_string(),
            Token::AndAnd => "'&&'".to_string(),
            Token::OrOr => "'||'".to_string(),
            Token::Open => "'('".to_string(),
            Token::Close => "')'".to_string(),
            Token::Dot => "'.'".to_string(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '!' => Token::Not,
            '(' => Token::Open,
            ')' => Token::Close,
            '.' => Token::Dot,
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == ch).is_none() {
                    return Err(ExpressionError::new(idx, format!("expected '{ch}{ch}'")));
                }
                if ch == '&' {
                    Token::AndAnd
                } else {
                    Token::OrOr
                }
            }
            '"' | '\'' => {
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, next)) = chars.next() {
                    match next {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => value.push(escaped),
                            None => break,
                        },
                        c if c == ch => {
                            closed = true;
                            break;
                        }
                        c => value.push(c),
                    }
                }
                if !closed {
                    return Err(ExpressionError::new(idx, "unterminated string"));
                }
                Token::Str(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some((_, next)) =
                    chars.next_if(|&(_, next)| next.is_alphanumeric() || next == '_')
                {
                    ident.push(next);
                }
                Token::Ident(ident)
            }
            other => {
                return Err(ExpressionError::new(
                    idx,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        tokens.push((idx, token));
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
        let next = self.peek()?;
        self.pos += 1;
        Some(next)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        match self.advance() {
            Some((_, token)) if *token == expected => Ok(()),
            Some((position, token)) => Err(ExpressionError::new(
                position,
                format!("expected {} but found {}", expected.describe(), token.describe()),
            )),
            None => Err(ExpressionError::new(
                self.end,
                format!("expected {}", expected.describe()),
            )),
        }
    }

    fn string(&mut self) -> Result<String, ExpressionError> {
        match self.advance() {
            Some((_, Token::Str(value))) => Ok(value.clone()),
            Some((position, token)) => Err(ExpressionError::new(
                position,
                format!("expected string but found {}", token.describe()),
            )),
            None => Err(ExpressionError::new(self.end, "expected string")),
        }
    }

    /// `"(" STRING ")"`
    fn string_argument(&mut self) -> Result<String, ExpressionError> {
        self.expect(Token::Open)?;
        let value = self.string()?;
        self.expect(Token::Close)?;
        Ok(value)
    }

    fn or(&mut self) -> Result<Condition, ExpressionError> {
        let mut left = self.and()?;
        while let Some((_, Token::OrOr)) = self.peek() {
            self.pos += 1;
            let right = self.and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Condition, ExpressionError> {
        let mut left = self.unary()?;
        while let Some((_, Token::AndAnd)) = self.peek() {
            self.pos += 1;
            let right = self.unary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

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

    fn unary(&mut self) -> Result<Condition, ExpressionError> {
        match self.peek() {
            Some((position, Token::Not)) => {
                self.pos += 1;
                Ok(Condition::Not(Box::new(self.nested(position, Self::unary)?)))
            }
            Some((position, Token::Open)) => {
                self.pos += 1;
                let inner = self.nested(position, Self::or)?;
                self.expect(Token::Close)?;
                Ok(inner)
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Condition, ExpressionError> {
        let (position, name) = match self.advance() {
            Some((position, Token::Ident(name))) => (position, name.as_str()),
            Some((position, token)) => {
                return Err(ExpressionError::new(
                    position,
                    format!("expected condition but found {}", token.describe()),
                ));
            }
            None => return Err(ExpressionError::new(self.end, "expected condition")),
        };
        match name {
            "true" => Ok(Condition::Literal(true)),
            "false" => Ok(Condition::Literal(false)),
            "isDefined" => Ok(Condition::IsDefined(self.string_argument()?)),
            "isNull" => Ok(Condition::IsNull(self.string_argument()?)),
            "property" | "p" => {
                let property = self.string_argument()?;
                self.expect(Token::Dot)?;
                let test = self.string_test()?;
                Ok(Condition::Property {
                    name: property,
                    test,
                })
            }
            other => Err(ExpressionError::new(
                position,
                format!("unknown function '{other}'"),
            )),
        }
    }

    fn string_test(&mut self) -> Result<StringTest, ExpressionError> {
        let (position, method) = match self.advance() {
            Some((position, Token::Ident(method))) => (position, method.as_str()),
            Some((position, token)) => {
                return Err(ExpressionError::new(
                    position,
                    format!("expected method name but found {}", token.describe()),
                ));
            }
            None => return Err(ExpressionError::new(self.end, "expected method name")),
        };
        let test = match method {
            "isEmpty" => {
                self.expect(Token::Open)?;
                self.expect(Token::Close)?;
                StringTest::IsEmpty
            }
            "contains" => StringTest::Contains(self.string_argument()?),
            "equals" => StringTest::Equals(self.string_argument()?),
            "equalsIgnoreCase" => StringTest::EqualsIgnoreCase(self.string_argument()?),
            "startsWith" => StringTest::StartsWith(self.string_argument()?),
            "endsWith" => StringTest::EndsWith(self.string_argument()?),
            other => {
                return Err(ExpressionError::new(
                    position,
                    format!("unknown method '{other}'"),
                ));
            }
        };
        Ok(test)
    }
}
