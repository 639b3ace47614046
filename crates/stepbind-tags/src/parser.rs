//! Recursive-descent parser producing a [`TagExpr`]
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or    := and ("or" and)*
//! and   := unary ("and" unary)*
//! unary := "not" unary | atom
//! atom  := TAG | "(" or ")"
//! ```

use crate::error::TagFilterError;
use crate::expr::TagExpr;
use crate::lexer::{tokenize, Token, TokenKind};

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.expression.len(), |t| t.offset)
    }

    fn error(&self, reason: impl Into<String>) -> TagFilterError {
        TagFilterError::parse(self.expression, reason, self.offset())
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<TagExpr, TagFilterError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let rhs = self.parse_and()?;
            lhs = TagExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<TagExpr, TagFilterError> {
        let mut lhs = self.parse_unary()?;
        while self.eat(&TokenKind::And) {
            let rhs = self.parse_unary()?;
            lhs = TagExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<TagExpr, TagFilterError> {
        if self.eat(&TokenKind::Not) {
            let inner = self.parse_unary()?;
            return Ok(TagExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<TagExpr, TagFilterError> {
        match self.peek().cloned() {
            Some(TokenKind::Tag(tag)) => {
                self.pos += 1;
                Ok(TagExpr::Tag(tag))
            }
            Some(TokenKind::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if !self.eat(&TokenKind::RParen) {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            Some(other) => Err(self.error(format!("expected a tag or '(', found {}", describe(&other)))),
            None => Err(self.error("expected a tag or '(', found end of expression")),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Tag(tag) => format!("tag '{tag}'"),
        TokenKind::And => "'and'".to_string(),
        TokenKind::Or => "'or'".to_string(),
        TokenKind::Not => "'not'".to_string(),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
    }
}

/// Parse a complete tag expression
pub(crate) fn parse(expression: &str) -> Result<TagExpr, TagFilterError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.peek() {
        let reason = format!("unexpected {} after complete expression", describe(extra));
        return Err(parser.error(reason));
    }
    Ok(expr)
}
