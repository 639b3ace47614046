//! Tokenizer for tag expressions

use crate::error::TagFilterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// `@name`, lowercased
    Tag(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) offset: usize,
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Split an expression into tokens
///
/// Tags follow `@[A-Za-z0-9_-]+`. Keywords are `and`, `or`, `not`; any other
/// bare word is rejected.
pub(crate) fn tokenize(expression: &str) -> Result<Vec<Token>, TagFilterError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match c {
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            '@' => {
                chars.next();
                let mut name = String::from("@");
                while let Some(&(_, next)) = chars.peek() {
                    if !is_tag_char(next) {
                        break;
                    }
                    name.push(next.to_ascii_lowercase());
                    chars.next();
                }
                if name.len() == 1 {
                    return Err(TagFilterError::parse(
                        expression,
                        "expected a tag name after '@'",
                        offset,
                    ));
                }
                TokenKind::Tag(name)
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if !next.is_ascii_alphanumeric() {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                match word.as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    _ => {
                        return Err(TagFilterError::parse(
                            expression,
                            format!("unexpected word '{word}'"),
                            offset,
                        ))
                    }
                }
            }
            other => {
                return Err(TagFilterError::parse(
                    expression,
                    format!("unexpected character '{other}'"),
                    offset,
                ))
            }
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}
