//! Error types for tag-filter compilation

/// Errors raised while compiling a tag filter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagFilterError {
    /// The expression is not a well-formed boolean tag expression
    #[error("Could not parse tag filter \"{expression}\": {reason} at offset {offset}")]
    Parse {
        /// The literal expression as configured
        expression: String,
        /// What the parser expected or rejected
        reason: String,
        /// Byte offset of the offending token
        offset: usize,
    },
}

impl TagFilterError {
    /// Create parse error for expression
    pub fn parse(expression: impl Into<String>, reason: impl Into<String>, offset: usize) -> Self {
        Self::Parse {
            expression: expression.into(),
            reason: reason.into(),
            offset,
        }
    }

    /// The expression that failed to compile
    #[inline]
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Parse { expression, .. } => expression,
        }
    }
}
