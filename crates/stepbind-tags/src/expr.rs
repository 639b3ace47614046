//! Tag sets, expression trees and compiled filters

use crate::error::TagFilterError;
use crate::parser::parse;
use std::collections::BTreeSet;
use std::fmt;

/// Lowercased set of tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeSet<String>,
}

impl TagSet {
    /// Create empty tag set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from tags, lowercasing each
    #[must_use]
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.extend(tags);
        set
    }

    /// Add tags, lowercasing each
    pub fn extend<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags
            .extend(tags.into_iter().map(|t| t.as_ref().to_lowercase()));
    }

    /// Union of two sets
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            tags: self.tags.union(&other.tags).cloned().collect(),
        }
    }

    /// Case-insensitive membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_lowercase())
    }

    /// Number of distinct tags
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over lowercased tags in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// Parsed boolean expression over tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpr {
    /// Membership of a lowercased `@tag`
    Tag(String),
    /// Negation
    Not(Box<TagExpr>),
    /// Conjunction
    And(Box<TagExpr>, Box<TagExpr>),
    /// Disjunction
    Or(Box<TagExpr>, Box<TagExpr>),
}

impl TagExpr {
    /// Evaluate against a tag set
    #[must_use]
    pub fn evaluate(&self, tags: &TagSet) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag),
            Self::Not(inner) => !inner.evaluate(tags),
            Self::And(lhs, rhs) => lhs.evaluate(tags) && rhs.evaluate(tags),
            Self::Or(lhs, rhs) => lhs.evaluate(tags) || rhs.evaluate(tags),
        }
    }

    /// Tags referenced anywhere in the expression
    #[must_use]
    pub fn referenced_tags(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_tags(&mut out);
        out
    }

    fn collect_tags<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Tag(tag) => {
                out.insert(tag.as_str());
            }
            Self::Not(inner) => inner.collect_tags(out),
            Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                lhs.collect_tags(out);
                rhs.collect_tags(out);
            }
        }
    }
}

impl fmt::Display for TagExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Not(inner) => write!(f, "not {inner}"),
            Self::And(lhs, rhs) => write!(f, "({lhs} and {rhs})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs} or {rhs})"),
        }
    }
}

/// A compiled tag filter
///
/// Evaluation is a pure function of the tag set passed in; a filter holds no
/// mutable state and may be shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    expression: String,
    root: TagExpr,
}

impl TagFilter {
    /// Compile an expression
    ///
    /// # Errors
    /// Returns [`TagFilterError::Parse`] naming the expression if it is not a
    /// well-formed tag expression
    pub fn compile(expression: &str) -> Result<Self, TagFilterError> {
        let root = parse(expression)?;
        let filter = Self {
            expression: expression.to_string(),
            root,
        };
        tracing::trace!(
            expression,
            empty_set = filter.matches(&TagSet::new()),
            "compiled tag filter"
        );
        Ok(filter)
    }

    /// Evaluate against a tag set
    #[inline]
    #[must_use]
    pub fn matches(&self, tags: &TagSet) -> bool {
        self.root.evaluate(tags)
    }

    /// The literal expression this filter was compiled from
    #[inline]
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The parsed expression tree
    #[inline]
    #[must_use]
    pub fn root(&self) -> &TagExpr {
        &self.root
    }
}
