//! Steps and their attached arguments
//!
//! A [`Step`] is one instruction line of a scenario: keyword, text, an
//! optional doc string or data table, and the line it came from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of a data table, keyed by column header in column order
pub type TableRow = IndexMap<String, String>;

/// Keyword introducing a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKeyword {
    /// `Given` precondition
    Given,
    /// `When` action
    When,
    /// `Then` outcome
    Then,
    /// `And` continuation
    And,
    /// `But` continuation
    But,
}

impl StepKeyword {
    /// Lowercase keyword as used by the binder API (`given`, `when`, ...)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Given => "given",
            Self::When => "when",
            Self::Then => "then",
            Self::And => "and",
            Self::But => "but",
        }
    }

    /// Parse a keyword case-insensitively
    #[must_use]
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword.trim().to_lowercase().as_str() {
            "given" => Some(Self::Given),
            "when" => Some(Self::When),
            "then" => Some(Self::Then),
            "and" => Some(Self::And),
            "but" => Some(Self::But),
            _ => None,
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tabular or free-text argument attached below a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepArgument {
    /// Free-text block
    DocString(String),
    /// Data table, one map per row
    Table(Vec<TableRow>),
}

impl StepArgument {
    /// Build a table argument from a header row and value rows
    #[must_use]
    pub fn table<H, R, V>(header: &[H], rows: R) -> Self
    where
        H: AsRef<str>,
        R: IntoIterator<Item = Vec<V>>,
        V: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                header
                    .iter()
                    .map(|h| h.as_ref().to_string())
                    .zip(row.into_iter().map(Into::into))
                    .collect()
            })
            .collect();
        Self::Table(rows)
    }

    /// Doc string contents, if this is a doc string
    #[inline]
    #[must_use]
    pub fn as_doc_string(&self) -> Option<&str> {
        match self {
            Self::DocString(text) => Some(text),
            Self::Table(_) => None,
        }
    }

    /// Table rows, if this is a table
    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&[TableRow]> {
        match self {
            Self::Table(rows) => Some(rows),
            Self::DocString(_) => None,
        }
    }
}

/// A single step of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Keyword the step was written with
    pub keyword: StepKeyword,
    /// Instruction text, without the keyword
    pub step_text: String,
    /// Attached doc string or table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_argument: Option<StepArgument>,
    /// 1-based source line
    pub line_number: u32,
}

impl Step {
    /// Create a step without an attached argument
    #[must_use]
    pub fn new(keyword: StepKeyword, text: impl Into<String>, line_number: u32) -> Self {
        Self {
            keyword,
            step_text: text.into(),
            step_argument: None,
            line_number,
        }
    }

    /// Attach a doc string or table
    #[inline]
    #[must_use]
    pub fn with_argument(mut self, argument: StepArgument) -> Self {
        self.step_argument = Some(argument);
        self
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword, self.step_text)
    }
}
