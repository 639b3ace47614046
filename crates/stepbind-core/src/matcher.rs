//! Step matchers and step-text pattern compilation
//!
//! # Core Concepts
//!
//! - [`StepMatcher`]: literal text or a regular expression supplied by a binding
//! - [`pattern_for_step_text`]: derive an anchored pattern from concrete step text
//!
//! Literal matchers compare case-insensitively against the whole step text.
//! Pattern matchers search the step text and capture positional arguments,
//! always as strings. Type conversion belongs to the step function.

use crate::error::MatcherError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Numbers, double-quoted strings and `<name>` outline placeholders
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([-+]?[0-9]*\.?[0-9]+)|"([^"<]+)"|"?<([^"<]*)>"?"#)
        .unwrap_or_else(|e| unreachable!("placeholder pattern is valid: {e}"))
});

/// Matcher bound to a step
#[derive(Debug, Clone)]
pub enum StepMatcher {
    /// Whole-text, case-insensitive comparison
    Literal(String),
    /// Regular expression; capture groups become arguments
    Pattern(Regex),
}

impl StepMatcher {
    /// Create literal matcher
    #[inline]
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Compile a pattern matcher
    ///
    /// # Errors
    /// Returns [`MatcherError::InvalidPattern`] if `pattern` is not a valid
    /// regular expression
    pub fn pattern(pattern: &str) -> Result<Self, MatcherError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| MatcherError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Pattern matcher derived from concrete step text
    ///
    /// # Errors
    /// Returns [`MatcherError::InvalidPattern`] only if escaping went wrong,
    /// which indicates a bug
    pub fn for_step_text(text: &str) -> Result<Self, MatcherError> {
        Self::pattern(&pattern_for_step_text(text))
    }

    /// Check if this matcher accepts `step_text`
    #[must_use]
    pub fn is_match(&self, step_text: &str) -> bool {
        match self {
            Self::Literal(literal) => literal.to_lowercase() == step_text.to_lowercase(),
            Self::Pattern(regex) => regex.is_match(step_text),
        }
    }

    /// Extract positional arguments
    ///
    /// Returns `None` when the matcher does not accept `step_text`. Capture
    /// groups that did not participate yield empty strings.
    #[must_use]
    pub fn captures(&self, step_text: &str) -> Option<Vec<String>> {
        match self {
            Self::Literal(_) => self.is_match(step_text).then(Vec::new),
            Self::Pattern(regex) => regex.captures(step_text).map(|caps| {
                caps.iter()
                    .skip(1)
                    .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect()
            }),
        }
    }

    /// Literal text or pattern source
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(literal) => literal,
            Self::Pattern(regex) => regex.as_str(),
        }
    }

    /// Check if this is a pattern matcher
    #[inline]
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }
}

impl fmt::Display for StepMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => f.write_str(literal),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl From<&str> for StepMatcher {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for StepMatcher {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<Regex> for StepMatcher {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl From<&Regex> for StepMatcher {
    fn from(regex: &Regex) -> Self {
        Self::Pattern(regex.clone())
    }
}

/// Build an anchored pattern matching `text` and capturing its placeholders
///
/// - integers capture `(\d+)`; signed or decimal numbers capture `([-+]?\d*\.?\d+)`
/// - `"quoted"` text captures `"(.*)"`
/// - `<name>` captures `(.*)`, keeping surrounding quotes if both are present
///
/// Everything else is escaped and matched literally.
#[must_use]
pub fn pattern_for_step_text(text: &str) -> String {
    let mut pattern = String::from("^");
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        pattern.push_str(&regex::escape(&text[last..whole.start()]));

        if let Some(number) = caps.get(1) {
            if number.as_str().bytes().all(|b| b.is_ascii_digit()) {
                pattern.push_str(r"(\d+)");
            } else {
                pattern.push_str(r"([-+]?\d*\.?\d+)");
            }
        } else if caps.get(2).is_some() {
            pattern.push_str("\"(.*)\"");
        } else {
            let raw = whole.as_str();
            if raw.len() > 1 && raw.starts_with('"') && raw.ends_with('"') {
                pattern.push_str("\"(.*)\"");
            } else {
                pattern.push_str(&regex::escape(&raw[..raw.find('<').unwrap_or(0)]));
                pattern.push_str("(.*)");
                pattern.push_str(&regex::escape(&raw[raw.rfind('>').map_or(raw.len(), |i| i + 1)..]));
            }
        }

        last = whole.end();
    }

    pattern.push_str(&regex::escape(&text[last..]));
    pattern.push('$');
    pattern
}

/// Names of `<name>` placeholders and indices of other placeholders, in order
#[must_use]
pub fn placeholder_names(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .enumerate()
        .map(|(index, caps)| {
            caps.get(3)
                .map(|name| name.as_str().trim().to_string())
                .filter(|name| !name.is_empty() && is_identifier(name))
                .unwrap_or_else(|| format!("arg{index}"))
        })
        .collect()
}

/// Number of placeholders in `text`
#[must_use]
pub fn placeholder_count(text: &str) -> usize {
    PLACEHOLDER.find_iter(text).count()
}

/// Check if `text` contains any placeholder
#[inline]
#[must_use]
pub fn has_placeholders(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_matches_whole_text_ignoring_case() {
        let matcher = StepMatcher::from("I insert a coin");
        assert!(matcher.is_match("I INSERT A COIN"));
        assert!(!matcher.is_match("I insert a coin twice"));
        assert_eq!(matcher.captures("i insert a coin"), Some(Vec::new()));
    }

    #[test]
    fn pattern_extracts_strings() {
        let matcher = StepMatcher::pattern(r"^I insert (\d+) coins? of (\w+)$").unwrap();
        assert_eq!(
            matcher.captures("I insert 3 coins of gold"),
            Some(vec!["3".to_string(), "gold".to_string()])
        );
        assert_eq!(matcher.captures("I insert many coins of gold"), None);
    }

    #[test]
    fn pattern_is_unanchored_unless_written_anchored() {
        let matcher = StepMatcher::pattern("coin").unwrap();
        assert!(matcher.is_match("I insert a coin"));
    }

    #[test]
    fn optional_groups_yield_empty_strings() {
        let matcher = StepMatcher::pattern(r"^I (really )?want (\w+)$").unwrap();
        assert_eq!(
            matcher.captures("I want tea"),
            Some(vec![String::new(), "tea".to_string()])
        );
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = StepMatcher::pattern("(unclosed").unwrap_err();
        assert!(err.to_string().contains("/(unclosed/"));
    }

    #[test]
    fn compiles_numbers_strings_and_outline_placeholders() {
        assert_eq!(
            pattern_for_step_text(r#"I have 5 coins and "Mars" in slot <slot>"#),
            r#"^I have (\d+) coins and "(.*)" in slot (.*)$"#
        );
        assert_eq!(
            pattern_for_step_text("the price is -1.50"),
            r"^the price is ([-+]?\d*\.?\d+)$"
        );
    }

    #[test]
    fn quoted_outline_placeholder_keeps_quotes() {
        assert_eq!(
            pattern_for_step_text(r#"I select "<item>""#),
            r#"^I select "(.*)"$"#
        );
    }

    #[test]
    fn metacharacters_are_escaped() {
        let pattern = pattern_for_step_text("the total (with tax) is $ 3?");
        let matcher = StepMatcher::pattern(&pattern).unwrap();
        assert!(matcher.is_match("the total (with tax) is $ 3?"));
        assert!(!matcher.is_match("the total with tax is $ 3"));
    }

    #[test]
    fn quoted_capture_accepts_other_values_but_not_unquoted() {
        let matcher = StepMatcher::for_step_text(r#"I select "Coke""#).unwrap();
        assert_eq!(
            matcher.captures(r#"I select "Fanta""#),
            Some(vec!["Fanta".to_string()])
        );
        assert!(!matcher.is_match("I select Coke"));
    }

    #[test]
    fn counts_and_names_placeholders() {
        let text = r#"I move <count> items from "shelf" to <Target_2>"#;
        assert_eq!(placeholder_count(text), 3);
        assert_eq!(placeholder_names(text), vec!["count", "arg1", "Target_2"]);
        assert!(!has_placeholders("no arguments here"));
    }

    #[test]
    fn display_wraps_patterns_in_slashes() {
        assert_eq!(StepMatcher::pattern("^a$").unwrap().to_string(), "/^a$/");
        assert_eq!(StepMatcher::from("a").to_string(), "a");
    }
}
