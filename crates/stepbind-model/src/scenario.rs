//! Scenarios and scenario outlines

use crate::step::Step;
use serde::{Deserialize, Serialize};

/// One concrete ordered sequence of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Scenario title as written in the feature
    pub title: String,
    /// Steps in specification order
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Tags including the leading `@`
    #[serde(default)]
    pub tags: Vec<String>,
    /// 1-based source line of the scenario header
    pub line_number: u32,
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(title: impl Into<String>, line_number: u32) -> Self {
        Self {
            title: title.into(),
            steps: Vec::new(),
            tags: Vec::new(),
            line_number,
        }
    }

    /// Append a step
    #[inline]
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Case-insensitive title comparison
    #[inline]
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}

/// Step template plus one materialized scenario per example row
///
/// The loader has already substituted example values into each instance, so
/// `steps` is only the un-substituted template kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutline {
    /// Outline title
    pub title: String,
    /// Template steps with `<placeholder>` text
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Outline tags including the leading `@`
    #[serde(default)]
    pub tags: Vec<String>,
    /// Materialized instances, one per example row
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    /// 1-based source line of the outline header
    pub line_number: u32,
}

impl ScenarioOutline {
    /// Create an outline with no template steps or instances
    #[must_use]
    pub fn new(title: impl Into<String>, line_number: u32) -> Self {
        Self {
            title: title.into(),
            steps: Vec::new(),
            tags: Vec::new(),
            scenarios: Vec::new(),
            line_number,
        }
    }

    /// Append a template step
    #[inline]
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Append a materialized instance
    #[inline]
    #[must_use]
    pub fn with_instance(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Case-insensitive title comparison
    #[inline]
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}
