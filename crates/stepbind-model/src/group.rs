//! Features, rules and the container trait shared by both

use crate::options::Options;
use crate::scenario::{Scenario, ScenarioOutline};
use serde::{Deserialize, Serialize};

/// Read access shared by features and rules
///
/// The engine walks both kinds of group through this trait so a rule and a
/// feature are resolved, filtered and validated by the same code.
pub trait ScenarioContainer {
    /// Group title
    fn title(&self) -> &str;

    /// Group tags including the leading `@`
    fn tags(&self) -> &[String];

    /// Direct scenarios
    fn scenarios(&self) -> &[Scenario];

    /// Scenario outlines
    fn scenario_outlines(&self) -> &[ScenarioOutline];

    /// Nested rules (empty for rules themselves)
    fn rules(&self) -> &[Rule] {
        &[]
    }
}

/// Named grouping of scenarios beneath a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule title
    pub title: String,
    /// Rule tags including the leading `@`
    #[serde(default)]
    pub tags: Vec<String>,
    /// Direct scenarios
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    /// Scenario outlines
    #[serde(default)]
    pub scenario_outlines: Vec<ScenarioOutline>,
}

impl Rule {
    /// Create an empty rule
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: Vec::new(),
            scenarios: Vec::new(),
            scenario_outlines: Vec::new(),
        }
    }

    /// Append a scenario
    #[inline]
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Append an outline
    #[inline]
    #[must_use]
    pub fn with_outline(mut self, outline: ScenarioOutline) -> Self {
        self.scenario_outlines.push(outline);
        self
    }

    /// Append a tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

impl ScenarioContainer for Rule {
    fn title(&self) -> &str {
        &self.title
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    fn scenario_outlines(&self) -> &[ScenarioOutline] {
        &self.scenario_outlines
    }
}

/// Top-level specification unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Feature title
    pub title: String,
    /// Feature tags including the leading `@`
    #[serde(default)]
    pub tags: Vec<String>,
    /// Scenarios declared directly under the feature
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    /// Outlines declared directly under the feature
    #[serde(default)]
    pub scenario_outlines: Vec<ScenarioOutline>,
    /// Nested rules
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Run options
    #[serde(default)]
    pub options: Options,
}

impl Feature {
    /// Create an empty feature with default options
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: Vec::new(),
            scenarios: Vec::new(),
            scenario_outlines: Vec::new(),
            rules: Vec::new(),
            options: Options::default(),
        }
    }

    /// Append a scenario
    #[inline]
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Append an outline
    #[inline]
    #[must_use]
    pub fn with_outline(mut self, outline: ScenarioOutline) -> Self {
        self.scenario_outlines.push(outline);
        self
    }

    /// Append a rule
    #[inline]
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replace the options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Fold every rule's scenarios and outlines into the feature itself
    ///
    /// Each folded scenario, outline and outline instance inherits its rule's
    /// tags, so tag filtering sees the same tag union it would have seen
    /// with the rule in place. The returned feature has no rules.
    #[must_use]
    pub fn collapse_rules(&self) -> Self {
        let mut collapsed = self.clone();
        for rule in collapsed.rules.drain(..) {
            for mut scenario in rule.scenarios {
                merge_tags(&mut scenario.tags, &rule.tags);
                collapsed.scenarios.push(scenario);
            }
            for mut outline in rule.scenario_outlines {
                merge_tags(&mut outline.tags, &rule.tags);
                for instance in &mut outline.scenarios {
                    merge_tags(&mut instance.tags, &rule.tags);
                }
                collapsed.scenario_outlines.push(outline);
            }
        }
        collapsed
    }
}

impl ScenarioContainer for Feature {
    fn title(&self) -> &str {
        &self.title
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    fn scenario_outlines(&self) -> &[ScenarioOutline] {
        &self.scenario_outlines
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

fn merge_tags(target: &mut Vec<String>, inherited: &[String]) {
    for tag in inherited {
        if !target.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            target.push(tag.clone());
        }
    }
}
