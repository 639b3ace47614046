//! Scenario resolution: skip status, title lookup and the binding overlay
//!
//! The feature tree is never mutated. A [`GroupSession`] pairs each concrete
//! scenario of one feature or rule with a slot holding its lifecycle state
//! and step bindings for the duration of a definition call.

use crate::driver::{BoundScenario, BoundStep};
use crate::error::{BindError, BindResult};
use crate::registry::StepBinding;
use crate::state::{validate_transition, ScenarioState};
use std::sync::Arc;
use stepbind_model::{
    Feature, Options, Rule, Scenario, ScenarioContainer, ScenarioOutline, Step,
};
use stepbind_tags::{TagFilter, TagFilterCache, TagSet};
use tracing::{debug, trace};

/// A feature or one of its rules
#[derive(Debug, Clone, Copy)]
pub enum GroupRef<'g> {
    /// Whole feature
    Feature(&'g Feature),
    /// Rule nested in a feature
    Rule {
        /// The rule
        rule: &'g Rule,
        /// Feature that declares it
        feature: &'g Feature,
    },
}

impl<'g> GroupRef<'g> {
    /// Underlying container
    #[must_use]
    pub fn container(self) -> &'g dyn ScenarioContainer {
        match self {
            Self::Feature(feature) => feature,
            Self::Rule { rule, .. } => rule,
        }
    }

    /// Options governing the session
    #[must_use]
    pub fn options(self) -> &'g Options {
        match self {
            Self::Feature(feature) | Self::Rule { feature, .. } => &feature.options,
        }
    }

    /// Feature owning the group
    #[must_use]
    pub fn feature(self) -> &'g Feature {
        match self {
            Self::Feature(feature) | Self::Rule { feature, .. } => feature,
        }
    }
}

/// Tag filter plus the tags every scenario in a group inherits
#[derive(Debug, Clone)]
pub(crate) struct TagScope {
    filter: Option<Arc<TagFilter>>,
    inherited: TagSet,
}

impl TagScope {
    pub(crate) fn new(group: GroupRef<'_>, filters: &TagFilterCache) -> BindResult<Self> {
        let filter = match group.options().tag_filter.as_deref() {
            Some(expression) => Some(filters.get_or_compile(expression)?),
            None => None,
        };
        let inherited = TagSet::from_tags(group.container().tags());
        Ok(Self { filter, inherited })
    }

    /// Scope for a rule of this group
    ///
    /// A rule's scenarios see the rule's tags only, not the feature's.
    pub(crate) fn for_rule(&self, tags: &[String]) -> Self {
        Self {
            filter: self.filter.clone(),
            inherited: TagSet::from_tags(tags),
        }
    }

    /// Check if the filter excludes something carrying `tags`
    pub(crate) fn skips(&self, tags: &[String]) -> bool {
        self.filter.as_ref().is_some_and(|filter| {
            let mut all = self.inherited.clone();
            all.extend(tags);
            !filter.matches(&all)
        })
    }

    /// Check if anything in `group` survives the filter
    pub(crate) fn has_active_content(&self, group: &dyn ScenarioContainer) -> bool {
        group.scenarios().iter().any(|s| !self.skips(&s.tags))
            || group.scenario_outlines().iter().any(|o| {
                !self.skips(&o.tags) || o.scenarios.iter().any(|s| !self.skips(&s.tags))
            })
            || group
                .rules()
                .iter()
                .any(|rule| self.for_rule(&rule.tags).has_active_content(rule))
    }
}

/// Address of a concrete scenario within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ScenarioKey {
    Direct(usize),
    Instance { outline: usize, index: usize },
}

/// What a scenario title resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Scenario(usize),
    Outline(usize),
}

/// Binding overlay for one concrete scenario
pub(crate) struct ScenarioSlot<'g> {
    pub(crate) scenario: &'g Scenario,
    pub(crate) state: ScenarioState,
    pub(crate) bindings: Vec<Option<StepBinding>>,
    pub(crate) defined: bool,
}

impl<'g> ScenarioSlot<'g> {
    fn new(scenario: &'g Scenario, skipped: bool) -> Self {
        let state = if skipped {
            ScenarioState::Skipped
        } else {
            ScenarioState::Active
        };
        debug_assert!(ScenarioState::Unbound.can_transition_to(state));
        if skipped {
            debug!(scenario = %scenario.title, line = scenario.line_number, "skipped by tag filter");
        }
        Self {
            scenario,
            state,
            bindings: vec![None; scenario.steps.len()],
            defined: false,
        }
    }

    pub(crate) fn is_skipped(&self) -> bool {
        self.state == ScenarioState::Skipped
    }

    pub(crate) fn advance(&mut self, to: ScenarioState) -> BindResult<()> {
        validate_transition(self.state, to)?;
        trace!(scenario = %self.scenario.title, from = ?self.state, to = ?to, "scenario state");
        self.state = to;
        Ok(())
    }

    /// Steps without a binding, with their 0-based positions
    pub(crate) fn unbound_steps(&self) -> impl Iterator<Item = (usize, &'g Step)> + '_ {
        let steps = &self.scenario.steps;
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, binding)| binding.is_none())
            .map(move |(index, _)| (index, &steps[index]))
    }

    /// Copy steps and bindings into an owned, immutable scenario
    pub(crate) fn freeze(&self, title: &str) -> BoundScenario {
        let steps = self
            .scenario
            .steps
            .iter()
            .zip(&self.bindings)
            .map(|(step, binding)| BoundStep::new(step, binding.clone()))
            .collect();
        BoundScenario::new(title, steps)
    }
}

pub(crate) struct OutlineEntry<'g> {
    pub(crate) outline: &'g ScenarioOutline,
    pub(crate) skipped: bool,
    pub(crate) defined: bool,
    pub(crate) instances: Vec<ScenarioSlot<'g>>,
}

pub(crate) struct RuleEntry<'g> {
    pub(crate) rule: &'g Rule,
    pub(crate) active: bool,
    pub(crate) defined: bool,
}

/// Binding overlay for one feature or rule
pub(crate) struct GroupSession<'g> {
    pub(crate) group: GroupRef<'g>,
    pub(crate) direct: Vec<ScenarioSlot<'g>>,
    pub(crate) outlines: Vec<OutlineEntry<'g>>,
    pub(crate) rules: Vec<RuleEntry<'g>>,
}

impl<'g> GroupSession<'g> {
    /// Resolve skip status of every scenario, outline and rule in `group`
    ///
    /// # Errors
    /// Fails if the tag filter does not compile
    pub(crate) fn resolve(group: GroupRef<'g>, filters: &TagFilterCache) -> BindResult<Self> {
        let scope = TagScope::new(group, filters)?;
        let container = group.container();

        let direct = container
            .scenarios()
            .iter()
            .map(|scenario| ScenarioSlot::new(scenario, scope.skips(&scenario.tags)))
            .collect();

        let outlines = container
            .scenario_outlines()
            .iter()
            .map(|outline| OutlineEntry {
                outline,
                skipped: scope.skips(&outline.tags),
                defined: false,
                instances: outline
                    .scenarios
                    .iter()
                    .map(|instance| ScenarioSlot::new(instance, scope.skips(&instance.tags)))
                    .collect(),
            })
            .collect();

        let rules = container
            .rules()
            .iter()
            .map(|rule| RuleEntry {
                rule,
                active: scope.for_rule(&rule.tags).has_active_content(rule),
                defined: false,
            })
            .collect();

        let session = Self {
            group,
            direct,
            outlines,
            rules,
        };
        debug!(
            group = container.title(),
            active = session.active_count(),
            "resolved scenarios"
        );
        Ok(session)
    }

    /// Title of the feature or rule
    pub(crate) fn title(&self) -> &'g str {
        self.group.container().title()
    }

    /// Check if any scenario, outline or rule survives the tag filter
    pub(crate) fn has_active_content(&self) -> bool {
        self.direct.iter().any(|slot| !slot.is_skipped())
            || self
                .outlines
                .iter()
                .any(|entry| !entry.skipped || entry.instances.iter().any(|s| !s.is_skipped()))
            || self.rules.iter().any(|entry| entry.active)
    }

    fn active_count(&self) -> usize {
        self.direct.iter().filter(|s| !s.is_skipped()).count()
            + self
                .outlines
                .iter()
                .flat_map(|entry| &entry.instances)
                .filter(|s| !s.is_skipped())
                .count()
    }

    /// Find the scenario or outline titled `title`, case-insensitively
    ///
    /// `Ok(None)` means nothing matched; the caller decides whether that is
    /// an error.
    pub(crate) fn find(&self, title: &str) -> BindResult<Option<Target>> {
        let mut found = self
            .direct
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.scenario.has_title(title))
            .map(|(index, _)| Target::Scenario(index))
            .chain(
                self.outlines
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.outline.has_title(title))
                    .map(|(index, _)| Target::Outline(index)),
            );

        let first = found.next();
        if found.next().is_some() {
            return Err(BindError::AmbiguousScenarioTitle {
                title: title.to_string(),
            });
        }
        Ok(first)
    }

    /// Every concrete scenario behind `target`, skipped or not
    pub(crate) fn scenarios_of(&self, target: Target) -> Vec<ScenarioKey> {
        match target {
            Target::Scenario(index) => vec![ScenarioKey::Direct(index)],
            Target::Outline(outline) => (0..self.outlines[outline].instances.len())
                .map(|index| ScenarioKey::Instance { outline, index })
                .collect(),
        }
    }

    /// Check if `target` was defined earlier in this session
    pub(crate) fn is_defined(&self, target: Target) -> bool {
        match target {
            Target::Scenario(index) => self.direct[index].defined,
            Target::Outline(index) => {
                let entry = &self.outlines[index];
                entry.defined || entry.instances.iter().any(|slot| slot.defined)
            }
        }
    }

    pub(crate) fn mark_defined(&mut self, target: Target) {
        match target {
            Target::Scenario(index) => self.direct[index].defined = true,
            Target::Outline(index) => self.outlines[index].defined = true,
        }
    }

    pub(crate) fn slot(&self, key: ScenarioKey) -> &ScenarioSlot<'g> {
        match key {
            ScenarioKey::Direct(index) => &self.direct[index],
            ScenarioKey::Instance { outline, index } => &self.outlines[outline].instances[index],
        }
    }

    pub(crate) fn slot_mut(&mut self, key: ScenarioKey) -> &mut ScenarioSlot<'g> {
        match key {
            ScenarioKey::Direct(index) => &mut self.direct[index],
            ScenarioKey::Instance { outline, index } => {
                &mut self.outlines[outline].instances[index]
            }
        }
    }

    /// Find the single rule titled `title`, case-insensitively
    pub(crate) fn find_rule(&self, title: &str) -> Option<usize> {
        let mut found = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.rule.title.to_lowercase() == title.to_lowercase())
            .map(|(index, _)| index);
        let first = found.next();
        if found.next().is_some() {
            None
        } else {
            first
        }
    }
}
