//! Run options attached to a feature
//!
//! Options are fixed for the lifetime of a binding session. Every field
//! except the scenario name template round-trips through serde, so a loader
//! can ship them next to the feature tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Values handed to a [`ScenarioNameTemplate`]
#[derive(Debug, Clone, Copy)]
pub struct ScenarioNameVars<'a> {
    /// Title of the owning feature or rule
    pub feature_title: &'a str,
    /// Title of the scenario being registered
    pub scenario_title: &'a str,
    /// Tags of the owning feature or rule
    pub feature_tags: &'a [String],
    /// Tags of the scenario
    pub scenario_tags: &'a [String],
}

type TemplateFn = dyn Fn(&ScenarioNameVars<'_>) -> anyhow::Result<String> + Send + Sync;

/// Caller-supplied function producing the registered test name
#[derive(Clone)]
pub struct ScenarioNameTemplate(Arc<TemplateFn>);

impl ScenarioNameTemplate {
    /// Wrap a naming function
    pub fn new<F>(template: F) -> Self
    where
        F: Fn(&ScenarioNameVars<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self(Arc::new(template))
    }

    /// Render a test name
    ///
    /// # Errors
    /// Returns whatever error the template itself produced
    pub fn render(&self, vars: &ScenarioNameVars<'_>) -> anyhow::Result<String> {
        (self.0)(vars)
    }
}

impl fmt::Debug for ScenarioNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScenarioNameTemplate(..)")
    }
}

/// Per-kind switches for binding diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ErrorsSetting")]
pub struct ErrorOptions {
    /// Scenario in the feature but never defined by the caller
    pub missing_scenario_in_step_definitions: bool,
    /// Step in a defined scenario left without an implementation
    pub missing_step_in_step_definitions: bool,
    /// Scenario title defined by the caller but absent from the feature
    pub missing_scenario_in_feature: bool,
    /// Matcher that matches no step of the scenario
    pub missing_step_in_feature: bool,
}

impl ErrorOptions {
    /// Every diagnostic enabled
    #[inline]
    #[must_use]
    pub const fn all() -> Self {
        Self::uniform(true)
    }

    /// Every diagnostic disabled
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self::uniform(false)
    }

    const fn uniform(enabled: bool) -> Self {
        Self {
            missing_scenario_in_step_definitions: enabled,
            missing_step_in_step_definitions: enabled,
            missing_scenario_in_feature: enabled,
            missing_step_in_feature: enabled,
        }
    }
}

impl Default for ErrorOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl From<bool> for ErrorOptions {
    fn from(enabled: bool) -> Self {
        Self::uniform(enabled)
    }
}

/// Wire shape of `errors`: either a single switch or per-kind flags
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorsSetting {
    Toggle(bool),
    PerKind(PerKindErrors),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerKindErrors {
    #[serde(default = "enabled")]
    missing_scenario_in_step_definitions: bool,
    #[serde(default = "enabled")]
    missing_step_in_step_definitions: bool,
    #[serde(default = "enabled")]
    missing_scenario_in_feature: bool,
    #[serde(default = "enabled")]
    missing_step_in_feature: bool,
}

const fn enabled() -> bool {
    true
}

impl From<ErrorsSetting> for ErrorOptions {
    fn from(setting: ErrorsSetting) -> Self {
        match setting {
            ErrorsSetting::Toggle(enabled) => Self::uniform(enabled),
            ErrorsSetting::PerKind(flags) => Self {
                missing_scenario_in_step_definitions: flags.missing_scenario_in_step_definitions,
                missing_step_in_step_definitions: flags.missing_step_in_step_definitions,
                missing_scenario_in_feature: flags.missing_scenario_in_feature,
                missing_step_in_feature: flags.missing_step_in_feature,
            },
        }
    }
}

/// Options for one feature's binding session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Boolean tag expression selecting active scenarios
    pub tag_filter: Option<String>,
    /// Fold rules into the feature before binding
    pub collapse_rules: bool,
    /// Diagnostic switches
    pub errors: ErrorOptions,
    /// Custom test naming
    #[serde(skip)]
    pub scenario_name_template: Option<ScenarioNameTemplate>,
    /// Loader hint: resolve feature paths relative to the calling file
    pub load_relative_path: bool,
}

impl Options {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With tag filter
    #[inline]
    #[must_use]
    pub fn with_tag_filter(mut self, filter: impl Into<String>) -> Self {
        self.tag_filter = Some(filter.into());
        self
    }

    /// With rule collapsing switched on or off
    #[inline]
    #[must_use]
    pub fn with_collapse_rules(mut self, collapse: bool) -> Self {
        self.collapse_rules = collapse;
        self
    }

    /// With diagnostic switches (`true`, `false` or an [`ErrorOptions`])
    #[inline]
    #[must_use]
    pub fn with_errors(mut self, errors: impl Into<ErrorOptions>) -> Self {
        self.errors = errors.into();
        self
    }

    /// With a scenario name template
    #[inline]
    #[must_use]
    pub fn with_scenario_name_template<F>(mut self, template: F) -> Self
    where
        F: Fn(&ScenarioNameVars<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.scenario_name_template = Some(ScenarioNameTemplate::new(template));
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tag_filter: None,
            collapse_rules: true,
            errors: ErrorOptions::all(),
            scenario_name_template: None,
            load_relative_path: false,
        }
    }
}
