//! Error types for the binding engine
//!
//! Two families:
//! - [`BindError`]: raised synchronously while a feature is being defined.
//!   Configuration problems, binding-contract violations and completeness
//!   omissions all land here.
//! - [`StepFailure`]: produced when a registered test runs and one of its
//!   steps returns an error, panics or has no bound function.

use crate::state::ScenarioState;
use stepbind_tags::TagFilterError;
use std::fmt;

/// Result alias used by every definition-time operation
pub type BindResult<T> = Result<T, BindError>;

/// Definition-time error
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// Tag filter expression could not be compiled
    #[error(transparent)]
    TagFilter(#[from] TagFilterError),

    /// User supplied an invalid regular expression as a step matcher
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    /// Scenario name template failed
    #[error("An error occurred while executing a scenario name template for \"{scenario}\": {message}")]
    NameTemplate {
        /// Title passed to the scenario definer
        scenario: String,
        /// Rendered template error
        message: String,
    },

    /// No scenario or outline carries the requested title
    #[error("No scenarios found in feature/rule that match scenario title \"{title}.\"")]
    ScenarioNotFound {
        /// Requested title
        title: String,
    },

    /// More than one scenario or outline carries the requested title
    #[error("More than one scenario found in feature/rule that match scenario title \"{title}\"")]
    AmbiguousScenarioTitle {
        /// Requested title
        title: String,
    },

    /// The scenario was already defined in this session
    #[error("Scenario \"{title}\" has already been defined")]
    ScenarioAlreadyDefined {
        /// Requested title
        title: String,
    },

    /// No rule carries the requested title
    #[error("No matching rule found for '{title}'")]
    RuleNotFound {
        /// Requested title
        title: String,
    },

    /// The rule was already defined in this session
    #[error("Rule \"{title}\" has already been defined")]
    RuleAlreadyDefined {
        /// Requested title
        title: String,
    },

    /// Binding call arrived after every step was already bound
    #[error("Step definition \"{matcher}\" found for scenario \"{scenario}\" but all steps already defined.")]
    AllStepsDefined {
        /// Scenario title
        scenario: String,
        /// Matcher rendered for humans
        matcher: String,
    },

    /// No step of the scenario matches the binding's matcher
    #[error("Scenario \"{scenario}\" in feature file has no step matching \"{matcher}\"")]
    NoMatchingStep {
        /// Scenario title
        scenario: String,
        /// Matcher rendered for humans
        matcher: String,
    },

    /// The matcher is ambiguous within the scenario
    #[error("More than one step in scenario \"{scenario}\" matches \"{matcher}\"")]
    AmbiguousMatcher {
        /// Scenario title
        scenario: String,
        /// Matcher rendered for humans
        matcher: String,
    },

    /// The matcher targets a step other than the next unbound one
    #[error("Expected step #{index} of scenario \"{scenario}\" to match \"{step_text}\". Try adding the following code:\n\n{suggestion}")]
    OutOfOrder {
        /// Scenario title
        scenario: String,
        /// 1-based index of the step that should have been bound next
        index: usize,
        /// Text of that step
        step_text: String,
        /// Stub for the step that should have been bound
        suggestion: String,
    },

    /// The matched step already has a binding
    #[error("Step \"{step_text}\" in scenario \"{scenario}\" matches \"{matcher}\" but also matches \"{existing}\"")]
    StepAlreadyBound {
        /// Scenario title
        scenario: String,
        /// Step text
        step_text: String,
        /// New matcher
        matcher: String,
        /// Matcher already bound to the step
        existing: String,
    },

    /// Scenario definition finished with unbound steps
    #[error("{}", render_missing_steps(.scenario, .missing))]
    MissingStepDefinitions {
        /// Scenario title
        scenario: String,
        /// Every unbound step
        missing: Vec<MissingStep>,
    },

    /// Group definition finished with undefined scenarios, outlines or rules
    #[error("{}", render_omissions(.omissions))]
    MissingScenarioDefinitions {
        /// Feature or rule title
        group: String,
        /// Every omission, in declaration order
        omissions: Vec<Omission>,
    },

    /// Internal lifecycle violation
    #[error("illegal scenario state transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current state
        from: ScenarioState,
        /// Requested state
        to: ScenarioState,
    },
}

impl BindError {
    /// Configuration errors: bad tag filters, matchers or name templates
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::TagFilter(_) | Self::Matcher(_) | Self::NameTemplate { .. }
        )
    }

    /// Binding-contract errors raised by a single resolve or bind call
    #[inline]
    #[must_use]
    pub fn is_binding_contract(&self) -> bool {
        matches!(
            self,
            Self::ScenarioNotFound { .. }
                | Self::AmbiguousScenarioTitle { .. }
                | Self::ScenarioAlreadyDefined { .. }
                | Self::RuleNotFound { .. }
                | Self::RuleAlreadyDefined { .. }
                | Self::AllStepsDefined { .. }
                | Self::NoMatchingStep { .. }
                | Self::AmbiguousMatcher { .. }
                | Self::OutOfOrder { .. }
                | Self::StepAlreadyBound { .. }
        )
    }

    /// Completeness errors raised when a scenario or group closes
    #[inline]
    #[must_use]
    pub fn is_completeness(&self) -> bool {
        matches!(
            self,
            Self::MissingStepDefinitions { .. } | Self::MissingScenarioDefinitions { .. }
        )
    }

    /// Create name template error
    pub fn name_template(scenario: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::NameTemplate {
            scenario: scenario.into(),
            message: format!("{error:#}"),
        }
    }
}

/// Invalid step matcher
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// Regular expression failed to compile
    #[error("invalid step pattern /{pattern}/: {source}")]
    InvalidPattern {
        /// Pattern source
        pattern: String,
        /// Compile error
        #[source]
        source: regex::Error,
    },
}

/// An unbound step reported at scenario close
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingStep {
    /// 1-based position in the scenario
    pub index: usize,
    /// Step text
    pub step_text: String,
    /// Stub binding the step
    pub suggestion: String,
}

/// Kind of declaration left undefined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OmissionKind {
    /// Plain scenario
    Scenario,
    /// Scenario outline
    Outline,
    /// Rule of a feature
    Rule,
}

/// A declaration with no definition when its group closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Omission {
    /// What was left undefined
    pub kind: OmissionKind,
    /// Title as written in the feature
    pub title: String,
    /// Stub defining it, empty for rules
    pub suggestion: String,
}

impl fmt::Display for Omission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OmissionKind::Scenario | OmissionKind::Outline => write!(
                f,
                "Scenario \"{}\" found in feature file but no step definitions were provided. Try adding the following code:\n\n{}",
                self.title, self.suggestion
            ),
            OmissionKind::Rule => write!(
                f,
                "Rule \"{}\" found in feature file but no rule definition was provided",
                self.title
            ),
        }
    }
}

fn render_omissions(omissions: &[Omission]) -> String {
    omissions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_missing_steps(scenario: &str, missing: &[MissingStep]) -> String {
    let mut out = format!(
        "Scenario \"{scenario}\" has {} step(s) without a step definition.",
        missing.len()
    );
    for step in missing {
        out.push_str(&format!(
            "\n\nStep #{} \"{}\" is unbound. Try adding the following code:\n\n{}",
            step.index, step.step_text, step.suggestion
        ));
    }
    out
}

/// A step failed while its scenario was running
///
/// The message is annotated with the step text and source line so host
/// reporters can point at the feature file.
#[derive(Debug, thiserror::Error)]
#[error("{step_text} (line {line_number})\n\n{message}")]
pub struct StepFailure {
    /// Scenario the step belongs to
    pub scenario: String,
    /// Step text as written in the feature
    pub step_text: String,
    /// Source line of the step
    pub line_number: u32,
    /// Original error or panic message
    pub message: String,
    cause: Option<anyhow::Error>,
}

impl StepFailure {
    /// Failure from an error returned by a step function
    #[must_use]
    pub fn from_error(
        scenario: impl Into<String>,
        step_text: impl Into<String>,
        line_number: u32,
        error: anyhow::Error,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            step_text: step_text.into(),
            line_number,
            message: format!("{error:#}"),
            cause: Some(error),
        }
    }

    /// Failure from a step function that panicked
    #[must_use]
    pub fn from_panic(
        scenario: impl Into<String>,
        step_text: impl Into<String>,
        line_number: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            step_text: step_text.into(),
            line_number,
            message: format!("step panicked: {}", message.into()),
            cause: None,
        }
    }

    /// Failure for a step that reached execution without a binding
    #[must_use]
    pub fn unbound(scenario: impl Into<String>, step_text: impl Into<String>, line_number: u32) -> Self {
        Self {
            scenario: scenario.into(),
            step_text: step_text.into(),
            line_number,
            message: "no step definition is bound to this step".to_string(),
            cause: None,
        }
    }

    /// Error returned by the step function, if any
    #[inline]
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    /// Whether the failure came from a panic
    #[inline]
    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.message.starts_with("step panicked: ")
    }
}
