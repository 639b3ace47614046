//! Binding registry: attaches matcher/function pairs to scenario steps
//!
//! Each bind call is checked against the scenario in this order:
//!
//! 1. some step is still unbound
//! 2. exactly one step matches the matcher
//! 3. the matched step is the first unbound step
//! 4. the matched step has no binding yet
//!
//! Steps are therefore bound strictly in declaration order, and a binding
//! once attached is never replaced.

use crate::codegen;
use crate::context::StepFn;
use crate::error::{BindError, BindResult};
use crate::matcher::StepMatcher;
use crate::resolver::ScenarioSlot;
use crate::state::ScenarioState;
use std::fmt;
use stepbind_model::ErrorOptions;
use tracing::{trace, warn};

/// Matcher and function attached to one step
#[derive(Clone)]
pub(crate) struct StepBinding {
    pub(crate) matcher: StepMatcher,
    pub(crate) function: StepFn,
}

impl StepBinding {
    pub(crate) fn new(matcher: StepMatcher, function: StepFn) -> Self {
        Self { matcher, function }
    }
}

impl fmt::Debug for StepBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepBinding")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// What a bind call did to one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindOutcome {
    /// Step at this 0-based position is now bound
    Bound(usize),
    /// No step matched and the diagnostic is switched off
    Ignored,
}

/// Attach `binding` to the next step of `slot`
///
/// Title used in diagnostics is the scenario's own title.
pub(crate) fn bind_step(
    slot: &mut ScenarioSlot<'_>,
    binding: &StepBinding,
    errors: &ErrorOptions,
) -> BindResult<BindOutcome> {
    let scenario = slot.scenario;
    let matcher = &binding.matcher;

    let Some(next) = slot.bindings.iter().position(Option::is_none) else {
        return Err(BindError::AllStepsDefined {
            scenario: scenario.title.clone(),
            matcher: matcher.to_string(),
        });
    };

    let mut matching = scenario
        .steps
        .iter()
        .enumerate()
        .filter(|(_, step)| matcher.is_match(&step.step_text))
        .map(|(index, _)| index);

    let Some(index) = matching.next() else {
        if errors.missing_step_in_feature {
            return Err(BindError::NoMatchingStep {
                scenario: scenario.title.clone(),
                matcher: matcher.to_string(),
            });
        }
        warn!(
            scenario = %scenario.title,
            matcher = %matcher,
            "no step matches binding, ignoring"
        );
        return Ok(BindOutcome::Ignored);
    };

    if matching.next().is_some() {
        return Err(BindError::AmbiguousMatcher {
            scenario: scenario.title.clone(),
            matcher: matcher.to_string(),
        });
    }

    if index != next {
        let expected = &scenario.steps[next];
        return Err(BindError::OutOfOrder {
            scenario: scenario.title.clone(),
            index: next + 1,
            step_text: expected.step_text.clone(),
            suggestion: codegen::step_code(expected),
        });
    }

    // Unreachable while `next` is the first unbound step: a bound match
    // always fails the order check above first.
    if let Some(existing) = &slot.bindings[index] {
        return Err(BindError::StepAlreadyBound {
            scenario: scenario.title.clone(),
            step_text: scenario.steps[index].step_text.clone(),
            matcher: matcher.to_string(),
            existing: existing.matcher.to_string(),
        });
    }

    if slot.state == ScenarioState::Active {
        slot.advance(ScenarioState::Binding)?;
    }
    slot.bindings[index] = Some(binding.clone());
    slot.defined = true;
    trace!(scenario = %scenario.title, step = index + 1, matcher = %matcher, "bound step");
    Ok(BindOutcome::Bound(index))
}
