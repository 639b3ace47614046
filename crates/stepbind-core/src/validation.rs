//! Completeness checks run when a scenario or group definition closes

use crate::codegen::{scenario_code, step_code};
use crate::error::{BindError, BindResult, MissingStep, Omission, OmissionKind};
use crate::resolver::{GroupSession, ScenarioSlot};
use stepbind_model::ErrorOptions;
use tracing::{debug, warn};

/// Fail if the scenario still has unbound steps
///
/// Skipped when `missing_step_in_step_definitions` is off; the unbound steps
/// then fail at run time instead.
pub(crate) fn check_scenario_steps(
    slot: &ScenarioSlot<'_>,
    title: &str,
    errors: &ErrorOptions,
) -> BindResult<()> {
    let missing: Vec<MissingStep> = slot
        .unbound_steps()
        .map(|(index, step)| MissingStep {
            index: index + 1,
            step_text: step.step_text.clone(),
            suggestion: step_code(step),
        })
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    if !errors.missing_step_in_step_definitions {
        warn!(scenario = title, unbound = missing.len(), "registering scenario with unbound steps");
        return Ok(());
    }
    Err(BindError::MissingStepDefinitions {
        scenario: title.to_string(),
        missing,
    })
}

/// Collect every active scenario, outline and rule that was never defined
///
/// An outline counts as active if the outline itself or any of its
/// instances passes the tag filter.
pub(crate) fn omissions(session: &GroupSession<'_>) -> Vec<Omission> {
    let scenarios = session
        .direct
        .iter()
        .filter(|slot| !slot.is_skipped() && !slot.defined)
        .map(|slot| Omission {
            kind: OmissionKind::Scenario,
            title: slot.scenario.title.clone(),
            suggestion: scenario_code(&slot.scenario.title, &slot.scenario.steps),
        });

    let outlines = session
        .outlines
        .iter()
        .filter(|entry| {
            !entry.defined
                && (!entry.skipped || entry.instances.iter().any(|s| !s.is_skipped()))
        })
        .map(|entry| Omission {
            kind: OmissionKind::Outline,
            title: entry.outline.title.clone(),
            suggestion: scenario_code(&entry.outline.title, &entry.outline.steps),
        });

    let rules = session
        .rules
        .iter()
        .filter(|entry| entry.active && !entry.defined)
        .map(|entry| Omission {
            kind: OmissionKind::Rule,
            title: entry.rule.title.clone(),
            suggestion: String::new(),
        });

    scenarios.chain(outlines).chain(rules).collect()
}

/// Fail with one aggregate error if anything active was left undefined
pub(crate) fn check_group(session: &GroupSession<'_>, errors: &ErrorOptions) -> BindResult<()> {
    raise(session, errors, omissions(session))
}

/// Like [`check_group`], but only rules count
///
/// Rule-based definitions cannot reach scenarios declared outside a rule.
pub(crate) fn check_rules(session: &GroupSession<'_>, errors: &ErrorOptions) -> BindResult<()> {
    let rules = omissions(session)
        .into_iter()
        .filter(|omission| omission.kind == OmissionKind::Rule)
        .collect();
    raise(session, errors, rules)
}

fn raise(
    session: &GroupSession<'_>,
    errors: &ErrorOptions,
    omissions: Vec<Omission>,
) -> BindResult<()> {
    if omissions.is_empty() {
        return Ok(());
    }
    if !errors.missing_scenario_in_step_definitions {
        debug!(
            group = session.title(),
            undefined = omissions.len(),
            "undefined scenarios ignored"
        );
        return Ok(());
    }
    Err(BindError::MissingScenarioDefinitions {
        group: session.title().to_string(),
        omissions,
    })
}
