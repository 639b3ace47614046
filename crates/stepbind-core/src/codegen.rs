//! Stub generation for unbound steps and undefined scenarios
//!
//! Stubs are Rust snippets written against the definer API, ready to paste
//! into a feature's definition callback.

use crate::matcher::{has_placeholders, pattern_for_step_text, placeholder_names};
use stepbind_model::{ScenarioContainer, Step, StepArgument};

const INDENT: &str = "    ";

/// Stub binding one step
#[must_use]
pub fn step_code(step: &Step) -> String {
    let mut body: Vec<String> = placeholder_names(&step.step_text)
        .into_iter()
        .enumerate()
        .map(|(index, name)| format!("let {name} = ctx.arg({index})?;"))
        .collect();
    match &step.step_argument {
        Some(StepArgument::Table(_)) => body.push("let table = ctx.table()?;".to_string()),
        Some(StepArgument::DocString(_)) => {
            body.push("let doc_string = ctx.doc_string()?;".to_string());
        }
        None => {}
    }
    body.push("Ok(())".to_string());

    let closure_arg = if body.len() > 1 { "ctx" } else { "_ctx" };
    format!(
        "steps.{}({}, |{closure_arg}| async move {{\n{}\n}})?;",
        step.keyword,
        matcher_code(&step.step_text),
        indent(&body.join("\n"), 1)
    )
}

/// Stub defining a whole scenario or outline
#[must_use]
pub fn scenario_code(title: &str, steps: &[Step]) -> String {
    let mut body: Vec<String> = steps.iter().map(step_code).collect();
    body.push("Ok(())".to_string());
    format!(
        "scenarios.test({title:?}, |steps| {{\n{}\n}})?;",
        indent(&body.join("\n\n"), 1)
    )
}

/// Stub for whatever is declared on `line` of the feature file
///
/// Scenario and outline header lines yield a scenario stub; step lines yield
/// a step stub. Returns `None` for any other line.
#[must_use]
pub fn code_for_line(group: &dyn ScenarioContainer, line: u32) -> Option<String> {
    for outline in group.scenario_outlines() {
        if outline.line_number == line {
            return Some(scenario_code(&outline.title, &outline.steps));
        }
        if let Some(step) = outline.steps.iter().find(|s| s.line_number == line) {
            return Some(step_code(step));
        }
    }
    for scenario in group.scenarios() {
        if scenario.line_number == line {
            return Some(scenario_code(&scenario.title, &scenario.steps));
        }
        if let Some(step) = scenario.steps.iter().find(|s| s.line_number == line) {
            return Some(step_code(step));
        }
    }
    group
        .rules()
        .iter()
        .find_map(|rule| code_for_line(rule, line))
}

fn matcher_code(step_text: &str) -> String {
    if has_placeholders(step_text) {
        format!(
            "StepMatcher::pattern({})?",
            raw_string(&pattern_for_step_text(step_text))
        )
    } else {
        format!("{step_text:?}")
    }
}

/// Raw string literal with enough `#`s to hold `text`
fn raw_string(text: &str) -> String {
    let mut hashes = 1;
    while text.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
}

fn indent(text: &str, levels: usize) -> String {
    let prefix = INDENT.repeat(levels);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
