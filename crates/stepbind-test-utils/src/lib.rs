//! Testing utilities for stepbind workspace
//!
//! A recording [`HostRunner`], a shared step journal and feature fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use stepbind_core::{BindResult, GroupBody, HostRunner, StepFailure, TestBody, TestMode};
use stepbind_model::{Feature, Scenario, ScenarioOutline, Step, StepKeyword};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    GroupOpened(String),
    GroupClosed(String),
    Test {
        name: String,
        mode: TestMode,
        timeout: Option<Duration>,
    },
    Disabled(String),
}

pub struct RecordedTest {
    pub path: Vec<String>,
    pub name: String,
    pub mode: TestMode,
    pub timeout: Option<Duration>,
    body: Option<TestBody>,
}

impl RecordedTest {
    pub fn has_run(&self) -> bool {
        self.body.is_none()
    }
}

/// Host runner that records every registration and runs bodies on demand
#[derive(Default)]
pub struct RecordingHost {
    path: Vec<String>,
    events: Vec<HostEvent>,
    tests: Vec<RecordedTest>,
    disabled: Vec<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn groups(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::GroupOpened(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tests(&self) -> &[RecordedTest] {
        &self.tests
    }

    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn test(&self, name: &str) -> &RecordedTest {
        self.tests
            .iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("no test named {name:?}; have {:?}", self.test_names()))
    }

    pub fn disabled(&self) -> &[String] {
        &self.disabled
    }

    /// Nothing was registered, not even a group
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Run the first not-yet-run test called `name`
    pub async fn run(&mut self, name: &str) -> Result<(), StepFailure> {
        let body = self
            .tests
            .iter_mut()
            .find(|t| t.name == name && t.body.is_some())
            .and_then(|t| t.body.take())
            .unwrap_or_else(|| panic!("no runnable test named {name:?}"));
        body().await
    }

    /// Run every recorded test in registration order
    pub async fn run_all(&mut self) -> Vec<(String, Result<(), StepFailure>)> {
        let mut results = Vec::new();
        for test in &mut self.tests {
            if let Some(body) = test.body.take() {
                results.push((test.name.clone(), body().await));
            }
        }
        results
    }
}

impl HostRunner for RecordingHost {
    fn group(&mut self, name: &str, body: GroupBody<'_>) -> BindResult<()> {
        self.events.push(HostEvent::GroupOpened(name.to_string()));
        self.path.push(name.to_string());
        let result = body(self);
        self.path.pop();
        self.events.push(HostEvent::GroupClosed(name.to_string()));
        result
    }

    fn test(&mut self, mode: TestMode, name: &str, body: TestBody, timeout: Option<Duration>) {
        self.events.push(HostEvent::Test {
            name: name.to_string(),
            mode,
            timeout,
        });
        self.tests.push(RecordedTest {
            path: self.path.clone(),
            name: name.to_string(),
            mode,
            timeout,
            body: Some(body),
        });
    }

    fn disabled_test(&mut self, name: &str) {
        self.events.push(HostEvent::Disabled(name.to_string()));
        self.disabled.push(name.to_string());
    }
}

/// Shared, thread-safe log that step functions append to
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Scenario whose steps sit on the lines right after its header
pub fn scenario(title: &str, line: u32, steps: &[(StepKeyword, &str)]) -> Scenario {
    steps
        .iter()
        .zip(line + 1..)
        .fold(Scenario::new(title, line), |scenario, ((keyword, text), step_line)| {
            scenario.with_step(Step::new(*keyword, *text, step_line))
        })
}

/// Outline with one instance per example row, `<column>` substituted
pub fn outline(
    title: &str,
    line: u32,
    template: &[(StepKeyword, &str)],
    header: &[&str],
    rows: &[&[&str]],
) -> ScenarioOutline {
    let mut outline = template
        .iter()
        .zip(line + 1..)
        .fold(ScenarioOutline::new(title, line), |outline, ((keyword, text), step_line)| {
            outline.with_step(Step::new(*keyword, *text, step_line))
        });

    for row in rows {
        let instance: Vec<(StepKeyword, String)> = template
            .iter()
            .map(|(keyword, text)| {
                let substituted = header
                    .iter()
                    .zip(row.iter())
                    .fold((*text).to_string(), |acc, (column, value)| {
                        acc.replace(&format!("<{column}>"), value)
                    });
                (*keyword, substituted)
            })
            .collect();
        let borrowed: Vec<(StepKeyword, &str)> =
            instance.iter().map(|(k, t)| (*k, t.as_str())).collect();
        outline = outline.with_instance(scenario(title, line, &borrowed));
    }
    outline
}

pub const SELECTING_A_SNACK: &str = "Selecting a snack";
pub const PAYING_FOR_SNACKS: &str = "Paying for snacks";

/// Feature with one plain scenario and one two-row outline
pub fn vending_machine_feature() -> Feature {
    Feature::new("Vending machine")
        .with_scenario(scenario(
            SELECTING_A_SNACK,
            3,
            &[
                (StepKeyword::Given, "the machine has \"Mars\" in stock"),
                (StepKeyword::When, "I insert 2 coins"),
                (StepKeyword::And, "I select \"Mars\""),
                (StepKeyword::Then, "I receive \"Mars\""),
            ],
        ))
        .with_outline(outline(
            PAYING_FOR_SNACKS,
            10,
            &[
                (StepKeyword::Given, "the price is <price> coins"),
                (StepKeyword::When, "I insert <coins> coins"),
                (StepKeyword::Then, "the machine returns <change> coins"),
            ],
            &["price", "coins", "change"],
            &[&["2", "3", "1"], &["5", "5", "0"]],
        ))
}
