//! Execution driver: runs a bound scenario's steps in order
//!
//! # Core Concepts
//!
//! - [`BoundScenario`]: owned snapshot of a scenario's steps and bindings,
//!   frozen at registration and shared with the test body
//! - [`run_scenario`]: awaits each step function in turn, stopping at the
//!   first failure
//! - [`probe_pending`]: polls each step function once with a probe context
//!   to detect an explicit pending mark before registration

use crate::context::{StepContext, StepFn};
use crate::error::StepFailure;
use crate::matcher::StepMatcher;
use crate::registry::StepBinding;
use futures::FutureExt;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use stepbind_model::{Step, StepArgument};
use tracing::{debug, trace};

/// One step of a bound scenario
#[derive(Debug, Clone)]
pub struct BoundStep {
    step_text: String,
    line_number: u32,
    argument: Option<StepArgument>,
    binding: Option<StepBinding>,
}

impl BoundStep {
    pub(crate) fn new(step: &Step, binding: Option<StepBinding>) -> Self {
        Self {
            step_text: step.step_text.clone(),
            line_number: step.line_number,
            argument: step.step_argument.clone(),
            binding,
        }
    }

    /// Step text
    #[inline]
    #[must_use]
    pub fn step_text(&self) -> &str {
        &self.step_text
    }

    /// Source line
    #[inline]
    #[must_use]
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    /// Attached table or doc string
    #[inline]
    #[must_use]
    pub fn argument(&self) -> Option<&StepArgument> {
        self.argument.as_ref()
    }

    /// Matcher bound to the step
    #[inline]
    #[must_use]
    pub fn matcher(&self) -> Option<&StepMatcher> {
        self.binding.as_ref().map(|b| &b.matcher)
    }

    /// Check if the step has a function
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    async fn run(&self, scenario: &str) -> Result<(), StepFailure> {
        let Some(binding) = &self.binding else {
            return Err(StepFailure::unbound(scenario, &self.step_text, self.line_number));
        };

        let args = binding.matcher.captures(&self.step_text).unwrap_or_default();
        let ctx = StepContext::new(args, self.argument.clone());
        trace!(scenario, step = %self.step_text, arity = ctx.arity(), "running step");

        match invoke(&binding.function, ctx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(StepFailure::from_error(
                scenario,
                &self.step_text,
                self.line_number,
                error,
            )),
            Err(panic) => Err(StepFailure::from_panic(
                scenario,
                &self.step_text,
                self.line_number,
                panic,
            )),
        }
    }
}

/// A scenario whose steps are fixed and ready to run
#[derive(Debug, Clone)]
pub struct BoundScenario {
    title: String,
    steps: Vec<BoundStep>,
}

impl BoundScenario {
    pub(crate) fn new(title: impl Into<String>, steps: Vec<BoundStep>) -> Self {
        Self {
            title: title.into(),
            steps,
        }
    }

    /// Scenario title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Steps in declaration order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[BoundStep] {
        &self.steps
    }
}

/// Run every step in order, stopping at the first failure
///
/// # Errors
/// Returns the first step failure, annotated with step text and line
pub async fn run_scenario(scenario: Arc<BoundScenario>) -> Result<(), StepFailure> {
    debug!(scenario = %scenario.title, steps = scenario.steps.len(), "running scenario");
    for step in &scenario.steps {
        step.run(&scenario.title).await?;
    }
    Ok(())
}

/// Check if any step marks itself pending when polled once
///
/// Each bound function is called with a probe context and its future polled
/// a single time. Errors and panics raised while probing are discarded; the
/// real run reports them.
#[must_use]
pub fn probe_pending(scenario: &BoundScenario) -> bool {
    scenario
        .steps
        .iter()
        .filter_map(|step| step.binding.as_ref())
        .any(|binding| {
            let ctx = StepContext::probe();
            let observer = ctx.clone();
            let _ = catch_unwind(AssertUnwindSafe(|| (binding.function)(ctx).now_or_never()));
            observer.is_pending()
        })
}

/// Call a step function, converting panics into their message
async fn invoke(function: &StepFn, ctx: StepContext) -> Result<anyhow::Result<()>, String> {
    let future = catch_unwind(AssertUnwindSafe(|| function(ctx))).map_err(panic_message)?;
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::step_fn;
    use futures::executor::block_on;
    use std::sync::Mutex;
    use stepbind_model::StepKeyword;

    fn step(text: &str, line: u32, function: Option<StepFn>) -> BoundStep {
        let step = Step::new(StepKeyword::Given, text, line);
        let binding = function.map(|f| StepBinding::new(StepMatcher::for_step_text(text).unwrap(), f));
        BoundStep::new(&step, binding)
    }

    #[test]
    fn runs_steps_in_order_with_captured_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = |seen: Arc<Mutex<Vec<String>>>| {
            step_fn(move |ctx: StepContext| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(ctx.args().join(","));
                    Ok(())
                }
            })
        };
        let scenario = BoundScenario::new(
            "Buying",
            vec![
                step("I have 5 coins", 3, Some(record(Arc::clone(&seen)))),
                step("I select \"Mars\"", 4, Some(record(Arc::clone(&seen)))),
            ],
        );

        block_on(run_scenario(Arc::new(scenario))).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["5", "Mars"]);
    }

    #[test]
    fn failure_stops_the_scenario_and_is_annotated() {
        let reached = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&reached);
        let scenario = BoundScenario::new(
            "Buying",
            vec![
                step(
                    "the machine is broken",
                    7,
                    Some(step_fn(|_| async { anyhow::bail!("out of order") })),
                ),
                step(
                    "I get a snack",
                    8,
                    Some(step_fn(move |_| {
                        let flag = Arc::clone(&flag);
                        async move {
                            *flag.lock().unwrap() = true;
                            Ok(())
                        }
                    })),
                ),
            ],
        );

        let failure = block_on(run_scenario(Arc::new(scenario))).unwrap_err();
        assert_eq!(failure.to_string(), "the machine is broken (line 7)\n\nout of order");
        assert!(!*reached.lock().unwrap());
    }

    #[test]
    fn panics_become_failures() {
        let scenario = BoundScenario::new(
            "Buying",
            vec![step("it explodes", 2, Some(step_fn(|_| async { panic!("kaboom") })))],
        );
        let failure = block_on(run_scenario(Arc::new(scenario))).unwrap_err();
        assert!(failure.is_panic());
        assert!(failure.message.contains("kaboom"));
    }

    #[test]
    fn unbound_step_fails_at_run_time() {
        let scenario = BoundScenario::new("Buying", vec![step("nothing here", 4, None)]);
        let failure = block_on(run_scenario(Arc::new(scenario))).unwrap_err();
        assert!(failure.to_string().starts_with("nothing here (line 4)"));
    }

    #[test]
    fn probe_detects_pending_before_first_await() {
        let pending = BoundScenario::new(
            "Later",
            vec![
                step("ready", 2, Some(step_fn(|_| async { Ok(()) }))),
                step(
                    "not yet",
                    3,
                    Some(step_fn(|ctx: StepContext| async move {
                        ctx.pending();
                        Ok(())
                    })),
                ),
            ],
        );
        assert!(probe_pending(&pending));

        let failing = BoundScenario::new(
            "Now",
            vec![step("boom", 2, Some(step_fn(|_| async { anyhow::bail!("ignored in probe") })))],
        );
        assert!(!probe_pending(&failing));
    }
}
