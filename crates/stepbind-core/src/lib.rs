//! stepbind Core
//!
//! Binding and matching engine: connects the scenarios of a parsed feature to
//! step implementations, validates the correspondence and registers
//! runnable tests with a host test harness.
//!
//! # Core Concepts
//!
//! Two phases:
//! 1. **Binding phase**: [`define_feature`] resolves tag filters, looks up
//!    scenarios by title and binds step functions in declaration order.
//!    Violations surface immediately as [`BindError`]s.
//! 2. **Execution phase**: each defined scenario is frozen into a
//!    [`BoundScenario`] and registered with the [`HostRunner`]; running the
//!    test awaits each step in turn and reports a [`StepFailure`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use stepbind_core::prelude::*;
//!
//! define_feature(&mut host, &feature, |scenarios| {
//!     scenarios.test("Selecting a snack", |steps| {
//!         steps.given(r#"the machine has "Mars" in stock"#, |_| async { Ok(()) })?;
//!         steps.when(StepMatcher::pattern(r#"^I select "(.*)"$"#)?, |ctx| async move {
//!             let snack = ctx.arg(0)?;
//!             anyhow::ensure!(!snack.is_empty());
//!             Ok(())
//!         })?;
//!         Ok(())
//!     })
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod codegen;
pub mod context;
pub mod definer;
pub mod driver;
pub mod error;
pub mod host;
pub mod matcher;
mod registry;
mod resolver;
pub mod state;
mod validation;

// Re-exports
pub use context::{step_fn, StepContext, StepFn, StepFuture, StepResult};
pub use definer::{
    define_feature, define_feature_with_cache, define_rule_based_feature,
    define_rule_based_feature_with_cache, RuleDefiner, ScenarioDefiner, StepDefiner,
};
pub use driver::{probe_pending, run_scenario, BoundScenario, BoundStep};
pub use error::{BindError, BindResult, MatcherError, MissingStep, Omission, OmissionKind, StepFailure};
pub use host::{GroupBody, HostRunner, TestBody, TestMode};
pub use matcher::StepMatcher;
pub use resolver::GroupRef;
pub use state::ScenarioState;

/// Everything a step definition file usually needs
pub mod prelude {
    pub use crate::context::{StepContext, StepResult};
    pub use crate::definer::{
        define_feature, define_rule_based_feature, RuleDefiner, ScenarioDefiner, StepDefiner,
    };
    pub use crate::error::{BindError, BindResult, StepFailure};
    pub use crate::host::{HostRunner, TestMode};
    pub use crate::matcher::StepMatcher;
    pub use stepbind_model::{Feature, Options, Rule, Scenario, ScenarioOutline, Step, StepKeyword};
    pub use stepbind_tags::TagFilterCache;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
