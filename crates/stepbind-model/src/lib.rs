//! stepbind Data Model
//!
//! The feature tree handed to the binding engine by a specification loader.
//!
//! # Core Concepts
//!
//! - [`Feature`]: Top-level unit owning scenarios, outlines, rules and [`Options`]
//! - [`Rule`]: Named grouping of scenarios beneath a feature
//! - [`Scenario`]: One concrete ordered sequence of [`Step`]s
//! - [`ScenarioOutline`]: Step template plus its materialized instances
//! - [`ScenarioContainer`]: Uniform read access to features and rules
//!
//! The tree is immutable once loaded. Binding state is kept by the engine in
//! a separate overlay, so these types carry no matcher or function fields.
//!
//! # Example
//!
//! ```rust
//! use stepbind_model::{Feature, Scenario, Step, StepKeyword};
//!
//! let feature = Feature::new("Vending machine").with_scenario(
//!     Scenario::new("Selecting a snack", 3)
//!         .with_step(Step::new(StepKeyword::Given, "the machine has \"Mars\" in stock", 4))
//!         .with_step(Step::new(StepKeyword::When, "I select \"Mars\"", 5)),
//! );
//!
//! assert_eq!(feature.scenarios[0].steps.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod group;
mod options;
mod scenario;
mod step;

// Re-exports
pub use group::{Feature, Rule, ScenarioContainer};
pub use options::{ErrorOptions, Options, ScenarioNameTemplate, ScenarioNameVars};
pub use scenario::{Scenario, ScenarioOutline};
pub use step::{Step, StepArgument, StepKeyword, TableRow};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
