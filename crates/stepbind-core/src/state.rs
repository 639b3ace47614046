//! Per-scenario binding lifecycle
//!
//! ```text
//! Unbound -> Active | Skipped
//! Active  -> Binding
//! Binding -> Bound
//! Bound   -> Registered | DisabledRegistered
//! ```
//!
//! `Skipped`, `Registered` and `DisabledRegistered` are terminal.

use crate::error::BindError;

/// Lifecycle state of one concrete scenario in a definition session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioState {
    /// Not yet evaluated against the tag filter
    Unbound,
    /// Passed the tag filter, awaiting definition
    Active,
    /// Excluded by the tag filter
    Skipped,
    /// Definition callback is binding steps
    Binding,
    /// Definition callback returned and every step is bound
    Bound,
    /// Handed to the host as a runnable test
    Registered,
    /// Handed to the host as a disabled test
    DisabledRegistered,
}

impl ScenarioState {
    /// States reachable in one step from `self`
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [ScenarioState] {
        use ScenarioState::{Active, Binding, Bound, DisabledRegistered, Registered, Skipped, Unbound};
        match self {
            Unbound => &[Active, Skipped],
            Active => &[Binding],
            Binding => &[Bound],
            Bound => &[Registered, DisabledRegistered],
            Skipped | Registered | DisabledRegistered => &[],
        }
    }

    /// Check if `self -> to` is legal
    #[inline]
    #[must_use]
    pub fn can_transition_to(self, to: ScenarioState) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Check if the scenario was handed to the host
    #[inline]
    #[must_use]
    pub fn is_registered(self) -> bool {
        matches!(self, Self::Registered | Self::DisabledRegistered)
    }
}

/// Validate a transition
///
/// # Errors
/// Returns [`BindError::InvalidTransition`] for an illegal move
pub fn validate_transition(from: ScenarioState, to: ScenarioState) -> Result<(), BindError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(BindError::InvalidTransition { from, to })
    }
}
